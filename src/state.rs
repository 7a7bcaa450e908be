//! Runtime state shared between the foreground command handlers and the
//! notification loop

use crate::util::Color;
use serde::Deserialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    PoisonError, RwLock,
};

/// User-controlled app state. There's exactly one of these per process, shared
/// via `Arc`. Only the foreground writes to it; the notification loop reads.
#[derive(Debug)]
pub struct AppState {
    /// The city as the user typed it, set after a successful fetch
    current_city: RwLock<Option<String>>,
    notifications_enabled: AtomicBool,
    theme: RwLock<Theme>,
}

impl AppState {
    pub fn new(notifications_enabled: bool, theme: Theme) -> Self {
        Self {
            current_city: RwLock::new(None),
            notifications_enabled: AtomicBool::new(notifications_enabled),
            theme: RwLock::new(theme),
        }
    }

    pub fn current_city(&self) -> Option<String> {
        // None of the writers can panic mid-write, so a poisoned lock still
        // holds a valid value
        self.current_city
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_current_city(&self, city: impl Into<String>) {
        *self
            .current_city
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(city.into());
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled.load(Ordering::Acquire)
    }

    pub fn set_notifications_enabled(&self, enabled: bool) {
        self.notifications_enabled.store(enabled, Ordering::Release);
    }

    pub fn theme(&self) -> Theme {
        *self.theme.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_theme(&self, theme: Theme) {
        *self.theme.write().unwrap_or_else(PoisonError::into_inner) = theme;
    }

    /// City that the notification loop should report on, if any. `None`
    /// unless notifications are enabled *and* a city has been chosen.
    pub fn notification_city(&self) -> Option<String> {
        if self.notifications_enabled() {
            self.current_city()
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                foreground: Color::hex(0x222222),
                muted: Color::hex(0x505050),
                accent: Color::hex(0x1976D2),
                success: Color::hex(0x2E7D32),
                warning: Color::hex(0xB26A00),
                error: Color::hex(0xC62828),
            },
            Self::Dark => Palette {
                foreground: Color::hex(0xE6E6E6),
                muted: Color::hex(0xC0C0C0),
                accent: Color::hex(0x4FC3F7),
                success: Color::hex(0x66BB6A),
                warning: Color::hex(0xFFCA28),
                error: Color::hex(0xEF5350),
            },
        }
    }
}

/// Text colors for a theme
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Palette {
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}
