//! Command handlers. The UI calls these in response to user actions; they
//! coordinate the weather client, notification sink, scheduler and state.

use crate::{
    config::Config,
    error::CommandError,
    notify::NotificationSink,
    scheduler::NotificationScheduler,
    state::{AppState, Theme},
    weather::{WeatherClient, WeatherReading},
};
use log::{info, warn};
use std::sync::Arc;

/// Status line shown to the user after an action
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

pub struct App {
    state: Arc<AppState>,
    client: Arc<dyn WeatherClient>,
    sink: Arc<dyn NotificationSink>,
    scheduler: NotificationScheduler,
}

impl App {
    /// City used to check that the API key works
    pub const SAMPLE_CITY: &'static str = "London";

    /// Build the app and, if notifications start out enabled, start the
    /// notification loop
    pub fn new(
        config: &Config,
        client: Arc<dyn WeatherClient>,
        sink: Arc<dyn NotificationSink>,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(AppState::new(
            config.notifications_enabled,
            config.theme,
        ));
        let scheduler = NotificationScheduler::new(
            Arc::clone(&state),
            Arc::clone(&client),
            Arc::clone(&sink),
            config.notification_interval(),
            config.poll_interval(),
        );
        if state.notifications_enabled() {
            scheduler.start()?;
        }
        Ok(Self {
            state,
            client,
            sink,
            scheduler,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    /// Look up the weather for a city and make it the current city. If
    /// notifications are on, the reading is also sent as a notification
    /// right away. On failure the current city is left alone.
    pub fn select_city(
        &self,
        city: &str,
    ) -> Result<(WeatherReading, Status), CommandError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(CommandError::EmptyCity);
        }

        let reading = self.client.fetch(city)?;
        info!("Selected city {city:?} ({})", reading.city);
        self.state.set_current_city(city);

        let status = if self.state.notifications_enabled() {
            self.sink.notify_reading(&reading);
            Status::new(
                StatusKind::Success,
                format!("Hourly notifications enabled for {}", reading.city),
            )
        } else {
            Status::new(
                StatusKind::Info,
                format!(
                    "Notifications are disabled. Showing data for {}",
                    reading.city
                ),
            )
        };
        Ok((reading, status))
    }

    /// Turn hourly notifications on or off, starting or stopping the loop to
    /// match
    pub fn set_notifications_enabled(
        &self,
        enabled: bool,
    ) -> anyhow::Result<Status> {
        self.state.set_notifications_enabled(enabled);
        if enabled {
            self.scheduler.start()?;
            Ok(Status::new(
                StatusKind::Success,
                "Hourly notifications enabled",
            ))
        } else {
            self.scheduler.stop();
            Ok(Status::new(
                StatusKind::Warning,
                "Hourly notifications disabled",
            ))
        }
    }

    pub fn set_theme(&self, theme: Theme) {
        info!("Switching to {theme:?} theme");
        self.state.set_theme(theme);
    }

    /// Check the API key by fetching a known city. Returns the message to
    /// show in a dialog, plus the status line.
    pub fn test_api(&self) -> (Result<String, CommandError>, Status) {
        match self.client.fetch(Self::SAMPLE_CITY) {
            Ok(reading) => (
                Ok(format!(
                    "API key works. Sample city: {}\nTemperature: {}°C",
                    reading.city, reading.temperature
                )),
                Status::new(StatusKind::Success, "API test succeeded"),
            ),
            Err(err) => {
                warn!("API test failed: {err}");
                (
                    Err(err.into()),
                    Status::new(StatusKind::Error, "API test failed"),
                )
            }
        }
    }

    /// Stop the notification loop and wait for it to exit
    pub fn shutdown(&self) {
        info!("Shutting down");
        self.scheduler.shutdown();
    }
}
