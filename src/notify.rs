use crate::weather::WeatherReading;
use log::{debug, error};
use notify_rust::{Notification, Timeout};

/// Somewhere to send desktop notifications. Delivery is best effort: a
/// notification that can't be shown is logged and dropped.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);

    /// Notify with the standard summary of a weather reading
    fn notify_reading(&self, reading: &WeatherReading) {
        self.notify(&reading.notification_title(), &reading.notification_body());
    }
}

/// Native desktop notifications (D-Bus, Notification Center, or toast,
/// depending on the platform)
#[derive(Debug)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    /// How long the popup stays on screen
    const TIMEOUT_MS: u32 = 10_000;

    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        debug!("Showing notification {title:?}");
        let result = Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .timeout(Timeout::Milliseconds(Self::TIMEOUT_MS))
            .show();
        if let Err(err) = result {
            error!("Error showing notification {title:?}: {err}");
        }
    }
}
