//! Test doubles for the capability traits

use crate::{
    error::WeatherError,
    notify::NotificationSink,
    weather::{WeatherClient, WeatherReading},
};
use chrono::Utc;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    thread,
    time::{Duration, Instant},
};

/// Canned reading, matching a typical London response
pub fn reading(city: &str) -> WeatherReading {
    WeatherReading {
        city: city.into(),
        country: "GB".into(),
        temperature: 15.2,
        humidity: 70,
        wind_speed: 3.1,
        condition: "Clear Sky".into(),
        fetched_at: Utc::now(),
    }
}

/// Weather client that records every city it's asked about
#[derive(Debug, Default)]
pub struct MockWeatherClient {
    fetches: Mutex<Vec<String>>,
    failing: AtomicBool,
    delay: Duration,
}

impl MockWeatherClient {
    /// Client whose fetches take a while, to simulate a slow network
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Make every subsequent fetch fail
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

impl WeatherClient for MockWeatherClient {
    fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        self.fetches.lock().unwrap().push(city.into());
        thread::sleep(self.delay);
        if self.failing.load(Ordering::SeqCst) {
            Err(WeatherError::RateLimited)
        } else {
            Ok(reading(city))
        }
    }
}

/// Sink that keeps everything it's handed
#[derive(Debug, Default)]
pub struct MockSink {
    notifications: Mutex<Vec<(String, String)>>,
}

impl MockSink {
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl NotificationSink for MockSink {
    fn notify(&self, title: &str, body: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((title.into(), body.into()));
    }
}

/// Poll until the condition holds or the timeout expires. Return whether the
/// condition was met.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
