use crate::state::Theme;
use anyhow::{bail, Context};
use log::{info, warn};
use serde::Deserialize;
use std::{env, fs::File, io, path::PathBuf, time::Duration};

/// App configuration, loaded from a JSON file. Every field is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap API key. Can be overridden by `OPENWEATHER_API_KEY`
    pub api_key: String,
    pub base_url: String,
    pub notification_interval_secs: u64,
    /// How often the notification loop checks for a stop request while it's
    /// sleeping
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    /// Shown as the sender of desktop notifications
    pub app_name: String,
    /// Initial state of hourly notifications
    pub notifications_enabled: bool,
    pub theme: Theme,
}

impl Config {
    const PATH: &'static str = "./config.json";
    const PATH_VARIABLE: &'static str = "WEATHER_NOTIFIER_CONFIG";
    const API_KEY_VARIABLE: &'static str = "OPENWEATHER_API_KEY";

    /// Load config from the file. A missing file isn't an error, we just use
    /// the defaults. Anything else wrong with the file is.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var_os(Self::PATH_VARIABLE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::PATH));
        info!("Loading config from `{}`", path.display());

        let mut config: Self = match File::open(&path) {
            Ok(file) => serde_json::from_reader(file).with_context(|| {
                format!("Error parsing config file {}", path.display())
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Config file `{}` not found, using defaults",
                    path.display()
                );
                Self::default()
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Error opening config file {}", path.display())
                })
            }
        };

        if let Ok(api_key) = env::var(Self::API_KEY_VARIABLE) {
            info!("Using API key from ${}", Self::API_KEY_VARIABLE);
            config.api_key = api_key;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the notification loop spin
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.notification_interval_secs == 0 {
            bail!("`notification_interval_secs` must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            bail!("`poll_interval_ms` must be at least 1");
        }
        Ok(())
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_secs(self.notification_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org/data/2.5/weather".into(),
            notification_interval_secs: 3600,
            poll_interval_ms: 1000,
            request_timeout_secs: 10,
            app_name: "Weather Notifier".into(),
            notifications_enabled: true,
            theme: Theme::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_partial_config() {
        let config: Config = serde_json::from_str(
            r#"{"api_key": "abc123", "notification_interval_secs": 60, "theme": "dark"}"#,
        )
        .unwrap();
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.notification_interval(), Duration::from_secs(60));
        assert_eq!(config.theme, Theme::Dark);
        // Everything else falls back to defaults
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.notifications_enabled);
    }

    /// Everything that touches env vars is in one test, since they're shared
    /// across the whole test process
    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        env::remove_var(Config::API_KEY_VARIABLE);

        // Missing file means defaults
        env::set_var(Config::PATH_VARIABLE, dir.path().join("missing.json"));
        let config = Config::load().unwrap();
        assert_eq!(config.api_key, "");
        assert_eq!(config.notification_interval(), Duration::from_secs(3600));

        // Path comes from the env
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"api_key": "filekey", "notification_interval_secs": 120}"#,
        )
        .unwrap();
        env::set_var(Config::PATH_VARIABLE, &path);
        let config = Config::load().unwrap();
        assert_eq!(config.api_key, "filekey");
        assert_eq!(config.notification_interval(), Duration::from_secs(120));

        // Key in the env beats the file
        env::set_var(Config::API_KEY_VARIABLE, "envkey");
        let config = Config::load().unwrap();
        assert_eq!(config.api_key, "envkey");
        assert_eq!(config.notification_interval(), Duration::from_secs(120));
        env::remove_var(Config::API_KEY_VARIABLE);

        // Malformed file
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load().is_err());

        // Zero interval would make the loop spin
        fs::write(&path, r#"{"notification_interval_secs": 0}"#).unwrap();
        assert!(Config::load().is_err());

        env::remove_var(Config::PATH_VARIABLE);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        let config = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_theme_rejected() {
        let result = serde_json::from_str::<Config>(r#"{"theme": "sepia"}"#);
        assert!(result.is_err());
    }
}
