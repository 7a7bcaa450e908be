use crate::{config::Config, error::WeatherError, util::title_case};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::{error::Error, io};

/// Something that can tell us the current weather in a city
pub trait WeatherClient: Send + Sync {
    /// Fetch the current weather. No caching, every call hits the provider.
    fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError>;
}

/// One snapshot of the weather in a city, in metric units
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReading {
    /// City name as resolved by the provider, which may differ from what the
    /// user typed
    pub city: String,
    pub country: String,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: u8,
    /// m/s
    pub wind_speed: f64,
    /// Title-cased description, e.g. "Clear Sky"
    pub condition: String,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherReading {
    pub fn notification_title(&self) -> String {
        format!("Weather Update - {}", self.city)
    }

    pub fn notification_body(&self) -> String {
        format!(
            "Temperature: {}°C\nCondition: {}",
            self.temperature, self.condition
        )
    }
}

/// Client for the OpenWeatherMap "current weather" endpoint
/// https://openweathermap.org/current
#[derive(Debug)]
pub struct OpenWeatherMap {
    agent: ureq::Agent,
    url: String,
    api_key: String,
}

impl OpenWeatherMap {
    const PLACEHOLDER_KEY: &'static str = "YOUR_API_KEY";

    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout())
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build();
        Self {
            agent,
            url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Map a non-200 response to an error. The provider usually explains
    /// itself in a JSON body, which we only use for the generic case.
    fn status_error(
        city: &str,
        status: u16,
        response: ureq::Response,
    ) -> WeatherError {
        match status {
            404 => WeatherError::NotFound { city: city.into() },
            401 => WeatherError::Unauthorized,
            429 => WeatherError::RateLimited,
            code => {
                let message = response
                    .into_json::<ErrorBody>()
                    .ok()
                    .and_then(ErrorBody::into_message);
                WeatherError::ApiError { code, message }
            }
        }
    }
}

impl WeatherClient for OpenWeatherMap {
    fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        if self.api_key.is_empty() || self.api_key == Self::PLACEHOLDER_KEY {
            return Err(WeatherError::MissingApiKey);
        }

        info!("Fetching weather for {city:?}");
        let result = self
            .agent
            .get(&self.url)
            .query("q", city)
            .query("appid", &self.api_key)
            .query("units", "metric")
            .call();

        let response = match result {
            Ok(response) if response.status() == 200 => response,
            // ureq only hands us 2xx/3xx here, but anything other than a 200
            // won't have a body we can use
            Ok(response) => {
                let status = response.status();
                return Err(Self::status_error(city, status, response));
            }
            Err(ureq::Error::Status(status, response)) => {
                return Err(Self::status_error(city, status, response));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(transport_error(&transport));
            }
        };

        let body: CurrentWeather = response
            .into_json()
            .map_err(|err| WeatherError::InvalidResponse(err.to_string()))?;
        let reading = body.into_reading()?;
        debug!("Received {reading:?}");
        Ok(reading)
    }
}

/// Classify a transport failure. Timeouts show up as an I/O error somewhere in
/// the source chain, regardless of which phase of the request hit them.
fn transport_error(transport: &ureq::Transport) -> WeatherError {
    let mut source: Option<&(dyn Error + 'static)> = transport.source();
    while let Some(error) = source {
        if let Some(io_error) = error.downcast_ref::<io::Error>() {
            if matches!(
                io_error.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ) {
                return WeatherError::Timeout;
            }
        }
        source = error.source();
    }

    match transport.kind() {
        ureq::ErrorKind::Dns
        | ureq::ErrorKind::ConnectionFailed
        | ureq::ErrorKind::ProxyConnect => WeatherError::NetworkUnreachable,
        _ => WeatherError::Network(transport.to_string()),
    }
}

/// Successful response body. We only pull out the fields we display.
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: String,
    main: Main,
    wind: Wind,
    weather: Vec<Condition>,
    #[serde(default)]
    sys: Sys,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    // Missing for some places, e.g. in international waters
    #[serde(default)]
    country: String,
}

impl CurrentWeather {
    fn into_reading(self) -> Result<WeatherReading, WeatherError> {
        let condition = self.weather.into_iter().next().ok_or_else(|| {
            WeatherError::InvalidResponse("no weather conditions".into())
        })?;
        Ok(WeatherReading {
            city: self.name,
            country: self.sys.country,
            temperature: self.main.temp,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            condition: title_case(&condition.description),
            fetched_at: Utc::now(),
        })
    }
}

/// Body of an error response, e.g. `{"cod": "404", "message": "city not found"}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    /// Sometimes a string, sometimes a number
    cod: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message.filter(|message| !message.is_empty()).or_else(|| {
            self.cod.map(|cod| match cod {
                serde_json::Value::String(cod) => cod,
                other => other.to_string(),
            })
        })
    }
}
