use thiserror::Error;

/// Everything that can go wrong while fetching weather. The `Display` output
/// of each variant is the message shown to the user.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("City '{city}' not found. Please check the spelling.")]
    NotFound { city: String },

    #[error("Invalid API key or not activated yet. Verify your key.")]
    Unauthorized,

    #[error("Rate limit exceeded (HTTP 429). Please wait and try again.")]
    RateLimited,

    #[error("Request timed out. Please check your internet connection.")]
    Timeout,

    #[error("No internet connection. Please check your network.")]
    NetworkUnreachable,

    #[error("API Error: {code}{}", message_suffix(.message))]
    ApiError { code: u16, message: Option<String> },

    #[error("Please set your OpenWeatherMap API key in the configuration.")]
    MissingApiKey,

    /// Transport failure that isn't a timeout or an unreachable host
    #[error("Network error: {0}")]
    Network(String),

    /// Provider said 200 but the body isn't what we expect
    #[error("Unexpected response from weather provider: {0}")]
    InvalidResponse(String),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(" - {message}"),
        None => String::new(),
    }
}

/// A shell command that couldn't be understood or carried out
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Please enter a city name.")]
    EmptyCity,

    #[error("Invalid argument `{argument}` for `{command}`, expected {expected}")]
    InvalidArgument {
        command: &'static str,
        argument: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Weather(#[from] WeatherError),
}
