use thiserror::Error;

/// Message shown when a fetch fails and the provider did not explain why.
pub const GENERIC_FETCH_MESSAGE: &str = "Error fetching data";

/// Rejected search input. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid city name (letters and spaces only).")]
    InvalidCityName,
}

/// Failure of a single weather fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Provider answered with a non-2xx status.
    #[error("weather API returned {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 2xx response whose body did not match the expected shape.
    #[error("malformed weather response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid weather API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    /// Text for the error banner: the provider's own `message` when it sent
    /// one, otherwise the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FETCH_MESSAGE.to_string(),
        }
    }
}

/// Position lookup failed. Callers fall back to the default location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("geolocation is unavailable")]
    Unavailable,

    #[error("geolocation was denied")]
    Denied,

    #[error("geolocation lookup failed: {0}")]
    Lookup(String),
}
