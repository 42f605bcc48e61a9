use thiserror::Error;

use crate::provider::TransportError;

/// Failures surfaced by [`WeatherService::get`](crate::WeatherService::get).
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(
        "No API key configured.\n\
         Hint: run `weathertext configure` and enter your OpenWeatherMap API key."
    )]
    ApiKeyMissing,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected response from {url}")]
    UnexpectedResponseShape { url: String },

    #[error("Missing parser for API version {0}")]
    UnsupportedApiVersion(String),

    #[error("Failed to parse provider payload: {0}")]
    Parse(String),

    #[error("No snapshot stored in cache slot {0}")]
    SlotNotFound(usize),
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Parse(err.to_string())
    }
}
