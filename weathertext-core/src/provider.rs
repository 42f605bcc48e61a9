use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

use crate::config::{Config, Position};

pub mod http;

pub use http::HttpTransport;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to send request to {url}: {message}")]
    Request { url: String, message: String },

    #[error("Request to {url} failed with status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Performs the network call for a [`ProviderRequest`].
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn fetch(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<TransportResponse, TransportError>;
}

/// URL and query string for one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl ProviderRequest {
    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api = config.api();
        let key = api.key.as_deref()?;

        let url = format!("{}/data/{}/{}", api.host, api.version, config.mode().kind());

        let mut params = vec![
            ("appid".to_string(), key.to_string()),
            ("units".to_string(), config.unit().system.to_string()),
        ];
        params.extend(position_selector(config.position()));

        Some(Self { url, params })
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Query parameters identifying `position`.
pub fn position_selector(position: &Position) -> Vec<(String, String)> {
    match position {
        Position::CityId(id) => vec![("id".to_string(), id.clone())],
        Position::City { name, country, country_code } => {
            let q = match country_code.as_ref().or(country.as_ref()) {
                Some(country) => format!("{name},{country}"),
                None => name.clone(),
            };
            vec![("q".to_string(), q)]
        }
        Position::Coordinates { lat, lon } => vec![
            ("lat".to_string(), lat.to_string()),
            ("lon".to_string(), lon.to_string()),
        ],
        Position::Zip { zip, country_code } => {
            vec![("zip".to_string(), format!("{zip},{country_code}"))]
        }
    }
}
