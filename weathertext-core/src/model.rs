use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::{
    cache::SlotIndex,
    condition::ConditionTag,
    config::FetchConfig,
    units::{SpeedUnit, TemperatureUnit},
};

/// Canonical, unit-converted observation or forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    pub forecast: bool,
    pub is_all_day: bool,
    pub observation_time: DateTime<Utc>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub temperature: f64,
    pub temperature_unit: TemperatureUnit,
    /// Relative humidity, percent.
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_speed_unit: SpeedUnit,
    pub city: String,
    pub condition: ConditionTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedText {
    /// Prefix and phrase.
    pub normal: String,
    /// Phrase alone.
    pub simple: String,
    /// Full display sentence with place, day and temperature.
    pub advanced: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub icon: Icon,
    pub text: RenderedText,
}

/// One fetch result as stored in the cache.
///
/// `weather` and `rendered` are filled in by later pipeline stages; a
/// snapshot missing either belongs to a request that failed midway.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub raw: Value,
    pub fetch_config: FetchConfig,
    pub fetched_at: DateTime<Utc>,
    pub weather: Option<Weather>,
    pub rendered: Option<Rendered>,
}

impl Snapshot {
    pub fn new(raw: Value, fetch_config: FetchConfig, fetched_at: DateTime<Utc>) -> Self {
        Self { raw, fetch_config, fetched_at, weather: None, rendered: None }
    }

    pub fn is_complete(&self) -> bool {
        self.weather.is_some() && self.rendered.is_some()
    }
}

/// Caller-facing result of a successful request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub weather: Weather,
    pub text: RenderedText,
    pub icon: Icon,
    pub slot: SlotIndex,
}
