//! Measurement units and the linear conversions between them.
//!
//! Conversions never round; rounding to two decimals happens once, when the
//! canonical snapshot is assembled (see [`round2`]).

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const METER_SECOND_PER_MILE_HOUR: f64 = 0.44704;
const KILOMETER_HOUR_PER_METER_SECOND: f64 = 3.6;

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

impl FromStr for UnitSystem {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(UnknownUnit(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(UnknownUnit(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SpeedUnit {
    #[serde(rename = "meter/sec")]
    MeterSecond,
    #[serde(rename = "miles/hour")]
    MilesHour,
    #[default]
    #[serde(rename = "kilometer/hour")]
    KilometerHour,
}

impl SpeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedUnit::MeterSecond => "meter/sec",
            SpeedUnit::MilesHour => "miles/hour",
            SpeedUnit::KilometerHour => "kilometer/hour",
        }
    }
}

impl FromStr for SpeedUnit {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "meter/sec" | "metric" => Ok(SpeedUnit::MeterSecond),
            "miles/hour" | "imperial" => Ok(SpeedUnit::MilesHour),
            "kilometer/hour" => Ok(SpeedUnit::KilometerHour),
            _ => Err(UnknownUnit(value.to_string())),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(UnitSystem, TemperatureUnit, SpeedUnit);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit '{0}'")]
pub struct UnknownUnit(pub String);

pub fn celsius_to_fahrenheit(temp: f64) -> f64 {
    temp * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(temp: f64) -> f64 {
    (temp - 32.0) * 5.0 / 9.0
}

pub fn meter_second_to_miles_hour(speed: f64) -> f64 {
    speed / METER_SECOND_PER_MILE_HOUR
}

pub fn miles_hour_to_meter_second(speed: f64) -> f64 {
    speed * METER_SECOND_PER_MILE_HOUR
}

pub fn meter_second_to_kilometer_hour(speed: f64) -> f64 {
    speed * KILOMETER_HOUR_PER_METER_SECOND
}

pub fn kilometer_hour_to_meter_second(speed: f64) -> f64 {
    speed / KILOMETER_HOUR_PER_METER_SECOND
}

/// Round to two decimal places. Values that round to zero come back as `+0.0`.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}
