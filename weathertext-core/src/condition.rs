use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal weather condition taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTag {
    Sunny,
    Night,
    CloudyDay,
    CloudyNight,
    Cloudy,
    Fog,
    Rain,
    Thunderstorm,
    Showerrain,
    RainDay,
    RainNight,
    Snow,
    Meltedsnow,
    SnowDay,
    SnowNight,
    /// Provider code outside every known range.
    Unknown,
}

impl ConditionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionTag::Sunny => "sunny",
            ConditionTag::Night => "night",
            ConditionTag::CloudyDay => "cloudy_day",
            ConditionTag::CloudyNight => "cloudy_night",
            ConditionTag::Cloudy => "cloudy",
            ConditionTag::Fog => "fog",
            ConditionTag::Rain => "rain",
            ConditionTag::Thunderstorm => "thunderstorm",
            ConditionTag::Showerrain => "showerrain",
            ConditionTag::RainDay => "rain_day",
            ConditionTag::RainNight => "rain_night",
            ConditionTag::Snow => "snow",
            ConditionTag::Meltedsnow => "meltedsnow",
            ConditionTag::SnowDay => "snow_day",
            ConditionTag::SnowNight => "snow_night",
            ConditionTag::Unknown => "unknown",
        }
    }

    /// Icon name shown for this condition.
    pub fn icon_name(&self) -> &'static str {
        match self {
            ConditionTag::Thunderstorm => "stormy",
            other => other.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        *self != ConditionTag::Unknown
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an OpenWeatherMap condition code to the internal taxonomy.
///
/// See <https://openweathermap.org/weather-conditions>. Order matters: 511
/// (freezing rain) is checked before the generic rain range.
pub fn classify(code: i64, is_day: bool) -> ConditionTag {
    match code {
        200..=299 => ConditionTag::Thunderstorm,
        800 if is_day => ConditionTag::Sunny,
        800 => ConditionTag::Night,
        801 if is_day => ConditionTag::CloudyDay,
        801 => ConditionTag::CloudyNight,
        802..=899 => ConditionTag::Cloudy,
        700..=799 => ConditionTag::Fog,
        300..=399 => ConditionTag::Rain,
        511 => ConditionTag::Meltedsnow,
        520 | 521 | 522 | 531 => ConditionTag::Showerrain,
        500..=599 if is_day => ConditionTag::RainDay,
        500..=599 => ConditionTag::RainNight,
        611 | 612 | 615 | 616 => ConditionTag::Meltedsnow,
        602 | 621 | 622 => ConditionTag::Snow,
        600..=699 if is_day => ConditionTag::SnowDay,
        600..=699 => ConditionTag::SnowNight,
        _ => ConditionTag::Unknown,
    }
}

/// Provider icon codes end with `d` during the day and `n` at night.
pub fn is_daytime_icon(icon: &str) -> bool {
    icon.ends_with('d')
}
