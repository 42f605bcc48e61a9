//! Query configuration owned by a [`WeatherService`](crate::WeatherService).
//!
//! Every setter is infallible: an input that does not validate leaves the
//! previous value untouched and the setter returns `false`.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{
    locale::Locale,
    settings::Settings,
    units::{SpeedUnit, TemperatureUnit, UnitSystem},
};

pub const DEFAULT_HOST: &str = "https://api.openweathermap.org";
pub const DEFAULT_API_VERSION: &str = "2.5";
pub const DEFAULT_UTC_OFFSET: &str = "+00:00";

/// Provider credentials and endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub key: Option<String>,
    pub host: String,
    pub version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            host: DEFAULT_HOST.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// Partial API update. A bare string converts into a key-only update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOptions {
    pub key: Option<String>,
    pub host: Option<String>,
    pub version: Option<String>,
}

impl From<&str> for ApiOptions {
    fn from(key: &str) -> Self {
        Self { key: Some(key.to_string()), ..Default::default() }
    }
}

impl From<String> for ApiOptions {
    fn from(key: String) -> Self {
        Self { key: Some(key), ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Current,
    Forecast,
}

impl QueryKind {
    /// Endpoint path segment used by the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Current => "weather",
            QueryKind::Forecast => "forecast",
        }
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "weather" | "actual" | "current" => Ok(QueryKind::Current),
            "forecast" | "prevision" => Ok(QueryKind::Forecast),
            other => Err(format!("unknown query mode '{other}'")),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast slot the query targets, already normalized to the top of an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastTarget {
    pub date: DateTime<FixedOffset>,
    pub all_day: bool,
    pub utc_offset: FixedOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Current,
    Forecast(ForecastTarget),
}

impl Mode {
    pub fn kind(&self) -> QueryKind {
        match self {
            Mode::Current => QueryKind::Current,
            Mode::Forecast(_) => QueryKind::Forecast,
        }
    }

    pub fn forecast(&self) -> Option<&ForecastTarget> {
        match self {
            Mode::Current => None,
            Mode::Forecast(target) => Some(target),
        }
    }
}

/// Mode update. A bare string converts into a type-only update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeOptions {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: Option<bool>,
    #[serde(default)]
    pub tz: Option<String>,
}

impl From<&str> for ModeOptions {
    fn from(kind: &str) -> Self {
        Self { kind: kind.to_string(), date: None, all_day: None, tz: None }
    }
}

impl From<QueryKind> for ModeOptions {
    fn from(kind: QueryKind) -> Self {
        Self::from(kind.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitPreferences {
    pub system: UnitSystem,
    pub temperature: TemperatureUnit,
    pub speed: SpeedUnit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOptions {
    pub system: Option<String>,
    pub temperature: Option<String>,
    pub speed: Option<String>,
}

/// Location selector sent to the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    CityId(String),
    City {
        name: String,
        country: Option<String>,
        country_code: Option<String>,
    },
    Coordinates {
        lat: f64,
        lon: f64,
    },
    Zip {
        zip: String,
        country_code: String,
    },
}

impl Default for Position {
    fn default() -> Self {
        Position::City {
            name: "Paris".to_string(),
            country: None,
            country_code: Some("fr".to_string()),
        }
    }
}

impl Position {
    /// Pick the first structurally complete shape in precedence order:
    /// city id, city + country, coordinates, zip + country code.
    pub fn from_options(options: &PositionOptions) -> Option<Self> {
        if let Some(id) = non_empty(&options.city_id) {
            return Some(Position::CityId(id));
        }

        let country = non_empty(&options.country);
        let country_code = non_empty(&options.country_code);

        if let Some(name) = non_empty(&options.city) {
            if country.is_some() || country_code.is_some() {
                return Some(Position::City { name, country, country_code });
            }
        }

        if let (Some(lat), Some(lon)) = (options.lat, options.lon) {
            if lat.is_finite()
                && lon.is_finite()
                && (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lon)
            {
                return Some(Position::Coordinates { lat, lon });
            }
        }

        match (non_empty(&options.zip), country_code) {
            (Some(zip), Some(country_code)) => Some(Position::Zip { zip, country_code }),
            _ => None,
        }
    }
}

/// Loose position input; see [`Position::from_options`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionOptions {
    pub city_id: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub zip: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The part of the configuration a snapshot is interpreted with.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub api: ApiConfig,
    pub mode: Mode,
    pub unit: UnitPreferences,
}

/// Fields of a [`Settings`] value that [`Config::apply`] refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    pub rejected: Vec<&'static str>,
}

impl ConfigureReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    fn record(&mut self, field: &'static str, applied: bool) {
        if !applied {
            self.rejected.push(field);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    api: ApiConfig,
    mode: Mode,
    unit: UnitPreferences,
    position: Position,
    locale: Locale,
}

impl Config {
    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn unit(&self) -> UnitPreferences {
        self.unit
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Frozen copy of the fields a fetch depends on.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            api: self.api.clone(),
            mode: self.mode,
            unit: self.unit,
        }
    }

    /// Update key, host and/or version. Empty strings are ignored.
    pub fn set_api(&mut self, options: impl Into<ApiOptions>) -> bool {
        let options = options.into();
        let mut applied = false;

        if let Some(key) = non_empty(&options.key) {
            self.api.key = Some(key);
            applied = true;
        }
        if let Some(host) = non_empty(&options.host) {
            self.api.host = host.trim_end_matches('/').to_string();
            applied = true;
        }
        if let Some(version) = non_empty(&options.version) {
            self.api.version = version;
            applied = true;
        }

        applied
    }

    pub fn set_mode(&mut self, options: impl Into<ModeOptions>) -> bool {
        self.set_mode_at(options, Utc::now())
    }

    /// Like [`Config::set_mode`] with an explicit clock, used to resolve the
    /// default forecast date ("tomorrow at noon").
    pub fn set_mode_at(&mut self, options: impl Into<ModeOptions>, now: DateTime<Utc>) -> bool {
        let options = options.into();
        let Ok(kind) = options.kind.parse::<QueryKind>() else {
            return false;
        };

        let mode = match kind {
            QueryKind::Current => Mode::Current,
            QueryKind::Forecast => {
                let all_day = options.all_day.unwrap_or(true);
                let tz = options.tz.as_deref().unwrap_or(DEFAULT_UTC_OFFSET);
                let Ok(utc_offset) = tz.trim().parse::<FixedOffset>() else {
                    return false;
                };
                let Some(date) = forecast_date(options.date, all_day, utc_offset, now) else {
                    return false;
                };
                Mode::Forecast(ForecastTarget { date, all_day, utc_offset })
            }
        };

        self.mode = mode;
        true
    }

    pub fn set_unit_system(&mut self, value: &str) -> bool {
        assign_parsed(&mut self.unit.system, value)
    }

    pub fn set_temperature_unit(&mut self, value: &str) -> bool {
        assign_parsed(&mut self.unit.temperature, value)
    }

    pub fn set_speed_unit(&mut self, value: &str) -> bool {
        assign_parsed(&mut self.unit.speed, value)
    }

    pub fn set_position(&mut self, options: &PositionOptions) -> bool {
        match Position::from_options(options) {
            Some(position) => {
                self.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_locale(&mut self, value: &str) -> bool {
        assign_parsed(&mut self.locale, value)
    }

    /// Apply every field present in `settings`, independently of each other.
    pub fn apply(&mut self, settings: &Settings) -> ConfigureReport {
        let mut report = ConfigureReport::default();

        if let Some(api) = &settings.api {
            report.record("api", self.set_api(api.clone()));
        }
        if let Some(mode) = &settings.mode {
            report.record("mode", self.set_mode(mode.clone()));
        }
        if let Some(units) = &settings.units {
            if let Some(system) = &units.system {
                report.record("units.system", self.set_unit_system(system));
            }
            if let Some(temperature) = &units.temperature {
                report.record("units.temperature", self.set_temperature_unit(temperature));
            }
            if let Some(speed) = &units.speed {
                report.record("units.speed", self.set_speed_unit(speed));
            }
        }
        if let Some(position) = &settings.position {
            report.record("position", self.set_position(position));
        }
        if let Some(locale) = &settings.locale {
            report.record("locale", self.set_locale(locale));
        }

        report
    }
}

fn assign_parsed<T: FromStr>(slot: &mut T, value: &str) -> bool {
    match value.parse::<T>() {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => false,
    }
}

/// Resolve the forecast instant at the top of an hour.
///
/// Without a date: tomorrow at noon at `offset`. With `all_day`: the given
/// day at noon. Otherwise the given instant seen at `offset`, truncated to
/// the hour.
fn forecast_date(
    date: Option<DateTime<Utc>>,
    all_day: bool,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Option<DateTime<FixedOffset>> {
    let local = match date {
        None => {
            let tomorrow = (now.with_timezone(&offset) + Duration::days(1)).date_naive();
            let noon = tomorrow.and_hms_opt(12, 0, 0)?;
            return offset.from_local_datetime(&noon).single();
        }
        Some(date) => date.with_timezone(&offset),
    };

    let local = if all_day { local.with_hour(12)? } else { local };
    local.with_minute(0)?.with_second(0)?.with_nanosecond(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn defaults_match_provider_conventions() {
        let cfg = Config::default();
        assert_eq!(cfg.api().host, DEFAULT_HOST);
        assert_eq!(cfg.api().version, "2.5");
        assert!(cfg.api().key.is_none());
        assert_eq!(*cfg.mode(), Mode::Current);
        assert_eq!(cfg.unit().system, UnitSystem::Metric);
        assert_eq!(cfg.unit().temperature, TemperatureUnit::Celsius);
        assert_eq!(cfg.unit().speed, SpeedUnit::KilometerHour);
        assert_eq!(cfg.locale(), Locale::FrFr);
        assert_eq!(*cfg.position(), Position::default());
    }

    #[test]
    fn bare_key_sets_only_the_key() {
        let mut cfg = Config::default();
        assert!(cfg.set_api("KEY"));
        assert_eq!(cfg.api().key.as_deref(), Some("KEY"));
        assert_eq!(cfg.api().host, DEFAULT_HOST);
    }

    #[test]
    fn empty_api_options_are_a_no_op() {
        let mut cfg = Config::default();
        let before = cfg.clone();
        assert!(!cfg.set_api(ApiOptions { key: Some("  ".into()), ..Default::default() }));
        assert_eq!(cfg, before);
    }

    #[test]
    fn invalid_units_leave_state_untouched() {
        let mut cfg = Config::default();
        let before = cfg.clone();

        assert!(!cfg.set_unit_system("nautical"));
        assert!(!cfg.set_temperature_unit("kelvin"));
        assert!(!cfg.set_speed_unit("knots"));
        assert_eq!(cfg, before);

        assert!(cfg.set_temperature_unit("fahrenheit"));
        assert_eq!(cfg.unit().temperature, TemperatureUnit::Fahrenheit);
        assert_eq!(cfg.unit().system, UnitSystem::Metric);
    }

    #[test]
    fn invalid_locale_is_rejected_silently() {
        let mut cfg = Config::default();
        assert!(!cfg.set_locale("de-DE"));
        assert_eq!(cfg.locale(), Locale::FrFr);
        assert!(cfg.set_locale("en-US"));
        assert_eq!(cfg.locale(), Locale::EnUs);
    }

    #[test]
    fn position_precedence_prefers_city_id() {
        let mut cfg = Config::default();
        let applied = cfg.set_position(&PositionOptions {
            city_id: Some("2988507".into()),
            city: Some("Paris".into()),
            country_code: Some("fr".into()),
            ..Default::default()
        });
        assert!(applied);
        assert_eq!(*cfg.position(), Position::CityId("2988507".into()));
    }

    #[test]
    fn position_does_not_mix_shapes() {
        let position = Position::from_options(&PositionOptions {
            city: Some("Lyon".into()),
            zip: Some("69001".into()),
            country_code: Some("fr".into()),
            lat: Some(45.76),
            ..Default::default()
        });
        assert_eq!(
            position,
            Some(Position::City {
                name: "Lyon".into(),
                country: None,
                country_code: Some("fr".into()),
            })
        );
    }

    #[test]
    fn coordinates_and_zip_shapes() {
        let coords = Position::from_options(&PositionOptions {
            lat: Some(48.85),
            lon: Some(2.35),
            zip: Some("75001".into()),
            country_code: Some("fr".into()),
            ..Default::default()
        });
        assert_eq!(coords, Some(Position::Coordinates { lat: 48.85, lon: 2.35 }));

        let zip = Position::from_options(&PositionOptions {
            zip: Some("94040".into()),
            country_code: Some("us".into()),
            ..Default::default()
        });
        assert_eq!(zip, Some(Position::Zip { zip: "94040".into(), country_code: "us".into() }));
    }

    #[test]
    fn partial_position_keeps_previous_value() {
        let mut cfg = Config::default();
        let before = cfg.position().clone();

        assert!(!cfg.set_position(&PositionOptions { city: Some("Berlin".into()), ..Default::default() }));
        assert!(!cfg.set_position(&PositionOptions { lat: Some(10.0), ..Default::default() }));
        assert!(!cfg.set_position(&PositionOptions {
            lat: Some(120.0),
            lon: Some(10.0),
            ..Default::default()
        }));
        assert!(!cfg.set_position(&PositionOptions { zip: Some("10115".into()), ..Default::default() }));
        assert_eq!(*cfg.position(), before);
    }

    #[test]
    fn unknown_mode_is_a_no_op() {
        let mut cfg = Config::default();
        assert!(!cfg.set_mode("hindcast"));
        assert_eq!(*cfg.mode(), Mode::Current);
    }

    #[test]
    fn forecast_without_date_defaults_to_tomorrow_noon() {
        let mut cfg = Config::default();
        assert!(cfg.set_mode_at("forecast", at("2024-03-10T22:41:13Z")));

        let target = cfg.mode().forecast().copied().unwrap();
        assert!(target.all_day);
        assert_eq!(target.utc_offset, FixedOffset::east_opt(0).unwrap());
        assert_eq!(target.date.to_rfc3339(), "2024-03-11T12:00:00+00:00");
    }

    #[test]
    fn forecast_all_day_forces_noon() {
        let mut cfg = Config::default();
        let options = ModeOptions {
            kind: "prevision".into(),
            date: Some(at("2024-03-12T07:25:40Z")),
            all_day: Some(true),
            tz: Some("+02:00".into()),
        };
        assert!(cfg.set_mode_at(options, at("2024-03-10T00:00:00Z")));

        let target = cfg.mode().forecast().copied().unwrap();
        assert_eq!(target.date.to_rfc3339(), "2024-03-12T12:00:00+02:00");
    }

    #[test]
    fn forecast_at_hour_reinterprets_at_offset() {
        let mut cfg = Config::default();
        let options = ModeOptions {
            kind: "forecast".into(),
            date: Some(at("2024-03-12T07:25:40.123Z")),
            all_day: Some(false),
            tz: Some("+02:00".into()),
        };
        assert!(cfg.set_mode_at(options, at("2024-03-10T00:00:00Z")));

        let target = cfg.mode().forecast().copied().unwrap();
        assert!(!target.all_day);
        assert_eq!(target.date.to_rfc3339(), "2024-03-12T09:00:00+02:00");
    }

    #[test]
    fn forecast_with_bad_offset_is_rejected() {
        let mut cfg = Config::default();
        let options = ModeOptions {
            kind: "forecast".into(),
            date: None,
            all_day: Some(false),
            tz: Some("Europe/Paris".into()),
        };
        assert!(!cfg.set_mode(options));
        assert_eq!(*cfg.mode(), Mode::Current);
    }

    #[test]
    fn fetch_config_is_a_frozen_copy() {
        let mut cfg = Config::default();
        cfg.set_api("KEY");
        let frozen = cfg.fetch_config();

        cfg.set_speed_unit("miles/hour");
        cfg.set_api(ApiOptions { version: Some("3.0".into()), ..Default::default() });

        assert_eq!(frozen.unit.speed, SpeedUnit::KilometerHour);
        assert_eq!(frozen.api.version, "2.5");
    }

    #[test]
    fn apply_reports_rejected_fields() {
        let mut cfg = Config::default();
        let settings = Settings {
            api: Some(ApiOptions::from("KEY")),
            units: Some(UnitOptions {
                system: Some("imperial".into()),
                temperature: Some("kelvin".into()),
                speed: None,
            }),
            locale: Some("xx-XX".into()),
            ..Default::default()
        };

        let report = cfg.apply(&settings);
        assert_eq!(report.rejected, vec!["units.temperature", "locale"]);
        assert!(!report.is_clean());
        assert_eq!(cfg.unit().system, UnitSystem::Imperial);
        assert_eq!(cfg.api().key.as_deref(), Some("KEY"));
    }
}
