//! Turns a raw OpenWeatherMap payload into a canonical [`Weather`] value.

use chrono::{DateTime, Timelike, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    condition::{classify, is_daytime_icon},
    config::{FetchConfig, ForecastTarget, Mode, UnitPreferences},
    error::WeatherError,
    model::Weather,
    units::{self, SpeedUnit, TemperatureUnit, UnitSystem},
};

/// API versions this module knows how to read.
pub const SUPPORTED_API_VERSIONS: &[&str] = &["2.5"];

/// Forecast buckets are three hours wide and start on UTC multiples of 3h.
const BUCKET_HOURS: u32 = 3;

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: i64,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
    sys: Option<OwSys>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

/// Normalize `raw` as interpreted by the configuration it was fetched with.
pub fn normalize(raw: &Value, fetch: &FetchConfig) -> Result<Weather, WeatherError> {
    if !SUPPORTED_API_VERSIONS.contains(&fetch.api.version.as_str()) {
        return Err(WeatherError::UnsupportedApiVersion(fetch.api.version.clone()));
    }

    match &fetch.mode {
        Mode::Current => normalize_current(raw, &fetch.unit),
        Mode::Forecast(target) => normalize_forecast(raw, target, &fetch.unit),
    }
}

fn normalize_current(raw: &Value, unit: &UnitPreferences) -> Result<Weather, WeatherError> {
    let parsed = OwCurrentResponse::deserialize(raw)?;
    let condition = first_condition(&parsed.weather)?;
    let (temperature, wind_speed) = convert(parsed.main.temp, parsed.wind.speed, unit);
    let sys = parsed.sys.as_ref();

    Ok(Weather {
        forecast: false,
        is_all_day: false,
        observation_time: unix_to_utc(parsed.dt)?,
        sunrise: sys.and_then(|s| s.sunrise).map(unix_to_utc).transpose()?,
        sunset: sys.and_then(|s| s.sunset).map(unix_to_utc).transpose()?,
        temperature,
        temperature_unit: unit.temperature,
        humidity: percent(parsed.main.humidity),
        wind_speed,
        wind_speed_unit: unit.speed,
        city: parsed.name,
        condition: classify(condition.id, is_daytime_icon(&condition.icon)),
    })
}

fn normalize_forecast(
    raw: &Value,
    target: &ForecastTarget,
    unit: &UnitPreferences,
) -> Result<Weather, WeatherError> {
    let parsed = OwForecastResponse::deserialize(raw)?;
    let bucket = bucket_start(target.date.with_timezone(&Utc));

    // No exact bucket (e.g. a date past the provider's horizon) falls back to
    // the first entry rather than failing.
    let entry = parsed
        .list
        .iter()
        .find(|e| e.dt == bucket)
        .or_else(|| parsed.list.first())
        .ok_or_else(|| WeatherError::Parse("forecast list is empty".to_string()))?;

    let condition = first_condition(&entry.weather)?;
    let (temperature, wind_speed) = convert(entry.main.temp, entry.wind.speed, unit);

    Ok(Weather {
        forecast: true,
        is_all_day: target.all_day,
        observation_time: unix_to_utc(entry.dt)?,
        sunrise: None,
        sunset: None,
        temperature,
        temperature_unit: unit.temperature,
        humidity: percent(entry.main.humidity),
        wind_speed,
        wind_speed_unit: unit.speed,
        city: parsed.city.name,
        condition: classify(condition.id, is_daytime_icon(&condition.icon)),
    })
}

/// Unix timestamp of the three-hour bucket containing `date`.
fn bucket_start(date: DateTime<Utc>) -> i64 {
    let hour = date.hour() - date.hour() % BUCKET_HOURS;
    let start = date
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(date);
    start.timestamp()
}

/// Convert provider-native values into the requested units, rounded to two
/// decimals.
///
/// The provider answers in the requested system's native units (metric:
/// celsius and m/s, imperial: fahrenheit and mph). Imperial to km/h goes
/// through m/s.
pub fn convert(temperature: f64, wind_speed: f64, unit: &UnitPreferences) -> (f64, f64) {
    let (temperature, wind_speed) = match unit.system {
        UnitSystem::Metric => {
            let temperature = match unit.temperature {
                TemperatureUnit::Fahrenheit => units::celsius_to_fahrenheit(temperature),
                TemperatureUnit::Celsius => temperature,
            };
            let wind_speed = match unit.speed {
                SpeedUnit::MilesHour => units::meter_second_to_miles_hour(wind_speed),
                SpeedUnit::KilometerHour => units::meter_second_to_kilometer_hour(wind_speed),
                SpeedUnit::MeterSecond => wind_speed,
            };
            (temperature, wind_speed)
        }
        UnitSystem::Imperial => {
            let temperature = match unit.temperature {
                TemperatureUnit::Celsius => units::fahrenheit_to_celsius(temperature),
                TemperatureUnit::Fahrenheit => temperature,
            };
            let wind_speed = match unit.speed {
                SpeedUnit::MeterSecond => units::miles_hour_to_meter_second(wind_speed),
                SpeedUnit::KilometerHour => units::meter_second_to_kilometer_hour(
                    units::miles_hour_to_meter_second(wind_speed),
                ),
                SpeedUnit::MilesHour => wind_speed,
            };
            (temperature, wind_speed)
        }
    };

    (units::round2(temperature), units::round2(wind_speed))
}

fn first_condition(conditions: &[OwCondition]) -> Result<&OwCondition, WeatherError> {
    conditions
        .first()
        .ok_or_else(|| WeatherError::Parse("payload has no weather condition".to_string()))
}

/// Provider humidity is a percentage that may carry decimals.
fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::Parse(format!("timestamp {ts} is out of range")))
}
