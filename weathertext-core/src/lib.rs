//! Core library for the `weathertext` CLI.
//!
//! This crate defines:
//! - The query configuration (API, mode, units, position, locale)
//! - Normalization of OpenWeatherMap payloads into unit-consistent values
//! - Condition classification and localized, randomized text rendering
//! - A small ring cache of recent results and the service tying it together
//!
//! It is used by `weathertext-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod condition;
pub mod config;
pub mod error;
pub mod locale;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod render;
pub mod service;
pub mod settings;
pub mod units;

pub use cache::{SlotIndex, SnapshotCache};
pub use condition::{ConditionTag, classify};
pub use config::{Config, ConfigureReport, Mode, Position, PositionOptions};
pub use error::WeatherError;
pub use locale::{JsonPhraseBook, Locale, PhraseBook};
pub use model::{Icon, RenderedText, Snapshot, Weather, WeatherReport};
pub use provider::{HttpTransport, Transport, TransportError, TransportResponse};
pub use render::{FixedPicker, TextRenderer, VariantPicker};
pub use service::WeatherService;
pub use settings::Settings;
pub use units::{SpeedUnit, TemperatureUnit, UnitSystem};
