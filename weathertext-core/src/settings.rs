use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::config::{ApiOptions, ModeOptions, PositionOptions, UnitOptions};

/// User settings stored on disk; every field is optional.
///
/// Example TOML:
/// ```toml
/// locale = "en-US"
///
/// [api]
/// key = "..."
///
/// [units]
/// system = "metric"
/// speed = "kilometer/hour"
///
/// [position]
/// city = "Lyon"
/// country_code = "fr"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionOptions>,
}

impl Settings {
    /// Load settings from the platform config directory, or empty defaults if
    /// the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no settings file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Write settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weathertext", "weathertext")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("settings.toml"))
    }

    /// Overlay `other` on top of `self`: fields set in `other` win.
    pub fn merge(mut self, other: Settings) -> Self {
        if other.locale.is_some() {
            self.locale = other.locale;
        }
        if other.mode.is_some() {
            self.mode = other.mode;
        }
        if let Some(api) = other.api {
            let base = self.api.take().unwrap_or_default();
            self.api = Some(ApiOptions {
                key: api.key.or(base.key),
                host: api.host.or(base.host),
                version: api.version.or(base.version),
            });
        }
        if let Some(units) = other.units {
            let base = self.units.take().unwrap_or_default();
            self.units = Some(UnitOptions {
                system: units.system.or(base.system),
                temperature: units.temperature.or(base.temperature),
                speed: units.speed.or(base.speed),
            });
        }
        if other.position.is_some() {
            self.position = other.position;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("weathertext-settings-{}-{name}", std::process::id()))
            .join("settings.toml")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = scratch_path("missing");
        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let path = scratch_path("roundtrip");
        let settings = Settings {
            locale: Some("en-US".into()),
            api: Some(ApiOptions::from("KEY")),
            units: Some(UnitOptions { speed: Some("miles/hour".into()), ..Default::default() }),
            position: Some(PositionOptions {
                city: Some("Lyon".into()),
                country_code: Some("fr".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn parses_mode_table() {
        let settings: Settings = toml::from_str(
            r#"
            [mode]
            type = "forecast"
            all_day = false
            tz = "+02:00"
            "#,
        )
        .unwrap();

        let mode = settings.mode.unwrap();
        assert_eq!(mode.kind, "forecast");
        assert_eq!(mode.all_day, Some(false));
        assert_eq!(mode.tz.as_deref(), Some("+02:00"));
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let path = scratch_path("invalid");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "locale = [").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn merge_prefers_overrides_field_by_field() {
        let base = Settings {
            locale: Some("fr-FR".into()),
            api: Some(ApiOptions::from("KEY")),
            units: Some(UnitOptions {
                system: Some("metric".into()),
                speed: Some("meter/sec".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overrides = Settings {
            api: Some(ApiOptions { host: Some("http://localhost".into()), ..Default::default() }),
            units: Some(UnitOptions { speed: Some("miles/hour".into()), ..Default::default() }),
            ..Default::default()
        };

        let merged = base.merge(overrides);
        let api = merged.api.unwrap();
        assert_eq!(api.key.as_deref(), Some("KEY"));
        assert_eq!(api.host.as_deref(), Some("http://localhost"));
        let units = merged.units.unwrap();
        assert_eq!(units.system.as_deref(), Some("metric"));
        assert_eq!(units.speed.as_deref(), Some("miles/hour"));
        assert_eq!(merged.locale.as_deref(), Some("fr-FR"));
    }
}
