//! Translation tables: per-locale phrase lists addressed by dotted keys.

use anyhow::{Context, Result};
use serde_json::Value;
use std::{collections::HashMap, fmt, fs, path::Path, str::FromStr};

const EN_US_TABLE: &str = include_str!("../locales/en-US.json");
const FR_FR_TABLE: &str = include_str!("../locales/fr-FR.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    EnUs,
    #[default]
    FrFr,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::FrFr => "fr-FR",
        }
    }

    pub const fn all() -> &'static [Locale] {
        &[Locale::EnUs, Locale::FrFr]
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace('_', "-").to_lowercase();
        match normalized.as_str() {
            "en-us" => Ok(Locale::EnUs),
            "fr-fr" => Ok(Locale::FrFr),
            _ => Err(anyhow::anyhow!(
                "Unsupported locale '{value}'. Supported locales: en-US, fr-FR."
            )),
        }
    }
}

/// Read access to the phrase tables.
pub trait PhraseBook: Send + Sync + fmt::Debug {
    /// Plain phrase at `key`.
    fn translate(&self, locale: Locale, key: &str) -> Option<&str>;

    /// Number of variants listed under `key`.
    fn count(&self, locale: Locale, key: &str) -> Option<usize>;

    /// Variant `index` of the list under `key`; out-of-range indices clamp
    /// to the last variant.
    fn synonym(&self, locale: Locale, key: &str, index: usize) -> Option<&str>;
}

/// Phrase tables backed by one JSON document per locale.
#[derive(Debug, Clone)]
pub struct JsonPhraseBook {
    tables: HashMap<Locale, Value>,
}

impl JsonPhraseBook {
    /// Tables compiled into the crate.
    pub fn embedded() -> Result<Self> {
        let mut tables = HashMap::new();
        tables.insert(
            Locale::EnUs,
            serde_json::from_str(EN_US_TABLE).context("Failed to parse embedded en-US table")?,
        );
        tables.insert(
            Locale::FrFr,
            serde_json::from_str(FR_FR_TABLE).context("Failed to parse embedded fr-FR table")?,
        );
        Ok(Self { tables })
    }

    /// Load `<locale>.json` for every supported locale from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut tables = HashMap::new();
        for locale in Locale::all() {
            let path = dir.join(format!("{locale}.json"));
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read locale file: {}", path.display()))?;
            let table: Value = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse locale file: {}", path.display()))?;
            tables.insert(*locale, table);
        }
        Ok(Self { tables })
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(self.tables.get(&locale)?, |node, part| node.get(part))
    }
}

impl PhraseBook for JsonPhraseBook {
    fn translate(&self, locale: Locale, key: &str) -> Option<&str> {
        self.lookup(locale, key)?.as_str()
    }

    fn count(&self, locale: Locale, key: &str) -> Option<usize> {
        match self.lookup(locale, key)? {
            Value::Array(items) => Some(items.len()),
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn synonym(&self, locale: Locale, key: &str, index: usize) -> Option<&str> {
        match self.lookup(locale, key)? {
            Value::Array(items) => {
                let last = items.len().checked_sub(1)?;
                items.get(index.min(last))?.as_str()
            }
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parsing_accepts_case_and_underscore() {
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::EnUs);
        assert_eq!("fr_fr".parse::<Locale>().unwrap(), Locale::FrFr);
        let err = "de-DE".parse::<Locale>().unwrap_err();
        assert!(err.to_string().contains("Unsupported locale"));
    }

    #[test]
    fn embedded_tables_cover_every_locale() {
        let book = JsonPhraseBook::embedded().unwrap();
        for locale in Locale::all() {
            assert!(book.translate(*locale, "at").is_some(), "{locale} lacks 'at'");
            assert!(book.translate(*locale, "temperature.is").is_some());
            assert!(book.translate(*locale, "temperature.will").is_some());
            assert_eq!(book.count(*locale, "days"), Some(9));
        }
    }

    #[test]
    fn every_condition_has_aligned_tables() {
        use crate::condition::ConditionTag::*;
        let book = JsonPhraseBook::embedded().unwrap();
        let tags = [
            Sunny, Night, CloudyDay, CloudyNight, Cloudy, Fog, Rain, Thunderstorm, Showerrain,
            RainDay, RainNight, Snow, Meltedsnow, SnowDay, SnowNight, Unknown,
        ];

        for locale in Locale::all() {
            for tag in tags {
                let phrases = book.count(*locale, &format!("weathers.{tag}.weather"));
                let prefixes = book.count(*locale, &format!("weathers.{tag}.prefix_keys"));
                assert!(phrases.unwrap_or(0) > 0, "{locale}: no phrases for {tag}");
                assert_eq!(phrases, prefixes, "{locale}: misaligned tables for {tag}");

                for i in 0..phrases.unwrap_or(0) {
                    let key = book
                        .synonym(*locale, &format!("weathers.{tag}.prefix_keys"), i)
                        .unwrap();
                    assert!(
                        book.count(*locale, &format!("prefixs.{key}.prefix")).unwrap_or(0) > 0,
                        "{locale}: prefix group '{key}' is empty"
                    );
                }
            }
        }
    }

    #[test]
    fn synonym_clamps_to_last_variant() {
        let book = JsonPhraseBook::embedded().unwrap();
        let last = book.synonym(Locale::EnUs, "days", 8);
        assert_eq!(book.synonym(Locale::EnUs, "days", 42), last);
        assert_eq!(book.synonym(Locale::EnUs, "days", 0), Some("Sunday"));
    }

    #[test]
    fn missing_keys_are_none() {
        let book = JsonPhraseBook::embedded().unwrap();
        assert!(book.translate(Locale::FrFr, "does.not.exist").is_none());
        assert!(book.count(Locale::FrFr, "weathers.nothing.weather").is_none());
        assert!(book.synonym(Locale::FrFr, "weathers.nothing.weather", 0).is_none());
    }

    #[test]
    fn from_dir_reads_locale_files() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("locales");
        let book = JsonPhraseBook::from_dir(&dir).unwrap();
        assert_eq!(book.translate(Locale::FrFr, "at"), Some("À"));
    }
}
