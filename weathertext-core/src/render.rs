//! Localized text and icon selection for a normalized [`Weather`] value.

use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::Rng;
use std::path::Path;

use crate::{
    condition::ConditionTag,
    config::Mode,
    locale::{Locale, PhraseBook},
    model::{Icon, Rendered, RenderedText, Weather},
};

/// Position of "today" in the `days` list, after the seven weekdays.
pub const TODAY_DAY_INDEX: usize = 7;
/// Position of "tomorrow" in the `days` list.
pub const TOMORROW_DAY_INDEX: usize = 8;

/// Source of phrase-variant indices.
pub trait VariantPicker: Send {
    /// An index in `0..count`. `count` is never zero.
    fn pick(&mut self, count: usize) -> usize;
}

impl<R: Rng + Send + ?Sized> VariantPicker for R {
    fn pick(&mut self, count: usize) -> usize {
        self.random_range(0..count.max(1))
    }
}

/// Always picks the same variant, clamped to the available range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPicker(pub usize);

impl VariantPicker for FixedPicker {
    fn pick(&mut self, count: usize) -> usize {
        self.0.min(count.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextRenderer<'a> {
    phrases: &'a dyn PhraseBook,
    icon_dir: &'a Path,
}

impl<'a> TextRenderer<'a> {
    pub fn new(phrases: &'a dyn PhraseBook, icon_dir: &'a Path) -> Self {
        Self { phrases, icon_dir }
    }

    /// Build icon and text for `weather`.
    ///
    /// `mode` is the mode the weather was fetched with; `now` anchors the
    /// "today"/"tomorrow" wording of forecasts.
    pub fn render(
        &self,
        weather: &Weather,
        mode: &Mode,
        locale: Locale,
        picker: &mut dyn VariantPicker,
        now: DateTime<Utc>,
    ) -> Rendered {
        let icon = self.icon(weather.condition);
        let (normal, simple) = self.condition_text(weather.condition, locale, picker);

        let place = format!("{} {}", self.translate(locale, "at"), weather.city);
        let temperature = format!("{}{}", weather.temperature, weather.temperature_unit.symbol());

        let advanced = match mode {
            Mode::Current => format!(
                "{place} : {} {temperature}, {normal}",
                self.translate(locale, "temperature.is"),
            ),
            Mode::Forecast(target) => {
                let offset = target.utc_offset;
                let slot = weather.observation_time.with_timezone(&offset);
                let today = now.with_timezone(&offset);

                let day_index = match i64::from(slot.day()) - i64::from(today.day()) {
                    0 => TODAY_DAY_INDEX,
                    1 => TOMORROW_DAY_INDEX,
                    _ => slot.weekday().num_days_from_sunday() as usize,
                };
                let mut day = self.synonym(locale, "days", day_index);

                if !weather.is_all_day {
                    day = format!(
                        "{day} {} {:02}{}00",
                        self.translate(locale, "at").to_lowercase(),
                        slot.hour(),
                        self.translate(locale, "hour"),
                    );
                }

                format!(
                    "{place} : {day}, {} {temperature}, {simple}",
                    self.translate(locale, "temperature.will"),
                )
            }
        };

        Rendered {
            icon,
            text: RenderedText { normal, simple, advanced },
        }
    }

    pub fn icon(&self, condition: ConditionTag) -> Icon {
        let name = condition.icon_name();
        Icon {
            name: name.to_string(),
            path: self.icon_dir.join(format!("{name}.png")),
        }
    }

    /// `(normal, simple)` phrases for `condition`.
    ///
    /// One index selects both the prefix key and the phrase so the pair stays
    /// aligned; the prefix itself is then drawn from its group.
    fn condition_text(
        &self,
        condition: ConditionTag,
        locale: Locale,
        picker: &mut dyn VariantPicker,
    ) -> (String, String) {
        let phrases_key = format!("weathers.{condition}.weather");
        let count = self
            .phrases
            .count(locale, &phrases_key)
            .filter(|&n| n > 0)
            .unwrap_or(1);
        let index = picker.pick(count);

        let prefix = self
            .phrases
            .synonym(locale, &format!("weathers.{condition}.prefix_keys"), index)
            .map(|key| self.random_prefix(locale, key, picker))
            .unwrap_or_default();

        let simple = self
            .phrases
            .synonym(locale, &phrases_key, index)
            .unwrap_or(condition.as_str())
            .to_string();

        (format!("{prefix} {simple}").trim().to_string(), simple)
    }

    fn random_prefix(&self, locale: Locale, key: &str, picker: &mut dyn VariantPicker) -> String {
        let prefixes_key = format!("prefixs.{key}.prefix");
        let count = self
            .phrases
            .count(locale, &prefixes_key)
            .filter(|&n| n > 0)
            .unwrap_or(1);
        let index = picker.pick(count);

        self.phrases
            .synonym(locale, &prefixes_key, index)
            .unwrap_or_default()
            .to_string()
    }

    /// Missing keys render as the key itself.
    fn translate(&self, locale: Locale, key: &str) -> String {
        self.phrases.translate(locale, key).unwrap_or(key).to_string()
    }

    fn synonym(&self, locale: Locale, key: &str, index: usize) -> String {
        self.phrases.synonym(locale, key, index).unwrap_or(key).to_string()
    }
}
