//! Request pipeline: fetch, normalize, render.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

use crate::{
    cache::{DEFAULT_CAPACITY, SlotIndex, SnapshotCache},
    config::{Config, ConfigureReport},
    error::WeatherError,
    locale::{JsonPhraseBook, PhraseBook},
    model::{Snapshot, WeatherReport},
    normalize::normalize,
    provider::{HttpTransport, ProviderRequest, Transport},
    render::{TextRenderer, VariantPicker},
    settings::Settings,
};

pub const DEFAULT_ICON_DIR: &str = "icons";

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Fetching,
    Normalizing,
    Rendering,
    Done,
    Failed,
}

/// Owns one query configuration and the cache of its recent results.
pub struct WeatherService {
    config: RwLock<Config>,
    cache: SnapshotCache,
    transport: Arc<dyn Transport>,
    phrases: Arc<dyn PhraseBook>,
    picker: Mutex<Box<dyn VariantPicker>>,
    icon_dir: PathBuf,
    clock: Clock,
}

impl fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherService")
            .field("config", &*self.config.read())
            .field("cache", &self.cache)
            .field("transport", &self.transport)
            .field("icon_dir", &self.icon_dir)
            .finish_non_exhaustive()
    }
}

impl WeatherService {
    pub fn new(transport: Arc<dyn Transport>, phrases: Arc<dyn PhraseBook>) -> Self {
        Self {
            config: RwLock::new(Config::default()),
            cache: SnapshotCache::with_capacity(DEFAULT_CAPACITY),
            transport,
            phrases,
            picker: Mutex::new(Box::new(StdRng::from_os_rng())),
            icon_dir: PathBuf::from(DEFAULT_ICON_DIR),
            clock: Arc::new(Utc::now),
        }
    }

    /// Service over HTTP with the embedded phrase tables.
    pub fn with_http() -> Result<Self> {
        let transport = HttpTransport::with_default_timeout()?;
        let phrases = JsonPhraseBook::embedded()?;
        Ok(Self::new(Arc::new(transport), Arc::new(phrases)))
    }

    pub fn with_config(self, config: Config) -> Self {
        *self.config.write() = config;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = SnapshotCache::with_capacity(capacity);
        self
    }

    pub fn with_picker(mut self, picker: impl VariantPicker + 'static) -> Self {
        self.picker = Mutex::new(Box::new(picker));
        self
    }

    pub fn with_icon_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.icon_dir = dir.into();
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Apply every field present in `settings`; see [`Config::apply`].
    pub fn configure(&self, settings: &Settings) -> ConfigureReport {
        self.config.write().apply(settings)
    }

    /// Mutate the configuration directly, e.g. to call a single setter.
    pub fn update_config<T>(&self, f: impl FnOnce(&mut Config) -> T) -> T {
        f(&mut self.config.write())
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn icon_dir(&self) -> &Path {
        &self.icon_dir
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Snapshot currently held by a cache slot.
    pub fn snapshot(&self, slot: SlotIndex) -> Result<Snapshot, WeatherError> {
        self.cache.get(slot)
    }

    /// Fetch, normalize and render the weather for the current configuration.
    ///
    /// The configuration is copied when the call starts; later changes do not
    /// affect a request in flight.
    pub async fn get(&self) -> Result<WeatherReport, WeatherError> {
        let config = self.config.read().clone();
        let mut stage = Stage::Idle;

        let result = self.run(&config, &mut stage).await;
        if let Err(err) = &result {
            debug!(from = ?stage, to = ?Stage::Failed, error = %err, "weather request stage");
        }
        result
    }

    async fn run(&self, config: &Config, stage: &mut Stage) -> Result<WeatherReport, WeatherError> {
        advance(stage, Stage::Fetching);
        let request = ProviderRequest::from_config(config).ok_or(WeatherError::ApiKeyMissing)?;
        let fetch_config = config.fetch_config();

        let response = self.transport.fetch(&request.url, &request.params).await?;
        if response.status == 0 && !response.body.is_object() {
            return Err(WeatherError::UnexpectedResponseShape { url: request.url });
        }

        // From here on this request only touches its own slot.
        let slot = self.cache.allocate();
        let fetched_at = (self.clock)();
        self.cache.store(
            slot,
            Snapshot::new(response.body.clone(), fetch_config.clone(), fetched_at),
        );

        advance(stage, Stage::Normalizing);
        let weather = normalize(&response.body, &fetch_config)?;
        self.cache.update(slot, |s| s.weather = Some(weather.clone()));

        advance(stage, Stage::Rendering);
        let rendered = {
            let renderer = TextRenderer::new(self.phrases.as_ref(), &self.icon_dir);
            let mut picker = self.picker.lock();
            renderer.render(&weather, &fetch_config.mode, config.locale(), &mut **picker, fetched_at)
        };
        self.cache.update(slot, |s| s.rendered = Some(rendered.clone()));

        advance(stage, Stage::Done);
        Ok(WeatherReport {
            weather,
            text: rendered.text,
            icon: rendered.icon,
            slot: slot.index(),
        })
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = ?*stage, to = ?next, "weather request stage");
    *stage = next;
}
