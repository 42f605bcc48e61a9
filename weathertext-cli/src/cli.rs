use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select, Text};
use rand::{SeedableRng, rngs::StdRng};
use std::{path::PathBuf, sync::Arc};

use weathertext_core::{
    Config, FixedPicker, HttpTransport, JsonPhraseBook, Locale, PhraseBook, PositionOptions,
    Settings, WeatherReport, WeatherService,
    config::{ApiOptions, DEFAULT_UTC_OFFSET, ModeOptions, UnitOptions},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathertext", version, about = "Localized weather descriptions")]
pub struct Cli {
    /// Log pipeline stages to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store API key, locale, units and location.
    Configure {
        /// Skip the API key prompt.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Describe the current weather or a forecast.
    Show(ShowArgs),

    /// Print the location of the settings file.
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Forecast instead of current weather.
    #[arg(long)]
    forecast: bool,

    /// Forecast date: RFC 3339, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD".
    #[arg(long, requires = "forecast")]
    date: Option<String>,

    /// Describe the forecast hour instead of the whole day.
    #[arg(long, requires = "forecast")]
    at_hour: bool,

    /// UTC offset used for forecast dates, e.g. "+02:00".
    #[arg(long, requires = "forecast", allow_hyphen_values = true)]
    tz: Option<String>,

    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    country_code: Option<String>,
    #[arg(long)]
    city_id: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
    #[arg(long)]
    zip: Option<String>,

    /// en-US or fr-FR.
    #[arg(long)]
    locale: Option<String>,
    /// metric or imperial.
    #[arg(long)]
    units: Option<String>,
    /// celsius or fahrenheit.
    #[arg(long)]
    temperature: Option<String>,
    /// meter/sec, miles/hour or kilometer/hour.
    #[arg(long)]
    speed: Option<String>,

    /// Always use this phrase variant instead of a random one.
    #[arg(long, conflicts_with = "seed")]
    variant: Option<usize>,
    /// Seed for phrase selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory holding <locale>.json phrase tables.
    #[arg(long)]
    locales: Option<PathBuf>,
    /// Directory holding the condition icons.
    #[arg(long)]
    icons: Option<PathBuf>,

    /// Print the whole report as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { api_key } => configure(api_key),
            Command::Show(args) => show(args).await,
            Command::ConfigPath => {
                println!("{}", Settings::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn configure(api_key: Option<String>) -> Result<()> {
    let mut settings = Settings::load()?;

    let key = match api_key {
        Some(key) => key,
        None => Password::new("OpenWeatherMap API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };

    let locales: Vec<&str> = Locale::all().iter().map(|l| l.as_str()).collect();
    let locale = Select::new("Locale:", locales).prompt()?;
    let system = Select::new("Unit system:", vec!["metric", "imperial"]).prompt()?;
    let temperature = Select::new("Temperature unit:", vec!["celsius", "fahrenheit"]).prompt()?;
    let speed =
        Select::new("Wind speed unit:", vec!["kilometer/hour", "meter/sec", "miles/hour"])
            .prompt()?;
    let city = Text::new("City:").with_default("Paris").prompt()?;
    let country_code = Text::new("Country code:").with_default("fr").prompt()?;

    settings = settings.merge(Settings {
        locale: Some(locale.to_string()),
        api: Some(ApiOptions::from(key)),
        units: Some(UnitOptions {
            system: Some(system.to_string()),
            temperature: Some(temperature.to_string()),
            speed: Some(speed.to_string()),
        }),
        position: Some(PositionOptions {
            city: Some(city),
            country_code: Some(country_code),
            ..Default::default()
        }),
        ..Default::default()
    });

    let report = Config::default().apply(&settings);
    if !report.is_clean() {
        return Err(anyhow!("Invalid settings: {}", report.rejected.join(", ")));
    }

    settings.save()?;
    println!("Saved settings to {}", Settings::config_file_path()?.display());
    Ok(())
}

async fn show(args: ShowArgs) -> Result<()> {
    let settings = Settings::load()?.merge(overrides(&args)?);

    let phrases: Arc<dyn PhraseBook> = match &args.locales {
        Some(dir) => Arc::new(JsonPhraseBook::from_dir(dir)?),
        None => Arc::new(JsonPhraseBook::embedded()?),
    };
    let transport = Arc::new(HttpTransport::with_default_timeout()?);

    let mut service = WeatherService::new(transport, phrases);
    if let Some(variant) = args.variant {
        service = service.with_picker(FixedPicker(variant));
    } else if let Some(seed) = args.seed {
        service = service.with_picker(StdRng::seed_from_u64(seed));
    }
    if let Some(icons) = &args.icons {
        service = service.with_icon_dir(icons.clone());
    }

    let report = service.configure(&settings);
    if !report.is_clean() {
        eprintln!("Ignoring invalid settings: {}", report.rejected.join(", "));
    }

    let report = service.get().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Settings taken from command-line flags.
fn overrides(args: &ShowArgs) -> Result<Settings> {
    let mode = if args.forecast {
        let tz = args.tz.clone().unwrap_or_else(|| DEFAULT_UTC_OFFSET.to_string());
        let date = args.date.as_deref().map(|d| parse_date(d, &tz)).transpose()?;
        Some(ModeOptions {
            kind: "forecast".to_string(),
            date,
            all_day: Some(!args.at_hour),
            tz: Some(tz),
        })
    } else {
        None
    };

    let units = (args.units.is_some() || args.temperature.is_some() || args.speed.is_some())
        .then(|| UnitOptions {
            system: args.units.clone(),
            temperature: args.temperature.clone(),
            speed: args.speed.clone(),
        });

    let position = PositionOptions {
        city_id: args.city_id.clone(),
        city: args.city.clone(),
        country: args.country.clone(),
        country_code: args.country_code.clone(),
        lat: args.lat,
        lon: args.lon,
        zip: args.zip.clone(),
    };
    let position = (position != PositionOptions::default()).then_some(position);

    Ok(Settings {
        locale: args.locale.clone(),
        api: None,
        mode,
        units,
        position,
    })
}

/// Parse a forecast date, interpreting dates without an offset at `tz`.
fn parse_date(value: &str, tz: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }

    let offset: FixedOffset = tz
        .parse()
        .map_err(|_| anyhow!("Invalid UTC offset '{tz}', expected e.g. \"+02:00\""))?;

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(12, 0, 0))
        })
        .ok_or_else(|| anyhow!("Invalid date '{value}'"))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|d| d.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Invalid date '{value}'"))
}

fn print_report(report: &WeatherReport) {
    let weather = &report.weather;
    println!("{}", report.text.advanced);
    println!(
        "humidity: {}%  wind: {} {}  icon: {} ({})",
        weather.humidity,
        weather.wind_speed,
        weather.wind_speed_unit,
        report.icon.name,
        report.icon.path.display(),
    );
}
