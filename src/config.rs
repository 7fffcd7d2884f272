//! Configuration management for the weather bot
//!
//! Handles loading configuration from files and environment variables,
//! and validates every setting before any client is built.

use crate::BotError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::models::{TemperatureUnit, WindSpeedUnit};
use crate::region::RegionBounds;

/// Root configuration structure for the weather bot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Geocoding API configuration
    pub geocoding: GeocodingConfig,
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Satellite imagery configuration
    pub imagery: ImageryConfig,
    /// Messaging transport configuration
    pub transport: TransportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Base URL for the geocoding API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
    /// Number of candidates requested from the provider
    pub result_count: u32,
    /// Language for place names
    pub language: String,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for the weather API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
    /// Unit the provider reports temperatures in
    pub temperature_unit: TemperatureUnit,
    /// Unit the provider reports wind speeds in
    pub wind_speed_unit: WindSpeedUnit,
    /// Hours of hourly outlook to request (0 disables the outlook)
    pub forecast_hours: u32,
}

/// Satellite imagery configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageryConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
    /// Content types accepted as an image
    pub accepted_content_types: Vec<String>,
    /// Regions with satellite coverage, matched in order
    pub regions: Vec<RegionBounds>,
}

/// Which hosting transport delivers messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Read queries from stdin, print replies to stdout
    Console,
    /// Receive queries over HTTP and post replies to a callback URL
    Webhook,
}

/// Messaging transport configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Transport used by the binary
    pub kind: TransportKind,
    /// Listen address for the webhook transport
    pub listen_addr: String,
    /// Where the webhook transport posts replies
    pub callback_url: Option<String>,
    /// Upper bound for handling a single message, in seconds
    pub request_timeout_seconds: u32,
    /// Directory the console transport writes attachments to
    pub attachments_dir: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_api_timeout() -> u32 {
    10
}

fn default_imagery_timeout() -> u32 {
    20
}

fn default_result_count() -> u32 {
    1
}

fn default_language() -> String {
    "en".to_string()
}

fn default_forecast_hours() -> u32 {
    6
}

fn default_accepted_content_types() -> Vec<String> {
    vec!["image/jpeg".to_string(), "image/png".to_string()]
}

fn default_regions() -> Vec<RegionBounds> {
    vec![RegionBounds::conus()]
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u32 {
    30
}

fn default_attachments_dir() -> String {
    "attachments".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            timeout_seconds: default_api_timeout(),
            max_retries: 0,
            result_count: default_result_count(),
            language: default_language(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_api_timeout(),
            max_retries: 0,
            temperature_unit: TemperatureUnit::Celsius,
            wind_speed_unit: WindSpeedUnit::Kmh,
            forecast_hours: default_forecast_hours(),
        }
    }
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_imagery_timeout(),
            max_retries: 0,
            accepted_content_types: default_accepted_content_types(),
            regions: default_regions(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Console,
            listen_addr: default_listen_addr(),
            callback_url: None,
            request_timeout_seconds: default_request_timeout(),
            attachments_dir: default_attachments_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

const MAX_TIMEOUT_SECONDS: u32 = 300;
const MAX_RETRIES: u32 = 5;

impl BotConfig {
    /// Load configuration from the default location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // An explicit path must exist; the default locations are optional
        let (config_file, required) = match config_path {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Configuration file {} does not exist", path.display());
                }
                (path, true)
            }
            None => (
                Self::get_config_path()
                    .filter(|path| path.exists())
                    .unwrap_or_else(|| PathBuf::from("config.toml")),
                false,
            ),
        };

        if required || config_file.exists() {
            builder = builder.add_source(
                File::from(config_file)
                    .required(required)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHERBOT__WEATHER__BASE_URL=... overrides weather.base_url
        builder = builder.add_source(
            Environment::with_prefix("WEATHERBOT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: BotConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherbot").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_api_timeout();
        }
        if self.geocoding.result_count == 0 {
            self.geocoding.result_count = default_result_count();
        }
        if self.geocoding.language.is_empty() {
            self.geocoding.language = default_language();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_api_timeout();
        }
        if self.imagery.timeout_seconds == 0 {
            self.imagery.timeout_seconds = default_imagery_timeout();
        }
        if self.imagery.accepted_content_types.is_empty() {
            self.imagery.accepted_content_types = default_accepted_content_types();
        }
        if self.transport.listen_addr.is_empty() {
            self.transport.listen_addr = default_listen_addr();
        }
        if self.transport.request_timeout_seconds == 0 {
            self.transport.request_timeout_seconds = default_request_timeout();
        }
        if self.transport.attachments_dir.is_empty() {
            self.transport.attachments_dir = default_attachments_dir();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_urls()?;
        self.validate_regions()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
            ("Imagery", self.imagery.timeout_seconds),
            ("Transport request", self.transport.request_timeout_seconds),
        ];
        for (name, timeout) in timeouts {
            if timeout == 0 || timeout > MAX_TIMEOUT_SECONDS {
                return Err(BotError::config(format!(
                    "{name} timeout must be between 1 and {MAX_TIMEOUT_SECONDS} seconds"
                ))
                .into());
            }
        }

        let retries = [
            ("Geocoding", self.geocoding.max_retries),
            ("Weather", self.weather.max_retries),
            ("Imagery", self.imagery.max_retries),
        ];
        for (name, max_retries) in retries {
            if max_retries > MAX_RETRIES {
                return Err(BotError::config(format!(
                    "{name} max retries cannot exceed {MAX_RETRIES}"
                ))
                .into());
            }
        }

        if self.geocoding.result_count == 0 || self.geocoding.result_count > 100 {
            return Err(
                BotError::config("Geocoding result count must be between 1 and 100").into(),
            );
        }

        if self.weather.forecast_hours > 48 {
            return Err(BotError::config("Forecast hours cannot exceed 48").into());
        }

        Ok(())
    }

    fn validate_urls(&self) -> Result<()> {
        let mut urls = vec![
            ("Geocoding API base URL", self.geocoding.base_url.as_str()),
            ("Weather API base URL", self.weather.base_url.as_str()),
        ];
        for region in &self.imagery.regions {
            urls.push(("Region image URL", region.image_url.as_str()));
        }
        if let Some(callback_url) = &self.transport.callback_url {
            urls.push(("Transport callback URL", callback_url.as_str()));
        }

        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BotError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }
        Ok(())
    }

    fn validate_regions(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for region in &self.imagery.regions {
            region.validate()?;
            if !seen.insert(region.id.as_str()) {
                return Err(
                    BotError::config(format!("Duplicate region id '{}'", region.id)).into(),
                );
            }
        }
        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(BotError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(BotError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.transport.kind == TransportKind::Webhook && self.transport.callback_url.is_none()
        {
            return Err(
                BotError::config("Webhook transport requires transport.callback_url").into(),
            );
        }

        if self.imagery.accepted_content_types.iter().any(|ct| !ct.starts_with("image/")) {
            return Err(
                BotError::config("Accepted content types must all be image/* types").into(),
            );
        }

        Ok(())
    }
}
