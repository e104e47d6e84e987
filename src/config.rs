//! Configuration management for `SkySafe`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SkySafeError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `SkySafe`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkySafeConfig {
    /// Forecast engine settings
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Pollutant prediction service settings
    #[serde(default)]
    pub prediction: PredictionConfig,
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Alert thresholds
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Forecast engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Lowest confidence any point can have
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Confidence lost per hour offset
    #[serde(default = "default_confidence_decay")]
    pub confidence_decay: f64,
    /// Maximum points evaluated concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Seed for all random perturbations of a run
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Pollutant prediction service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// HTTP endpoint of the prediction service; the in-process pattern
    /// predictor is used when unset
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Budget for a single prediction call in milliseconds
    #[serde(default = "default_prediction_timeout")]
    pub timeout_ms: u64,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Query the weather API at all
    #[serde(default = "default_weather_enabled")]
    pub enabled: bool,
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
}

/// Alert thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Dust above this (µg/m³) raises a hazard flag
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: f64,
    /// Wind above this (m/s) raises a hazard flag
    #[serde(default = "default_wind_threshold")]
    pub wind_threshold: f64,
    /// Visibility below this (km) raises a hazard flag
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,
    /// Fallback share above which a series is reported degraded
    #[serde(default = "default_degraded_fallback_ratio")]
    pub degraded_fallback_ratio: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_confidence_floor() -> f64 {
    0.55
}

fn default_confidence_decay() -> f64 {
    0.01
}

fn default_max_concurrency() -> usize {
    16
}

fn default_seed() -> u64 {
    42
}

fn default_prediction_timeout() -> u64 {
    2000
}

fn default_weather_enabled() -> bool {
    true
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_dust_threshold() -> f64 {
    80.0
}

fn default_wind_threshold() -> f64 {
    15.0
}

fn default_visibility_threshold() -> f64 {
    5.0
}

fn default_degraded_fallback_ratio() -> f64 {
    0.5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            confidence_floor: default_confidence_floor(),
            confidence_decay: default_confidence_decay(),
            max_concurrency: default_max_concurrency(),
            seed: default_seed(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_prediction_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: default_weather_enabled(),
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            dust_threshold: default_dust_threshold(),
            wind_threshold: default_wind_threshold(),
            visibility_threshold: default_visibility_threshold(),
            degraded_fallback_ratio: default_degraded_fallback_ratio(),
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

impl SkySafeConfig {
    /// Load configuration from `config_path`, or the default location when
    /// `None`, then apply environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SKYSAFE_FORECAST__SEED=7 overrides forecast.seed
        builder = builder.add_source(
            Environment::with_prefix("SKYSAFE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: SkySafeConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skysafe").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_forecast()?;
        self.validate_services()?;
        self.validate_alerts()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_forecast(&self) -> Result<()> {
        let forecast = &self.forecast;
        if !(0.5..=0.6).contains(&forecast.confidence_floor) {
            return Err(SkySafeError::config(format!(
                "Confidence floor {} must be between 0.5 and 0.6",
                forecast.confidence_floor
            ))
            .into());
        }

        if !(0.008..=0.02).contains(&forecast.confidence_decay) {
            return Err(SkySafeError::config(format!(
                "Confidence decay {} must be between 0.008 and 0.02",
                forecast.confidence_decay
            ))
            .into());
        }

        if forecast.max_concurrency == 0 || forecast.max_concurrency > 256 {
            return Err(SkySafeError::config("Max concurrency must be between 1 and 256").into());
        }

        Ok(())
    }

    fn validate_services(&self) -> Result<()> {
        if self.prediction.timeout_ms == 0 || self.prediction.timeout_ms > 60_000 {
            return Err(SkySafeError::config("Prediction timeout must be between 1 and 60000 ms").into());
        }

        if let Some(endpoint) = &self.prediction.endpoint {
            if !is_http_url(endpoint) {
                return Err(SkySafeError::config(
                    "Prediction endpoint must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
        }

        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(SkySafeError::config("Weather API timeout must be between 1 and 300 seconds").into());
        }

        if self.weather.max_retries > 10 {
            return Err(SkySafeError::config("Weather API max retries cannot exceed 10").into());
        }

        if !is_http_url(&self.weather.base_url) {
            return Err(SkySafeError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }

    fn validate_alerts(&self) -> Result<()> {
        let alerts = &self.alerts;
        let thresholds = [
            ("dust_threshold", alerts.dust_threshold),
            ("wind_threshold", alerts.wind_threshold),
            ("visibility_threshold", alerts.visibility_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(SkySafeError::config(format!("Alert {name} must be a non-negative number")).into());
            }
        }

        if !(0.0..=1.0).contains(&alerts.degraded_fallback_ratio) {
            return Err(SkySafeError::config("Degraded fallback ratio must be between 0 and 1").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SkySafeError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SkySafeError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SkySafeConfig::default();
        assert_eq!(config.forecast.confidence_floor, 0.55);
        assert_eq!(config.forecast.confidence_decay, 0.01);
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.alerts.dust_threshold, 80.0);
        assert_eq!(config.alerts.degraded_fallback_ratio, 0.5);
        assert_eq!(config.logging.level, "info");
        assert!(config.prediction.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_confidence_ranges() {
        let mut config = SkySafeConfig::default();
        config.forecast.confidence_floor = 0.8;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Confidence floor"));

        let mut config = SkySafeConfig::default();
        config.forecast.confidence_decay = 0.05;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SkySafeConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_endpoint() {
        let mut config = SkySafeConfig::default();
        config.prediction.endpoint = Some("ftp://models".to_string());
        assert!(config.validate().is_err());

        config.prediction.endpoint = Some("http://localhost:5000/predict".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let path = env::temp_dir().join(format!("skysafe-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[forecast]\nseed = 7\nmax_concurrency = 4\n\n[alerts]\nwind_threshold = 12.5").unwrap();

        let config = SkySafeConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.forecast.seed, 7);
        assert_eq!(config.forecast.max_concurrency, 4);
        assert_eq!(config.forecast.confidence_floor, 0.55);
        assert_eq!(config.alerts.wind_threshold, 12.5);
        assert_eq!(config.alerts.dust_threshold, 80.0);
    }

    #[test]
    fn test_config_path_generation() {
        let path = SkySafeConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("skysafe"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
