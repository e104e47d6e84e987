//! `SkySafe` - Air quality and aviation flight-safety forecasting
//!
//! This library converts pollutant and weather readings into AQI and
//! flight-safety metrics, projects them across a 48-hour horizon with
//! decaying confidence, and classifies each location and hour for alerting.

pub mod alerts;
pub mod config;
pub mod error;
pub mod forecast;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod scoring;
pub mod weather;

// Re-export core types for public API
pub use alerts::{AlertThresholds, HourAlertSummary, aggregate_hour, series_alerts};
pub use config::SkySafeConfig;
pub use error::{CollaboratorError, SkySafeError};
pub use forecast::{ForecastHandle, ForecastOrchestrator, OrchestratorSettings, PatternPredictor, PollutantPredictor};
pub use models::{ForecastPoint, ForecastRun, ForecastSeries, Location, PollutantReading, WeatherState};
pub use scoring::{AviationTier, RiskLevel};
pub use weather::{NoWeatherSource, OpenMeteoClient, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SkySafeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
