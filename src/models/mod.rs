//! Data models for SkySafe
//!
//! Organized by concern:
//! - Location: monitoring sites, coordinates and pollution baselines
//! - Weather: weather state and sky conditions
//! - Pollutant: particulate and dust readings
//! - Forecast: forecast points, series and runs

pub mod forecast;
pub mod location;
pub mod pollutant;
pub mod weather;

pub use forecast::{
    ForecastPoint, ForecastRun, ForecastSeries, HORIZON_HOURS, PointRecord, Provenance, align_origin,
};
pub use location::{Location, PollutionBaseline};
pub use pollutant::PollutantReading;
pub use weather::{SkyCondition, WeatherOutlook, WeatherState};
