//! Pollutant concentration readings

use serde::{Deserialize, Serialize};

/// Default dust concentration in µg/m³ for records that omit it
pub const DEFAULT_DUST: f64 = 50.0;

/// Particulate concentrations in µg/m³.
///
/// A field is `None` when it was missing or invalid (negative, NaN, infinite).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct PollutantReading {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub dust: Option<f64>,
}

impl PollutantReading {
    /// Build a reading, dropping any invalid concentration
    #[must_use]
    pub fn new(pm25: Option<f64>, pm10: Option<f64>, dust: Option<f64>) -> Self {
        Self {
            pm25: sanitize(pm25),
            pm10: sanitize(pm10),
            dust: sanitize(dust),
        }
    }

    /// Dust concentration, or the documented default
    #[must_use]
    pub fn dust_or_default(&self) -> f64 {
        self.dust.unwrap_or(DEFAULT_DUST)
    }
}

/// Keep a concentration only if it is finite and non-negative
#[must_use]
pub fn sanitize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}
