//! AQI calculation from particulate concentrations
//!
//! Piecewise-linear interpolation over the US EPA breakpoint tables. The
//! index for a concentration `Cp` in bracket `(Clow, Chigh, Ilow, Ihigh)` is
//!
//! ```text
//! AQI = round((Ihigh - Ilow) / (Chigh - Clow) * (Cp - Clow) + Ilow)
//! ```
//!
//! Concentrations above the last row are clamped to that row's `Chigh`, so
//! the index saturates at 500.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Particulate fraction an index is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollutantKind {
    Pm25,
    Pm10,
}

/// One row of a breakpoint table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: u16,
    pub i_high: u16,
}

const fn bp(c_low: f64, c_high: f64, i_low: u16, i_high: u16) -> Breakpoint {
    Breakpoint {
        c_low,
        c_high,
        i_low,
        i_high,
    }
}

/// PM2.5 breakpoints (24-hour, µg/m³)
pub const PM25_BREAKPOINTS: [Breakpoint; 7] = [
    bp(0.0, 12.0, 0, 50),
    bp(12.1, 35.4, 51, 100),
    bp(35.5, 55.4, 101, 150),
    bp(55.5, 150.4, 151, 200),
    bp(150.5, 250.4, 201, 300),
    bp(250.5, 350.4, 301, 400),
    bp(350.5, 500.4, 401, 500),
];

/// PM10 breakpoints (24-hour, µg/m³)
pub const PM10_BREAKPOINTS: [Breakpoint; 7] = [
    bp(0.0, 54.0, 0, 50),
    bp(55.0, 154.0, 51, 100),
    bp(155.0, 254.0, 101, 150),
    bp(255.0, 354.0, 151, 200),
    bp(355.0, 424.0, 201, 300),
    bp(425.0, 504.0, 301, 400),
    bp(505.0, 604.0, 401, 500),
];

/// Upper bound of the index scale
pub const AQI_MAX: u16 = 500;

impl PollutantKind {
    /// Breakpoint table for this pollutant
    #[must_use]
    pub fn breakpoints(self) -> &'static [Breakpoint] {
        match self {
            PollutantKind::Pm25 => &PM25_BREAKPOINTS,
            PollutantKind::Pm10 => &PM10_BREAKPOINTS,
        }
    }

    /// Truncate to the table's reporting resolution (0.1 for PM2.5, 1 for PM10).
    ///
    /// Values falling between two rows land in the lower row, which keeps the
    /// index monotonic in concentration.
    fn truncate(self, concentration: f64) -> f64 {
        let scale = match self {
            PollutantKind::Pm25 => 10.0,
            PollutantKind::Pm10 => 1.0,
        };
        (concentration * scale + 1e-9).floor() / scale
    }
}

impl fmt::Display for PollutantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollutantKind::Pm25 => write!(f, "PM2.5"),
            PollutantKind::Pm10 => write!(f, "PM10"),
        }
    }
}

/// Calculate the AQI for one pollutant.
///
/// Returns `None` for missing, negative or non-finite concentrations.
///
/// # Examples
///
/// ```
/// use skysafe::scoring::aqi::{calculate_aqi, PollutantKind};
///
/// assert_eq!(calculate_aqi(Some(12.0), PollutantKind::Pm25), Some(50));
/// assert_eq!(calculate_aqi(Some(12.1), PollutantKind::Pm25), Some(51));
/// assert_eq!(calculate_aqi(Some(-1.0), PollutantKind::Pm25), None);
/// ```
#[must_use]
pub fn calculate_aqi(concentration: Option<f64>, kind: PollutantKind) -> Option<u16> {
    let cp = concentration.filter(|c| c.is_finite() && *c >= 0.0)?;
    let table = kind.breakpoints();
    let last = table[table.len() - 1];
    let cp = kind.truncate(cp).min(last.c_high);

    let row = table
        .iter()
        .find(|row| cp >= row.c_low && cp <= row.c_high)
        .or_else(|| table.iter().rev().find(|row| cp >= row.c_low))
        .copied()
        .unwrap_or(last);

    let slope = f64::from(row.i_high - row.i_low) / (row.c_high - row.c_low);
    let index = slope * (cp - row.c_low) + f64::from(row.i_low);
    Some((index.round() as u16).min(AQI_MAX))
}

/// Overall AQI: the larger of the two indices, ignoring a missing one
#[must_use]
pub fn overall_aqi(pm25: Option<f64>, pm10: Option<f64>) -> Option<u16> {
    let a = calculate_aqi(pm25, PollutantKind::Pm25);
    let b = calculate_aqi(pm10, PollutantKind::Pm10);
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// EPA health category for an index value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Category for an AQI value
    #[must_use]
    pub fn from_aqi(aqi: u16) -> Self {
        match aqi {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    /// EPA colour name
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "green",
            AqiCategory::Moderate => "yellow",
            AqiCategory::UnhealthyForSensitiveGroups => "orange",
            AqiCategory::Unhealthy => "red",
            AqiCategory::VeryUnhealthy => "purple",
            AqiCategory::Hazardous => "maroon",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AqiCategory::Good => write!(f, "Good"),
            AqiCategory::Moderate => write!(f, "Moderate"),
            AqiCategory::UnhealthyForSensitiveGroups => write!(f, "Unhealthy for Sensitive Groups"),
            AqiCategory::Unhealthy => write!(f, "Unhealthy"),
            AqiCategory::VeryUnhealthy => write!(f, "Very Unhealthy"),
            AqiCategory::Hazardous => write!(f, "Hazardous"),
        }
    }
}
