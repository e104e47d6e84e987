//! Risk and aviation tier classification
//!
//! Two independent classifications of the same point. Overall risk looks at
//! both air quality and flight safety, the aviation tier only at safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Safety score below which flying is not advised
pub const NO_FLY_THRESHOLD: f64 = 0.40;
/// Safety score from which conditions are good for flying
pub const GOOD_FLYING_THRESHOLD: f64 = 0.70;
/// Safety score below which overall risk is at least moderate
pub const MODERATE_SAFETY_THRESHOLD: f64 = 0.60;
/// AQI above which overall risk is high
pub const HIGH_AQI_THRESHOLD: u16 = 150;
/// AQI above which overall risk is at least moderate
pub const MODERATE_AQI_THRESHOLD: u16 = 100;

/// Overall health and operations risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Good,
    Moderate,
    High,
}

impl RiskLevel {
    /// Classify from AQI and safety score.
    ///
    /// HIGH if AQI > 150 or safety < 0.40, else MODERATE if AQI > 100 or
    /// safety < 0.60, else GOOD. A missing value never triggers its
    /// condition.
    #[must_use]
    pub fn classify(aqi: Option<u16>, safety: Option<f64>) -> Self {
        let aqi_above = |limit: u16| aqi.is_some_and(|a| a > limit);
        let safety_below = |limit: f64| safety.is_some_and(|s| s < limit);

        if aqi_above(HIGH_AQI_THRESHOLD) || safety_below(NO_FLY_THRESHOLD) {
            RiskLevel::High
        } else if aqi_above(MODERATE_AQI_THRESHOLD) || safety_below(MODERATE_SAFETY_THRESHOLD) {
            RiskLevel::Moderate
        } else {
            RiskLevel::Good
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Good => write!(f, "GOOD"),
            RiskLevel::Moderate => write!(f, "MODERATE"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Flying recommendation derived from the safety score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AviationTier {
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "CAUTION")]
    Caution,
    #[serde(rename = "NO-FLY")]
    NoFly,
}

impl AviationTier {
    /// Classify from the safety score; an unknown score is treated as CAUTION
    #[must_use]
    pub fn classify(safety: Option<f64>) -> Self {
        match safety {
            Some(s) if s < NO_FLY_THRESHOLD => AviationTier::NoFly,
            Some(s) if s >= GOOD_FLYING_THRESHOLD => AviationTier::Good,
            _ => AviationTier::Caution,
        }
    }

    /// Short advice for display
    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            AviationTier::Good => "Safe for flight operations",
            AviationTier::Caution => "Exercise caution during flight operations",
            AviationTier::NoFly => "Flight operations not recommended",
        }
    }
}

impl fmt::Display for AviationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AviationTier::Good => write!(f, "GOOD"),
            AviationTier::Caution => write!(f, "CAUTION"),
            AviationTier::NoFly => write!(f, "NO-FLY"),
        }
    }
}
