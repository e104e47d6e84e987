//! Alert aggregation over forecast hour slices and series

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AlertConfig;
use crate::models::{ForecastPoint, ForecastSeries};
use crate::scoring::risk::{GOOD_FLYING_THRESHOLD, HIGH_AQI_THRESHOLD, MODERATE_AQI_THRESHOLD};
use crate::scoring::{AviationTier, RiskLevel};

/// Hour offsets checked for series-level forecast alerts
pub const ALERT_HORIZONS: [u8; 5] = [1, 6, 12, 24, 47];

/// Hazard flag thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Dust in µg/m³ above which a flag is raised
    pub dust: f64,
    /// Wind in m/s above which a flag is raised
    pub wind: f64,
    /// Visibility in km below which a flag is raised
    pub visibility: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::from(&AlertConfig::default())
    }
}

impl From<&AlertConfig> for AlertThresholds {
    fn from(config: &AlertConfig) -> Self {
        Self {
            dust: config.dust_threshold,
            wind: config.wind_threshold,
            visibility: config.visibility_threshold,
        }
    }
}

/// Kind of supplementary hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    HighDust,
    HighWind,
    LowVisibility,
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardKind::HighDust => write!(f, "High dust"),
            HazardKind::HighWind => write!(f, "High wind"),
            HazardKind::LowVisibility => write!(f, "Low visibility"),
        }
    }
}

/// Per-location hazard warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardFlag {
    pub location: String,
    pub kind: HazardKind,
    pub value: f64,
    pub threshold: f64,
}

impl HazardFlag {
    #[must_use]
    pub fn message(&self) -> String {
        let unit = match self.kind {
            HazardKind::HighDust => "µg/m³",
            HazardKind::HighWind => "m/s",
            HazardKind::LowVisibility => "km",
        };
        format!(
            "{}: {} {:.1} {unit} (threshold {:.1})",
            self.location, self.kind, self.value, self.threshold
        )
    }
}

/// Metric that pushed a point out of the GOOD classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", content = "value", rename_all = "snake_case")]
pub enum Trigger {
    Aqi(u16),
    SafetyScore(f64),
    /// No safety score could be computed
    SafetyUnavailable,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Aqi(aqi) => write!(f, "AQI {aqi}"),
            Trigger::SafetyScore(score) => write!(f, "safety {score:.2}"),
            Trigger::SafetyUnavailable => write!(f, "safety unknown"),
        }
    }
}

/// Detail line for a location not classified GOOD on both axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDetail {
    pub location: String,
    pub risk: RiskLevel,
    pub aviation_tier: AviationTier,
    pub triggers: Vec<Trigger>,
}

impl AlertDetail {
    fn from_point(point: &ForecastPoint) -> Option<Self> {
        let risk = point.risk();
        let aviation_tier = point.aviation_tier();
        if risk == RiskLevel::Good && aviation_tier == AviationTier::Good {
            return None;
        }

        let mut triggers = Vec::new();
        if let Some(aqi) = point.aqi().filter(|a| *a > MODERATE_AQI_THRESHOLD) {
            triggers.push(Trigger::Aqi(aqi));
        }
        match point.safety_score() {
            Some(score) if score < GOOD_FLYING_THRESHOLD => triggers.push(Trigger::SafetyScore(score)),
            None => triggers.push(Trigger::SafetyUnavailable),
            Some(_) => {}
        }

        Some(Self {
            location: point.location().name.clone(),
            risk,
            aviation_tier,
            triggers,
        })
    }

    /// One-line summary, e.g. `Muscat: HIGH / NO-FLY (AQI 156, safety 0.31)`
    #[must_use]
    pub fn line(&self) -> String {
        let triggers: Vec<String> = self.triggers.iter().map(ToString::to_string).collect();
        format!(
            "{}: {} / {} ({})",
            self.location,
            self.risk,
            self.aviation_tier,
            triggers.join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskCounts {
    pub good: usize,
    pub moderate: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierCounts {
    pub good: usize,
    pub caution: usize,
    pub no_fly: usize,
}

/// Overall state of an hour slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Every location GOOD on both axes and no hazard flags
    AllNormal,
    Active,
}

/// Alerts for all locations at one hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourAlertSummary {
    pub hour_offset: Option<u8>,
    pub status: AlertStatus,
    pub risk_counts: RiskCounts,
    pub tier_counts: TierCounts,
    pub details: Vec<AlertDetail>,
    pub hazards: Vec<HazardFlag>,
}

impl HourAlertSummary {
    #[must_use]
    pub fn is_all_normal(&self) -> bool {
        self.status == AlertStatus::AllNormal
    }
}

/// Aggregate one hour slice (one point per location)
#[must_use]
pub fn aggregate_hour(points: &[&ForecastPoint], thresholds: &AlertThresholds) -> HourAlertSummary {
    let mut risk_counts = RiskCounts::default();
    let mut tier_counts = TierCounts::default();
    let mut details = Vec::new();
    let mut hazards = Vec::new();

    for point in points {
        match point.risk() {
            RiskLevel::Good => risk_counts.good += 1,
            RiskLevel::Moderate => risk_counts.moderate += 1,
            RiskLevel::High => risk_counts.high += 1,
        }
        match point.aviation_tier() {
            AviationTier::Good => tier_counts.good += 1,
            AviationTier::Caution => tier_counts.caution += 1,
            AviationTier::NoFly => tier_counts.no_fly += 1,
        }
        details.extend(AlertDetail::from_point(point));
        hazards.extend(hazard_flags(point, thresholds));
    }

    let status = if details.is_empty() && hazards.is_empty() {
        AlertStatus::AllNormal
    } else {
        AlertStatus::Active
    };

    HourAlertSummary {
        hour_offset: points.first().map(|p| p.hour_offset()),
        status,
        risk_counts,
        tier_counts,
        details,
        hazards,
    }
}

/// Hazard flags for a single point
#[must_use]
pub fn hazard_flags(point: &ForecastPoint, thresholds: &AlertThresholds) -> Vec<HazardFlag> {
    let location = &point.location().name;
    let flag = |kind, value, threshold| HazardFlag {
        location: location.clone(),
        kind,
        value,
        threshold,
    };

    let mut flags = Vec::new();
    if let Some(dust) = point.reading().dust.filter(|d| *d > thresholds.dust) {
        flags.push(flag(HazardKind::HighDust, dust, thresholds.dust));
    }
    let wind = point.weather().wind_speed;
    if wind > thresholds.wind {
        flags.push(flag(HazardKind::HighWind, wind, thresholds.wind));
    }
    let visibility = point.visibility_km();
    if visibility < thresholds.visibility {
        flags.push(flag(HazardKind::LowVisibility, visibility, thresholds.visibility));
    }
    flags
}

/// Air quality alert at one forecast horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAlert {
    pub location: String,
    pub hour_offset: u8,
    pub timestamp: DateTime<Utc>,
    pub level: RiskLevel,
    pub aqi: u16,
    pub message: String,
}

/// AQI alerts at the [`ALERT_HORIZONS`] of a series: HIGH above 150,
/// MODERATE above 100
#[must_use]
pub fn series_alerts(series: &ForecastSeries) -> Vec<ForecastAlert> {
    ALERT_HORIZONS
        .iter()
        .filter_map(|h| series.point(*h))
        .filter_map(|point| {
            let aqi = point.aqi()?;
            let (level, label) = if aqi > HIGH_AQI_THRESHOLD {
                (RiskLevel::High, "Unhealthy")
            } else if aqi > MODERATE_AQI_THRESHOLD {
                (RiskLevel::Moderate, "Moderate")
            } else {
                return None;
            };
            Some(ForecastAlert {
                location: point.location().name.clone(),
                hour_offset: point.hour_offset(),
                timestamp: point.timestamp(),
                level,
                aqi,
                message: format!(
                    "{label} air quality predicted in {}h at {} (AQI: {aqi})",
                    point.hour_offset(),
                    point.location().name
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PollutantReading, Provenance, WeatherState, align_origin};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn origin() -> DateTime<Utc> {
        align_origin(Utc.with_ymd_and_hms(2026, 2, 3, 8, 0, 0).unwrap())
    }

    fn point(location: usize, h: u8, reading: PollutantReading, wind: f64) -> ForecastPoint {
        let location = Arc::new(Location::presets().remove(location));
        let weather = WeatherState {
            wind_speed: wind,
            ..WeatherState::default()
        };
        ForecastPoint::new(location, origin(), h, weather, reading, 0.9, Provenance::Model).unwrap()
    }

    fn clean() -> PollutantReading {
        PollutantReading::new(Some(15.0), Some(30.0), Some(50.0))
    }

    fn polluted() -> PollutantReading {
        PollutantReading::new(Some(65.0), Some(120.0), Some(150.0))
    }

    #[test]
    fn test_all_normal_slice() {
        let a = point(0, 4, clean(), 10.0);
        let b = point(1, 4, clean(), 8.0);
        let summary = aggregate_hour(&[&a, &b], &AlertThresholds::default());

        assert!(summary.is_all_normal());
        assert_eq!(summary.hour_offset, Some(4));
        assert_eq!(summary.risk_counts.good, 2);
        assert_eq!(summary.tier_counts.good, 2);
        assert!(summary.details.is_empty());
        assert!(summary.hazards.is_empty());
    }

    #[test]
    fn test_empty_slice_is_all_normal() {
        let summary = aggregate_hour(&[], &AlertThresholds::default());
        assert!(summary.is_all_normal());
        assert_eq!(summary.hour_offset, None);
    }

    #[test]
    fn test_polluted_location_is_detailed_and_flagged() {
        let good = point(0, 10, clean(), 10.0);
        let bad = point(1, 10, polluted(), 30.0);
        let summary = aggregate_hour(&[&good, &bad], &AlertThresholds::default());

        assert_eq!(summary.status, AlertStatus::Active);
        assert_eq!(summary.risk_counts, RiskCounts { good: 1, moderate: 0, high: 1 });
        assert_eq!(summary.tier_counts, TierCounts { good: 1, caution: 0, no_fly: 1 });

        assert_eq!(summary.details.len(), 1);
        let detail = &summary.details[0];
        assert_eq!(detail.location, "Salalah");
        assert_eq!(detail.triggers[0], Trigger::Aqi(156));
        assert!(matches!(detail.triggers[1], Trigger::SafetyScore(s) if s < 0.40));
        assert!(detail.line().starts_with("Salalah: HIGH / NO-FLY (AQI 156, safety 0.3"));

        let kinds: Vec<HazardKind> = summary.hazards.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, vec![HazardKind::HighDust, HazardKind::HighWind]);
        assert!(summary.hazards[0].message().contains("Salalah"));
    }

    #[test]
    fn test_low_visibility_flag() {
        let smog = point(0, 0, PollutantReading::new(Some(400.0), Some(500.0), Some(90.0)), 3.0);
        let flags = hazard_flags(&smog, &AlertThresholds::default());
        assert!(flags.iter().any(|f| f.kind == HazardKind::LowVisibility));
    }

    #[test]
    fn test_series_alert_levels() {
        let location = Arc::new(Location::presets().remove(0));
        let points = (0..48)
            .map(|h| {
                let reading = match h {
                    1 => polluted(),
                    6 => PollutantReading::new(Some(40.0), Some(60.0), Some(50.0)),
                    _ => clean(),
                };
                ForecastPoint::new(
                    Arc::clone(&location),
                    origin(),
                    h,
                    WeatherState::default(),
                    reading,
                    0.9,
                    Provenance::Model,
                )
                .unwrap()
            })
            .collect();
        let series = ForecastSeries::new(location, origin(), points).unwrap();
        let alerts = series_alerts(&series);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].hour_offset, 1);
        assert_eq!(alerts[0].level, RiskLevel::High);
        assert_eq!(alerts[1].hour_offset, 6);
        assert_eq!(alerts[1].level, RiskLevel::Moderate);
        assert!(alerts[1].message.contains("in 6h"));
    }
}
