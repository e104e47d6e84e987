//! Forecast points, per-location series and whole refresh runs
//!
//! All three are immutable once built. A new refresh produces a new
//! [`ForecastRun`]; nothing is patched in place.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::{Location, PollutantReading, SkyCondition, WeatherState};
use crate::SkySafeError;
use crate::scoring::{AqiCategory, Assessment, AviationIndicators, AviationTier, FlightSafetyAnalysis, RiskLevel};

/// Number of hourly points in every series
pub const HORIZON_HOURS: u8 = 48;

/// Align a baseline timestamp down to 00:00 UTC of its date
#[must_use]
pub fn align_origin(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Where a point's pollutant values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Prediction collaborator answered in time with a well-formed reading
    Model,
    /// Local fallback formula
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Model => write!(f, "model"),
            Provenance::Fallback => write!(f, "fallback"),
        }
    }
}

/// One location at one hour offset
#[derive(Debug, Clone)]
pub struct ForecastPoint {
    location: Arc<Location>,
    hour_offset: u8,
    timestamp: DateTime<Utc>,
    weather: WeatherState,
    reading: PollutantReading,
    assessment: Assessment,
    confidence: f64,
    provenance: Provenance,
}

impl ForecastPoint {
    /// Create a new point, deriving every metric from the weather and reading.
    ///
    /// `origin` must already be aligned with [`align_origin`].
    pub fn new(
        location: Arc<Location>,
        origin: DateTime<Utc>,
        hour_offset: u8,
        weather: WeatherState,
        reading: PollutantReading,
        confidence: f64,
        provenance: Provenance,
    ) -> crate::Result<Self> {
        if hour_offset >= HORIZON_HOURS {
            return Err(SkySafeError::validation(format!(
                "Hour offset {hour_offset} outside forecast horizon 0..{HORIZON_HOURS}"
            )));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SkySafeError::validation(format!(
                "Confidence {confidence} outside [0, 1]"
            )));
        }

        let weather = weather.at_offset(hour_offset);
        let assessment = Assessment::assess(&reading, &weather);

        Ok(Self {
            location,
            hour_offset,
            timestamp: origin + Duration::hours(i64::from(hour_offset)),
            weather,
            reading,
            assessment,
            confidence,
            provenance,
        })
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn hour_offset(&self) -> u8 {
        self.hour_offset
    }

    /// Forecast day, starting at 1
    #[must_use]
    pub fn day(&self) -> u8 {
        self.hour_offset / 24 + 1
    }

    #[must_use]
    pub fn hour_of_day(&self) -> u8 {
        self.hour_offset % 24
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn weather(&self) -> &WeatherState {
        &self.weather
    }

    #[must_use]
    pub fn reading(&self) -> &PollutantReading {
        &self.reading
    }

    #[must_use]
    pub fn visibility_km(&self) -> f64 {
        self.assessment.visibility_km
    }

    /// Overall AQI, absent when neither particulate value is usable
    #[must_use]
    pub fn aqi(&self) -> Option<u16> {
        self.assessment.aqi
    }

    #[must_use]
    pub fn category(&self) -> Option<AqiCategory> {
        self.assessment.category()
    }

    #[must_use]
    pub fn safety_score(&self) -> Option<f64> {
        self.assessment.safety_score()
    }

    #[must_use]
    pub fn safety(&self) -> &FlightSafetyAnalysis {
        &self.assessment.safety
    }

    #[must_use]
    pub fn indicators(&self) -> &AviationIndicators {
        &self.assessment.indicators
    }

    #[must_use]
    pub fn sky(&self) -> SkyCondition {
        self.assessment.sky
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Overall risk, computed from the current AQI and safety score
    #[must_use]
    pub fn risk(&self) -> RiskLevel {
        RiskLevel::classify(self.aqi(), self.safety_score())
    }

    /// Aviation tier, computed from the current safety score
    #[must_use]
    pub fn aviation_tier(&self) -> AviationTier {
        AviationTier::classify(self.safety_score())
    }

    /// Flat view for presentation consumers
    #[must_use]
    pub fn record(&self) -> PointRecord {
        PointRecord {
            location: self.location.name.clone(),
            region: self.location.region.clone(),
            latitude: self.location.latitude,
            longitude: self.location.longitude,
            hour_offset: self.hour_offset,
            day: self.day(),
            hour_of_day: self.hour_of_day(),
            timestamp: self.timestamp,
            temperature: self.weather.temperature,
            humidity: self.weather.humidity,
            wind_speed: self.weather.wind_speed,
            pressure: self.weather.pressure,
            pm25: self.reading.pm25,
            pm10: self.reading.pm10,
            dust: self.reading.dust,
            visibility_km: self.visibility_km(),
            aqi: self.aqi(),
            aqi_category: self.category(),
            safety_score: self.safety_score(),
            risk: self.risk(),
            aviation_tier: self.aviation_tier(),
            confidence: self.confidence,
            provenance: self.provenance,
            sky: self.sky(),
            turbulence_risk: self.indicators().turbulence_risk,
            air_density: self.indicators().air_density,
        }
    }
}

/// Serializable snapshot of a [`ForecastPoint`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub location: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub hour_offset: u8,
    pub day: u8,
    pub hour_of_day: u8,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub dust: Option<f64>,
    pub visibility_km: f64,
    pub aqi: Option<u16>,
    pub aqi_category: Option<AqiCategory>,
    pub safety_score: Option<f64>,
    pub risk: RiskLevel,
    pub aviation_tier: AviationTier,
    pub confidence: f64,
    pub provenance: Provenance,
    pub sky: SkyCondition,
    pub turbulence_risk: f64,
    pub air_density: f64,
}

/// The 48 hourly points of one location
#[derive(Debug, Clone)]
pub struct ForecastSeries {
    location: Arc<Location>,
    origin: DateTime<Utc>,
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Create a new series.
    ///
    /// Requires exactly [`HORIZON_HOURS`] points ordered by hour offset, all
    /// belonging to `location` and sharing `origin`.
    pub fn new(location: Arc<Location>, origin: DateTime<Utc>, points: Vec<ForecastPoint>) -> crate::Result<Self> {
        if points.len() != usize::from(HORIZON_HOURS) {
            return Err(SkySafeError::validation(format!(
                "Series for {} has {} points, expected {HORIZON_HOURS}",
                location.name,
                points.len()
            )));
        }
        let misplaced = points.iter().enumerate().find(|(i, p)| {
            usize::from(p.hour_offset) != *i
                || p.location.name != location.name
                || p.timestamp - Duration::hours(i64::from(p.hour_offset)) != origin
        });
        if let Some((i, _)) = misplaced {
            return Err(SkySafeError::validation(format!(
                "Series for {} has an inconsistent point at index {i}",
                location.name
            )));
        }

        Ok(Self {
            location,
            origin,
            points,
        })
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    #[must_use]
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Point at hour offset `h`
    #[must_use]
    pub fn point(&self, h: u8) -> Option<&ForecastPoint> {
        self.points.get(usize::from(h))
    }

    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.provenance == Provenance::Fallback)
            .count()
    }

    /// Share of points in [0, 1] that came from the fallback formula
    #[must_use]
    pub fn fallback_share(&self) -> f64 {
        self.fallback_count() as f64 / self.points.len() as f64
    }

    /// True when the fallback share exceeds `ratio`
    #[must_use]
    pub fn is_degraded(&self, ratio: f64) -> bool {
        self.fallback_share() > ratio
    }

    /// Highest AQI across the series
    #[must_use]
    pub fn peak_aqi(&self) -> Option<u16> {
        self.points.iter().filter_map(ForecastPoint::aqi).max()
    }

    #[must_use]
    pub fn records(&self) -> Vec<PointRecord> {
        self.points.iter().map(ForecastPoint::record).collect()
    }
}

/// Every series produced by one refresh
#[derive(Debug, Clone)]
pub struct ForecastRun {
    origin: DateTime<Utc>,
    generated_at: DateTime<Utc>,
    series: Vec<ForecastSeries>,
    degraded_ratio: f64,
}

impl ForecastRun {
    /// Create a new run; `degraded_ratio` is the fallback share above which a
    /// series counts as degraded
    #[must_use]
    pub fn new(origin: DateTime<Utc>, series: Vec<ForecastSeries>, degraded_ratio: f64) -> Self {
        Self {
            origin,
            generated_at: Utc::now(),
            series,
            degraded_ratio,
        }
    }

    #[must_use]
    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    #[must_use]
    pub fn series(&self) -> &[ForecastSeries] {
        &self.series
    }

    /// Series for a location name
    #[must_use]
    pub fn series_for(&self, name: &str) -> Option<&ForecastSeries> {
        self.series.iter().find(|s| s.location.name == name)
    }

    /// Points of every location at hour offset `h`, in location order
    #[must_use]
    pub fn hour_slice(&self, h: u8) -> Vec<&ForecastPoint> {
        self.series.iter().filter_map(|s| s.point(h)).collect()
    }

    /// Hour offset whose timestamp matches `at`, if within the horizon
    #[must_use]
    pub fn hour_at(&self, at: DateTime<Utc>) -> Option<u8> {
        if at < self.origin {
            return None;
        }
        u8::try_from((at - self.origin).num_hours())
            .ok()
            .filter(|h| *h < HORIZON_HOURS)
    }

    /// Names of series dominated by fallback points
    #[must_use]
    pub fn degraded_series(&self) -> Vec<&str> {
        self.series
            .iter()
            .filter(|s| s.is_degraded(self.degraded_ratio))
            .map(|s| s.location.name.as_str())
            .collect()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    #[must_use]
    pub fn records(&self) -> Vec<PointRecord> {
        self.series.iter().flat_map(ForecastSeries::records).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn origin() -> DateTime<Utc> {
        align_origin(Utc.with_ymd_and_hms(2026, 3, 14, 17, 42, 5).unwrap())
    }

    fn point(location: &Arc<Location>, h: u8, provenance: Provenance) -> ForecastPoint {
        ForecastPoint::new(
            Arc::clone(location),
            origin(),
            h,
            WeatherState::default(),
            PollutantReading::new(Some(15.0), Some(30.0), Some(50.0)),
            1.0 - f64::from(h) * 0.01,
            provenance,
        )
        .unwrap()
    }

    fn series(fallback_hours: u8) -> ForecastSeries {
        let location = Arc::new(Location::presets().remove(0));
        let points = (0..HORIZON_HOURS)
            .map(|h| {
                let provenance = if h < fallback_hours {
                    Provenance::Fallback
                } else {
                    Provenance::Model
                };
                point(&location, h, provenance)
            })
            .collect();
        ForecastSeries::new(location, origin(), points).unwrap()
    }

    #[test]
    fn test_align_origin() {
        let aligned = origin();
        assert_eq!(aligned, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(align_origin(aligned), aligned);
    }

    #[test]
    fn test_point_time_fields() {
        let location = Arc::new(Location::presets().remove(0));
        let p = point(&location, 37, Provenance::Model);
        assert_eq!(p.day(), 2);
        assert_eq!(p.hour_of_day(), 13);
        assert_eq!(p.timestamp().hour(), 13);
        assert_eq!(p.weather().hour_offset, 37);
    }

    #[test]
    fn test_point_rejects_out_of_horizon() {
        let location = Arc::new(Location::presets().remove(0));
        let result = ForecastPoint::new(
            location,
            origin(),
            48,
            WeatherState::default(),
            PollutantReading::default(),
            0.6,
            Provenance::Model,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_classification_follows_metrics() {
        let location = Arc::new(Location::presets().remove(0));
        let p = point(&location, 0, Provenance::Model);
        assert_eq!(p.aqi(), Some(57));
        assert_eq!(p.risk(), RiskLevel::Good);
        assert_eq!(p.aviation_tier(), AviationTier::Good);

        let record = p.record();
        assert_eq!(record.location, "Muscat");
        assert_eq!(record.risk, RiskLevel::Good);
        assert_eq!(record.aqi_category, Some(AqiCategory::Moderate));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["aviation_tier"], "GOOD");
        assert_eq!(json["provenance"], "model");
    }

    #[test]
    fn test_series_requires_full_horizon() {
        let location = Arc::new(Location::presets().remove(0));
        let points = (0..10).map(|h| point(&location, h, Provenance::Model)).collect();
        assert!(ForecastSeries::new(location, origin(), points).is_err());
    }

    #[test]
    fn test_series_rejects_out_of_order_points() {
        let location = Arc::new(Location::presets().remove(0));
        let mut points: Vec<_> = (0..HORIZON_HOURS)
            .map(|h| point(&location, h, Provenance::Model))
            .collect();
        points.swap(3, 4);
        assert!(ForecastSeries::new(location, origin(), points).is_err());
    }

    #[test]
    fn test_degraded_flag() {
        assert!(!series(24).is_degraded(0.5));
        assert!(series(25).is_degraded(0.5));
        assert_eq!(series(48).fallback_share(), 1.0);
    }

    #[test]
    fn test_run_hour_slice_and_lookup() {
        let run = ForecastRun::new(origin(), vec![series(0), series(30)], 0.5);
        assert_eq!(run.point_count(), 96);
        assert_eq!(run.hour_slice(5).len(), 2);
        assert!(run.hour_slice(48).is_empty());
        assert_eq!(run.degraded_series(), vec!["Muscat"]);
        assert!(run.series_for("Muscat").is_some());
        assert!(run.series_for("Nizwa").is_none());
        assert_eq!(run.hour_at(origin() + Duration::hours(30)), Some(30));
        assert_eq!(run.hour_at(origin() - Duration::hours(1)), None);
        assert_eq!(run.hour_at(origin() + Duration::hours(48)), None);
    }
}
