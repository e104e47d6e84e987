//! Forecast orchestration
//!
//! One refresh evaluates every location at every hour offset 0..48. Each
//! point gets its own RNG seeded from the run seed, the location and the
//! hour, so points can be evaluated concurrently in any order and a fixed
//! seed reproduces the run. Prediction failures never abort a refresh; the
//! point falls back to the local formula and is marked as such.

use chrono::{DateTime, Datelike, Duration, Utc};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

use super::predictor::{PollutantPredictor, PredictedPollutants, PredictionRequest, fallback_reading};
use super::{dust, point_seed, weather_evolution};
use crate::config::SkySafeConfig;
use crate::error::CollaboratorError;
use crate::models::{
    ForecastPoint, ForecastRun, ForecastSeries, HORIZON_HOURS, Location, Provenance, WeatherOutlook, WeatherState,
    align_origin,
};
use crate::weather::WeatherSource;

/// Confidence at hour offset `h`: `max(floor, 1 - decay * h)`, kept within
/// [0, 1] whatever the settings
#[must_use]
pub fn confidence(h: u8, floor: f64, decay: f64) -> f64 {
    (1.0 - decay * f64::from(h)).max(floor).clamp(0.0, 1.0)
}

/// Tunables of a refresh
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub confidence_floor: f64,
    pub confidence_decay: f64,
    /// Upper bound on points evaluated at once
    pub max_concurrency: usize,
    /// Budget for one prediction call
    pub prediction_timeout: std::time::Duration,
    pub seed: u64,
    /// Fallback share above which a series is degraded
    pub degraded_fallback_ratio: f64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&SkySafeConfig::default())
    }
}

impl From<&SkySafeConfig> for OrchestratorSettings {
    fn from(config: &SkySafeConfig) -> Self {
        Self {
            confidence_floor: config.forecast.confidence_floor,
            confidence_decay: config.forecast.confidence_decay,
            max_concurrency: config.forecast.max_concurrency,
            prediction_timeout: std::time::Duration::from_millis(config.prediction.timeout_ms),
            seed: config.forecast.seed,
            degraded_fallback_ratio: config.alerts.degraded_fallback_ratio,
        }
    }
}

/// Drives weather evolution, dust estimation, prediction and scoring for
/// every location and hour
pub struct ForecastOrchestrator {
    predictor: Arc<dyn PollutantPredictor>,
    weather: Arc<dyn WeatherSource>,
    settings: OrchestratorSettings,
}

impl ForecastOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        predictor: Arc<dyn PollutantPredictor>,
        weather: Arc<dyn WeatherSource>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            predictor,
            weather,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Compute a complete run for `locations`.
    ///
    /// `baseline` is aligned down to midnight UTC and becomes the run origin.
    /// Every location gets exactly 48 points whatever the collaborators do.
    #[instrument(skip_all, fields(locations = locations.len(), predictor = self.predictor.name()))]
    pub async fn refresh(&self, locations: &[Location], baseline: DateTime<Utc>) -> crate::Result<ForecastRun> {
        let origin = align_origin(baseline);
        info!("Starting forecast refresh from {}", origin.to_rfc3339());

        let locations: Vec<Arc<Location>> = locations.iter().cloned().map(Arc::new).collect();
        let outlooks = join_all(locations.iter().map(|location| self.outlook(location, origin))).await;

        let jobs = locations.iter().zip(&outlooks).flat_map(|(location, outlook)| {
            (0..HORIZON_HOURS).map(move |h| (location, outlook, h))
        });
        let results: Vec<crate::Result<ForecastPoint>> = stream::iter(jobs)
            .map(|(location, outlook, h)| self.forecast_point(Arc::clone(location), outlook, origin, h))
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;
        let points = results.into_iter().collect::<crate::Result<Vec<_>>>()?;

        let mut points = points.into_iter();
        let mut series = Vec::with_capacity(locations.len());
        for location in locations {
            let chunk: Vec<ForecastPoint> = points.by_ref().take(usize::from(HORIZON_HOURS)).collect();
            series.push(ForecastSeries::new(location, origin, chunk)?);
        }

        let run = ForecastRun::new(origin, series, self.settings.degraded_fallback_ratio);
        let fallbacks: usize = run.series().iter().map(ForecastSeries::fallback_count).sum();
        info!(
            "Forecast refresh complete: {} points, {} from fallback",
            run.point_count(),
            fallbacks
        );
        for name in run.degraded_series() {
            warn!("Forecast series for {} is degraded (mostly fallback)", name);
        }
        Ok(run)
    }

    async fn outlook(&self, location: &Location, origin: DateTime<Utc>) -> WeatherOutlook {
        match self.weather.current_and_forecast(location, origin).await {
            Ok(outlook) => {
                debug!(
                    "Weather outlook for {}: {} samples up to +{}h",
                    location.name,
                    outlook.samples.len(),
                    outlook.horizon()
                );
                outlook
            }
            Err(err) => {
                warn!(
                    "Weather source unavailable for {}: {}; modelling from defaults",
                    location.name, err
                );
                WeatherOutlook::current_only(WeatherState::default())
            }
        }
    }

    /// Evaluate one location at hour offset `h`
    pub async fn forecast_point(
        &self,
        location: Arc<Location>,
        outlook: &WeatherOutlook,
        origin: DateTime<Utc>,
        h: u8,
    ) -> crate::Result<ForecastPoint> {
        let mut rng = StdRng::seed_from_u64(point_seed(self.settings.seed, &location.name, u64::from(h)));
        let timestamp = origin + Duration::hours(i64::from(h));
        let hour_of_day = h % 24;

        let weather = weather_evolution::evolve(outlook, h, &mut rng);
        let dust = dust::estimate_dust(&weather, location.baseline.dust, timestamp.month(), &mut rng);

        let request = PredictionRequest {
            location: Location::clone(&location),
            hour_of_day,
            timestamp,
            weather,
            dust,
            baseline_pm25: location.baseline.pm25,
        };

        let (reading, provenance) = match self.predict(&request).await {
            Ok(predicted) => (predicted.into_reading(dust), Provenance::Model),
            Err(err) => {
                warn!(
                    "Prediction for {} at +{}h failed ({}), using fallback",
                    location.name, h, err
                );
                (
                    fallback_reading(location.baseline.pm25, hour_of_day, dust, &mut rng),
                    Provenance::Fallback,
                )
            }
        };

        let confidence = confidence(h, self.settings.confidence_floor, self.settings.confidence_decay);
        ForecastPoint::new(location, origin, h, weather, reading, confidence, provenance)
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictedPollutants, CollaboratorError> {
        let budget = self.settings.prediction_timeout;
        match tokio::time::timeout(budget, self.predictor.predict(request)).await {
            Ok(result) => result.and_then(PredictedPollutants::validate),
            Err(_) => Err(CollaboratorError::Timeout(
                u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

/// Shared access to the latest published run.
///
/// Readers get an `Arc` to a complete run; `publish` replaces the whole run
/// in one swap, so a reader never sees a mix of two refreshes.
#[derive(Debug, Clone, Default)]
pub struct ForecastHandle {
    current: Arc<RwLock<Option<Arc<ForecastRun>>>>,
}

impl ForecastHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current run, returning the newly published one
    pub fn publish(&self, run: ForecastRun) -> Arc<ForecastRun> {
        let run = Arc::new(run);
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::clone(&run));
        run
    }

    /// Latest published run, if any
    #[must_use]
    pub fn current(&self) -> Option<Arc<ForecastRun>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
