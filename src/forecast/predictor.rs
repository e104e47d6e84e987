//! Pollutant prediction collaborators and the local fallback formula

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use rand::RngExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Duration;
use tracing::{debug, instrument};

use super::point_seed;
use crate::error::CollaboratorError;
use crate::models::{Location, PollutantReading, WeatherState};
use crate::SkySafeError;

/// Input to one pollutant prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub location: Location,
    pub hour_of_day: u8,
    pub timestamp: DateTime<Utc>,
    pub weather: WeatherState,
    /// Estimated dust in µg/m³
    pub dust: f64,
    /// Location baseline PM2.5 in µg/m³
    pub baseline_pm25: f64,
}

/// Predicted particulate concentrations in µg/m³
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedPollutants {
    pub pm25: f64,
    pub pm10: f64,
}

impl PredictedPollutants {
    /// Reject negative or non-finite values
    pub fn validate(self) -> Result<Self, CollaboratorError> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if ok(self.pm25) && ok(self.pm10) {
            Ok(self)
        } else {
            Err(CollaboratorError::Malformed(format!(
                "pm25={}, pm10={}",
                self.pm25, self.pm10
            )))
        }
    }

    /// Combine with the dust estimate into a reading
    #[must_use]
    pub fn into_reading(self, dust: f64) -> PollutantReading {
        PollutantReading::new(Some(self.pm25), Some(self.pm10), Some(dust))
    }
}

/// External capability that predicts particulates for one point
#[async_trait]
pub trait PollutantPredictor: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictedPollutants, CollaboratorError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// In-process predictor built from hour, season, location and weather
/// multipliers on the baseline PM2.5
#[derive(Debug, Clone)]
pub struct PatternPredictor {
    seed: u64,
}

impl PatternPredictor {
    /// Create a new pattern predictor; `seed` fixes its noise
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Deterministic part of the PM2.5 prediction
    #[must_use]
    pub fn expected_pm25(request: &PredictionRequest) -> f64 {
        let hour = f64::from(request.hour_of_day);
        let day_of_year = f64::from(request.timestamp.ordinal());
        let w = &request.weather;

        let hour_factor = 1.0 + 0.4 * ((hour - 8.0) * PI / 12.0).sin();
        let seasonal_factor = 1.0 + 0.2 * ((day_of_year - 90.0) * 2.0 * PI / 365.0).sin();
        let temp_factor = 1.0 + ((w.temperature - 30.0) / 50.0).max(0.0);
        let humidity_factor = 1.0 - (w.humidity / 300.0).min(0.3);
        let wind_factor = (1.0 - w.wind_speed / 25.0).max(0.3);
        let pressure_factor = 1.0 + (w.pressure - 1013.0) / 1000.0;

        request.baseline_pm25
            * request.location.baseline.pm25_factor
            * hour_factor
            * seasonal_factor
            * temp_factor
            * humidity_factor
            * wind_factor
            * pressure_factor
    }
}

#[async_trait]
impl PollutantPredictor for PatternPredictor {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictedPollutants, CollaboratorError> {
        let mut rng = StdRng::seed_from_u64(point_seed(
            self.seed,
            &request.location.name,
            request.timestamp.timestamp().unsigned_abs(),
        ));
        let pm25 = (Self::expected_pm25(request) + rng.random_range(-2.0..=2.0)).max(1.0);
        let pm10_ratio = 2.2 * request.location.baseline.pm10_factor / request.location.baseline.pm25_factor.max(0.1);
        let pm10 = (pm25 * pm10_ratio + rng.random_range(-5.0..=5.0)).max(2.0);
        Ok(PredictedPollutants { pm25, pm10 })
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

/// Predictor served over HTTP: POSTs the request as JSON and expects
/// `{"pm25": .., "pm10": ..}` back
pub struct HttpPredictor {
    client: ClientWithMiddleware,
    endpoint: String,
    timeout: Duration,
}

impl HttpPredictor {
    /// Create a new HTTP predictor client
    pub fn new(endpoint: impl Into<String>, timeout: Duration, max_retries: u32) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("SkySafe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SkySafeError::external("predictor", format!("Failed to create HTTP client: {e}")))?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl PollutantPredictor for HttpPredictor {
    #[instrument(skip(self, request), fields(location = %request.location.name, hour = request.hour_of_day))]
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictedPollutants, CollaboratorError> {
        debug!("Requesting prediction from {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| CollaboratorError::http(e, self.timeout))?
            .error_for_status()
            .map_err(|e| CollaboratorError::http(e, self.timeout))?;
        let predicted: PredictedPollutants = response
            .json()
            .await
            .map_err(|e| CollaboratorError::http(e, self.timeout))?;
        predicted.validate()
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Local fallback when no usable prediction arrives.
///
/// PM2.5 follows the location baseline with a circadian swing peaking at
/// 14:00; PM10 tracks it at 2.2x.
#[must_use]
pub fn fallback_reading(baseline_pm25: f64, hour_of_day: u8, dust: f64, rng: &mut StdRng) -> PollutantReading {
    let hour = f64::from(hour_of_day);
    let circadian = 1.0 + 0.3 * ((hour - 8.0) * PI / 12.0).sin();
    let pm25 = (baseline_pm25 * circadian + rng.random_range(-2.0..=2.0)).max(1.0);
    let pm10 = (pm25 * 2.2 + rng.random_range(-5.0..=5.0)).max(2.0);
    PollutantReading::new(Some(pm25), Some(pm10), Some(dust))
}
