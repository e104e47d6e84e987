//! Weather source collaborators
//!
//! [`OpenMeteoClient`] fetches the current observation plus 3-hourly samples
//! for the next two days from the Open-Meteo forecast API. Transient HTTP
//! failures are retried with exponential backoff.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::SkySafeError;
use crate::config::WeatherConfig;
use crate::error::CollaboratorError;
use crate::models::{HORIZON_HOURS, Location, WeatherOutlook, WeatherState};

/// Spacing of forecast samples handed to the evolution model
pub const SAMPLE_INTERVAL_HOURS: i64 = 3;

const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,surface_pressure";

/// Source of current weather and forecast samples for a location
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current state plus forecast samples, with hour offsets relative to
    /// `origin`
    async fn current_and_forecast(
        &self,
        location: &Location,
        origin: DateTime<Utc>,
    ) -> Result<WeatherOutlook, CollaboratorError>;
}

/// Weather source that is always unavailable; forecasts are then modelled
/// from the default weather state
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeatherSource;

#[async_trait]
impl WeatherSource for NoWeatherSource {
    async fn current_and_forecast(
        &self,
        _location: &Location,
        _origin: DateTime<Utc>,
    ) -> Result<WeatherOutlook, CollaboratorError> {
        Err(CollaboratorError::Unavailable("weather source disabled".to_string()))
    }
}

/// Open-Meteo forecast API client
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoClient {
    /// Create a new client from the weather configuration
    pub fn new(config: &WeatherConfig) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("SkySafe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SkySafeError::external("open-meteo", format!("Failed to create HTTP client: {e}")))?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn forecast_url(&self, location: &Location) -> String {
        format!(
            "{}/forecast?latitude={:.4}&longitude={:.4}&current={HOURLY_FIELDS}&hourly={HOURLY_FIELDS}&wind_speed_unit=ms&timezone=UTC&forecast_days=3",
            self.base_url, location.latitude, location.longitude
        )
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    #[instrument(skip(self, location), fields(location = %location.name))]
    async fn current_and_forecast(
        &self,
        location: &Location,
        origin: DateTime<Utc>,
    ) -> Result<WeatherOutlook, CollaboratorError> {
        let url = self.forecast_url(location);
        debug!("OpenMeteo API request URL: {}", url);

        let response: openmeteo::ForecastResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CollaboratorError::http(e, self.timeout))?
            .error_for_status()
            .map_err(|e| CollaboratorError::http(e, self.timeout))?
            .json()
            .await
            .map_err(|e| CollaboratorError::http(e, self.timeout))?;

        openmeteo::to_outlook(&response, origin)
    }
}

/// `OpenMeteo` API response structures and conversion
pub mod openmeteo {
    use super::{
        CollaboratorError, DateTime, HORIZON_HOURS, NaiveDateTime, SAMPLE_INTERVAL_HOURS, Utc, WeatherOutlook,
        WeatherState,
    };
    use serde::Deserialize;

    /// Forecast response with current and hourly blocks
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub latitude: f64,
        pub longitude: f64,
        pub current: Option<CurrentData>,
        pub hourly: Option<HourlyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub time: String,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<f64>,
        #[serde(rename = "relative_humidity_2m")]
        pub humidity: Option<f64>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<f64>,
        #[serde(rename = "surface_pressure")]
        pub pressure: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m", default)]
        pub temperature: Vec<Option<f64>>,
        #[serde(rename = "relative_humidity_2m", default)]
        pub humidity: Vec<Option<f64>>,
        #[serde(rename = "wind_speed_10m", default)]
        pub wind_speed: Vec<Option<f64>>,
        #[serde(rename = "surface_pressure", default)]
        pub pressure: Vec<Option<f64>>,
    }

    /// Open-Meteo times are ISO 8601 without seconds or zone when
    /// `timezone=UTC`
    pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
            .ok()
            .map(|t| t.and_utc())
    }

    /// Convert a response into an outlook relative to `origin`.
    ///
    /// Hourly entries are kept every [`SAMPLE_INTERVAL_HOURS`] within the
    /// forecast horizon. The hourly entry at the origin anchors offset 0; the
    /// live `current` block is observed at some later time of day and only
    /// stands in when that entry is missing.
    pub fn to_outlook(response: &ForecastResponse, origin: DateTime<Utc>) -> Result<WeatherOutlook, CollaboratorError> {
        let mut samples = Vec::new();
        let mut at_origin = None;

        if let Some(hourly) = &response.hourly {
            let field = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();
            for (i, time) in hourly.time.iter().enumerate() {
                let Some(timestamp) = parse_time(time) else {
                    continue;
                };
                let offset = (timestamp - origin).num_hours();
                if offset < 0 || offset >= i64::from(HORIZON_HOURS) || offset % SAMPLE_INTERVAL_HOURS != 0 {
                    continue;
                }
                let Ok(offset) = u8::try_from(offset) else {
                    continue;
                };
                let state = WeatherState::from_partial(
                    field(&hourly.temperature, i),
                    field(&hourly.humidity, i),
                    field(&hourly.wind_speed, i),
                    field(&hourly.pressure, i),
                )
                .at_offset(offset);
                if offset == 0 {
                    at_origin = Some(state);
                } else {
                    samples.push(state);
                }
            }
        }

        let current = at_origin
            .or_else(|| {
                response
                    .current
                    .as_ref()
                    .map(|c| WeatherState::from_partial(c.temperature, c.humidity, c.wind_speed, c.pressure))
            })
            .ok_or_else(|| CollaboratorError::Malformed("no current or origin-hour weather".to_string()))?;

        Ok(WeatherOutlook::new(current, samples))
    }
}
