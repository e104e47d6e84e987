//! Scoring pipeline: AQI, visibility, flight safety and risk tiers
//!
//! [`Assessment::assess`] runs one pollutant reading and weather state
//! through every scorer; forecast points and ingested records both use it.

pub mod aqi;
pub mod flight_safety;
pub mod risk;
pub mod visibility;

pub use aqi::{AqiCategory, PollutantKind, calculate_aqi, overall_aqi};
pub use flight_safety::{AviationIndicators, FlightSafetyAnalysis, FlightSafetyInputs};
pub use risk::{AviationTier, RiskLevel};
pub use visibility::estimate_visibility;

use serde::{Deserialize, Serialize};

use crate::models::{PollutantReading, SkyCondition, WeatherState};

/// Every derived metric for one reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub visibility_km: f64,
    pub aqi: Option<u16>,
    pub safety: FlightSafetyAnalysis,
    pub indicators: AviationIndicators,
    pub sky: SkyCondition,
}

impl Assessment {
    #[must_use]
    pub fn assess(reading: &PollutantReading, weather: &WeatherState) -> Self {
        let visibility_km = estimate_visibility(reading.pm25, reading.pm10, reading.dust);
        let safety = FlightSafetyAnalysis::analyze(&FlightSafetyInputs {
            pm25: reading.pm25,
            pm10: reading.pm10,
            wind_speed: Some(weather.wind_speed),
            dust: reading.dust,
            visibility_km,
        });
        let dust = reading.dust_or_default();
        let indicators = AviationIndicators::calculate(
            weather.temperature,
            weather.humidity,
            weather.pressure,
            weather.wind_speed,
            dust,
        );

        Self {
            visibility_km,
            aqi: safety.overall_aqi,
            safety,
            indicators,
            sky: SkyCondition::classify(weather, dust),
        }
    }

    /// Safety score in [0, 1], if any sub-score was available
    #[must_use]
    pub fn safety_score(&self) -> Option<f64> {
        self.safety.score
    }

    #[must_use]
    pub fn category(&self) -> Option<AqiCategory> {
        self.aqi.map(AqiCategory::from_aqi)
    }

    #[must_use]
    pub fn risk(&self) -> RiskLevel {
        RiskLevel::classify(self.aqi, self.safety.score)
    }

    #[must_use]
    pub fn aviation_tier(&self) -> AviationTier {
        AviationTier::classify(self.safety.score)
    }
}
