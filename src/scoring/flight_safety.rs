//! Flight safety scoring
//!
//! Combines visibility, air quality, wind and dust into a single score in
//! [0, 1] (higher is safer). Each factor is normalised to a sub-score first:
//!
//! | factor      | sub-score              | weight |
//! |-------------|------------------------|--------|
//! | visibility  | `vis / 25`             | 0.30   |
//! | air quality | `(300 - AQI) / 300`    | 0.25   |
//! | wind        | `(25 - wind) / 25`     | 0.25   |
//! | dust        | `(200 - dust) / 200`   | 0.20   |
//!
//! A sub-score whose input is missing is left out and the remaining weights
//! are renormalised.

use serde::{Deserialize, Serialize};

use super::aqi::overall_aqi;

const VISIBILITY_WEIGHT: f64 = 0.30;
const AIR_QUALITY_WEIGHT: f64 = 0.25;
const WIND_WEIGHT: f64 = 0.25;
const DUST_WEIGHT: f64 = 0.20;

/// Raw inputs to the scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightSafetyInputs {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub wind_speed: Option<f64>,
    pub dust: Option<f64>,
    pub visibility_km: f64,
}

/// Per-factor sub-scores and the combined score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightSafetyAnalysis {
    pub overall_aqi: Option<u16>,
    pub visibility_score: Option<f64>,
    pub air_quality_score: Option<f64>,
    pub wind_score: Option<f64>,
    pub dust_score: Option<f64>,
    /// Weighted score in [0, 1]; `None` only when every sub-score is missing
    pub score: Option<f64>,
}

impl FlightSafetyAnalysis {
    /// Score a set of inputs
    #[must_use]
    pub fn analyze(inputs: &FlightSafetyInputs) -> Self {
        let valid = |v: Option<f64>| v.filter(|x| x.is_finite() && *x >= 0.0);

        let overall_aqi = overall_aqi(inputs.pm25, inputs.pm10);
        let visibility_score = Some(inputs.visibility_km)
            .filter(|v| v.is_finite())
            .map(|v| unit(v / 25.0));
        let air_quality_score = overall_aqi.map(|aqi| unit((300.0 - f64::from(aqi)) / 300.0));
        let wind_score = valid(inputs.wind_speed).map(|w| unit((25.0 - w) / 25.0));
        let dust_score = valid(inputs.dust).map(|d| unit((200.0 - d) / 200.0));

        let score = weighted_score(&[
            (visibility_score, VISIBILITY_WEIGHT),
            (air_quality_score, AIR_QUALITY_WEIGHT),
            (wind_score, WIND_WEIGHT),
            (dust_score, DUST_WEIGHT),
        ]);

        Self {
            overall_aqi,
            visibility_score,
            air_quality_score,
            wind_score,
            dust_score,
            score,
        }
    }
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn weighted_score(parts: &[(Option<f64>, f64)]) -> Option<f64> {
    let (sum, weight) = parts
        .iter()
        .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
        .fold((0.0, 0.0), |acc, (s, w)| (acc.0 + s, acc.1 + w));

    if weight <= 0.0 {
        None
    } else {
        Some(unit(sum / weight))
    }
}

/// Supplementary aviation indicators, not part of the safety score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AviationIndicators {
    /// Turbulence risk in [0, 1], higher is worse
    pub turbulence_risk: f64,
    /// Air density in kg/m³
    pub air_density: f64,
}

impl AviationIndicators {
    #[must_use]
    pub fn calculate(temperature: f64, humidity: f64, pressure: f64, wind_speed: f64, dust: f64) -> Self {
        let wind_factor = unit(wind_speed / 20.0);
        let dust_factor = unit(dust / 500.0);
        let temp_factor = unit(temperature / 50.0);
        let turbulence_risk = wind_factor * 0.4 + dust_factor * 0.4 + temp_factor * 0.2;

        let temp_k = temperature + 273.15;
        let rh_factor = 1.0 - (humidity / 100.0) * 0.02;
        let air_density = (pressure * 100.0) / (287.05 * temp_k) * rh_factor;

        Self {
            turbulence_risk,
            air_density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::visibility::estimate_visibility;

    fn inputs(pm25: f64, pm10: f64, wind: f64, dust: f64) -> FlightSafetyInputs {
        FlightSafetyInputs {
            pm25: Some(pm25),
            pm10: Some(pm10),
            wind_speed: Some(wind),
            dust: Some(dust),
            visibility_km: estimate_visibility(Some(pm25), Some(pm10), Some(dust)),
        }
    }

    #[test]
    fn test_clean_calm_conditions() {
        let analysis = FlightSafetyAnalysis::analyze(&inputs(15.0, 30.0, 10.0, 50.0));
        assert_eq!(analysis.overall_aqi, Some(57));
        assert_eq!(analysis.visibility_score, Some(1.0));
        assert!((analysis.air_quality_score.unwrap() - 0.81).abs() < 1e-9);
        assert!((analysis.wind_score.unwrap() - 0.6).abs() < 1e-9);
        assert!((analysis.dust_score.unwrap() - 0.75).abs() < 1e-9);
        assert!((analysis.score.unwrap() - 0.8025).abs() < 1e-9);
    }

    #[test]
    fn test_polluted_windy_conditions() {
        let analysis = FlightSafetyAnalysis::analyze(&inputs(65.0, 120.0, 30.0, 150.0));
        assert_eq!(analysis.overall_aqi, Some(156));
        assert_eq!(analysis.wind_score, Some(0.0));
        let score = analysis.score.unwrap();
        assert!(score < 0.40);
        assert!((score - 0.3112).abs() < 1e-3);
    }

    #[test]
    fn test_score_bounds() {
        for &(pm25, pm10, wind, dust) in &[
            (0.0, 0.0, 0.0, 0.0),
            (1e5, 1e5, 1e3, 1e5),
            (500.0, 600.0, 25.0, 200.0),
        ] {
            let score = FlightSafetyAnalysis::analyze(&inputs(pm25, pm10, wind, dust))
                .score
                .unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_non_increasing_in_wind_dust_and_aqi() {
        let base = FlightSafetyAnalysis::analyze(&inputs(20.0, 40.0, 8.0, 60.0)).score.unwrap();

        let mut windier = inputs(20.0, 40.0, 8.0, 60.0);
        windier.wind_speed = Some(14.0);
        assert!(FlightSafetyAnalysis::analyze(&windier).score.unwrap() <= base);

        let mut dustier = inputs(20.0, 40.0, 8.0, 60.0);
        dustier.dust = Some(120.0);
        assert!(FlightSafetyAnalysis::analyze(&dustier).score.unwrap() <= base);

        let mut dirtier = inputs(20.0, 40.0, 8.0, 60.0);
        dirtier.pm25 = Some(80.0);
        assert!(FlightSafetyAnalysis::analyze(&dirtier).score.unwrap() <= base);

        let mut clearer = inputs(20.0, 40.0, 8.0, 60.0);
        clearer.visibility_km = 40.0;
        assert!(FlightSafetyAnalysis::analyze(&clearer).score.unwrap() >= base);
    }

    #[test]
    fn test_missing_sub_score_renormalises() {
        let mut partial = inputs(15.0, 30.0, 10.0, 50.0);
        partial.wind_speed = Some(-2.0);
        let analysis = FlightSafetyAnalysis::analyze(&partial);
        assert_eq!(analysis.wind_score, None);
        let expected = (0.30 * 1.0 + 0.25 * 0.81 + 0.20 * 0.75) / 0.75;
        assert!((analysis.score.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_aviation_indicators() {
        let calm = AviationIndicators::calculate(25.0, 60.0, 1013.0, 10.0, 50.0);
        assert!((calm.turbulence_risk - (0.5 * 0.4 + 0.1 * 0.4 + 0.5 * 0.2)).abs() < 1e-9);
        assert!(calm.air_density > 1.1 && calm.air_density < 1.2);

        let storm = AviationIndicators::calculate(45.0, 20.0, 1000.0, 30.0, 600.0);
        assert!(storm.turbulence_risk > calm.turbulence_risk);
        assert!(storm.turbulence_risk <= 1.0);
    }
}
