//! Dust concentration estimate from weather, season and location baseline

use rand::RngExt;
use rand::rngs::StdRng;

use crate::models::WeatherState;

/// Bounds of the dust estimate in µg/m³
pub const DUST_RANGE: (f64, f64) = (15.0, 100.0);
const DUST_NOISE: f64 = 3.0;

/// Seasonal dust multiplier for a calendar month (1-12)
#[must_use]
pub fn seasonal_factor(month: u32) -> f64 {
    match month {
        12 | 1 | 2 => 0.7,
        3..=5 => 1.3,
        6 | 7 => 1.4,
        8 => 1.1,
        _ => 0.9,
    }
}

/// Weather multiplier: heat, dry air, strong wind and low pressure raise dust
#[must_use]
pub fn weather_factor(weather: &WeatherState) -> f64 {
    let temp = 1.0 + ((weather.temperature - 30.0) / 50.0).max(0.0);
    let humidity = 1.0 - ((weather.humidity - 50.0) / 100.0).clamp(0.0, 0.4);
    let wind = 1.0 + ((weather.wind_speed - 8.0) / 20.0).max(0.0);
    let pressure = 1.0 + ((1013.0 - weather.pressure) / 100.0).max(0.0);
    temp * humidity * wind * pressure
}

/// Estimate dust in µg/m³, clamped to [`DUST_RANGE`]
#[must_use]
pub fn estimate_dust(weather: &WeatherState, baseline_dust: f64, month: u32, rng: &mut StdRng) -> f64 {
    let dust = baseline_dust * seasonal_factor(month) * weather_factor(weather)
        + rng.random_range(-DUST_NOISE..=DUST_NOISE);
    dust.clamp(DUST_RANGE.0, DUST_RANGE.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case(1, 0.7)]
    #[case(4, 1.3)]
    #[case(7, 1.4)]
    #[case(8, 1.1)]
    #[case(10, 0.9)]
    #[case(12, 0.7)]
    fn test_seasonal_factor(#[case] month: u32, #[case] factor: f64) {
        assert_eq!(seasonal_factor(month), factor);
    }

    #[test]
    fn test_neutral_weather_factor() {
        let mild = WeatherState {
            temperature: 25.0,
            humidity: 40.0,
            wind_speed: 5.0,
            pressure: 1015.0,
            hour_offset: 0,
        };
        assert_eq!(weather_factor(&mild), 1.0);
    }

    #[test]
    fn test_harsh_weather_raises_dust() {
        let harsh = WeatherState {
            temperature: 45.0,
            humidity: 20.0,
            wind_speed: 18.0,
            pressure: 1000.0,
            hour_offset: 0,
        };
        assert!(weather_factor(&harsh) > 1.5);

        let humid = WeatherState {
            humidity: 95.0,
            ..WeatherState::default()
        };
        assert!(weather_factor(&humid) < weather_factor(&WeatherState::default()));
    }

    #[test]
    fn test_estimate_is_clamped() {
        let mut rng = StdRng::seed_from_u64(1);
        let storm = WeatherState {
            temperature: 48.0,
            humidity: 15.0,
            wind_speed: 28.0,
            pressure: 996.0,
            hour_offset: 0,
        };
        assert_eq!(estimate_dust(&storm, 90.0, 6, &mut rng), DUST_RANGE.1);
        assert_eq!(estimate_dust(&WeatherState::default(), 1.0, 1, &mut rng), DUST_RANGE.0);

        for month in 1..=12 {
            let dust = estimate_dust(&WeatherState::default(), 50.0, month, &mut rng);
            assert!((DUST_RANGE.0..=DUST_RANGE.1).contains(&dust));
        }
    }
}
