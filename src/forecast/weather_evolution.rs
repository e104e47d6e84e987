//! Weather evolution across the forecast horizon
//!
//! Hours covered by forecast samples are linearly interpolated between the
//! bracketing samples, with `current` anchoring hour 0. Past the last sample
//! the state is modelled from `current`:
//!
//! 1. a diurnal cycle per variable, applied as a delta from the origin hour
//! 2. a drift term on day 2 scaled by `day - 1`
//! 3. uniform noise whose width grows with the hour offset
//! 4. clamping into plausible ranges
//!
//! Runs are aligned to midnight, so the hour of day is `h % 24`.

use rand::RngExt;
use rand::rngs::StdRng;
use std::f64::consts::PI;

use crate::models::{WeatherOutlook, WeatherState};

/// Peak-to-trough swing of each diurnal cycle
const TEMPERATURE_SWING: f64 = 12.0;
const HUMIDITY_SWING: f64 = -15.0;
const WIND_SWING: f64 = 2.0;
const PRESSURE_SWING: f64 = 1.5;

/// Largest drift added per extra forecast day
const TEMPERATURE_DRIFT: f64 = 1.5;
const HUMIDITY_DRIFT: f64 = -4.0;
const WIND_DRIFT: f64 = 0.8;
const PRESSURE_DRIFT: f64 = -1.0;
const DRIFT_PHASE: f64 = PI / 3.0;

/// Noise half-width at the end of the horizon
const TEMPERATURE_NOISE: f64 = 1.5;
const HUMIDITY_NOISE: f64 = 5.0;
const WIND_NOISE: f64 = 1.0;
const PRESSURE_NOISE: f64 = 1.5;

const LAST_HOUR: f64 = 47.0;

/// Daily cycle in [-1, 1], peaking at 15:00
fn diurnal(hour_of_day: u8) -> f64 {
    ((f64::from(hour_of_day) - 9.0) * PI / 12.0).sin()
}

/// Twice-daily pressure tide in [-1, 1], peaking at 10:00 and 22:00
fn semidiurnal(hour_of_day: u8) -> f64 {
    ((f64::from(hour_of_day) - 7.0) * PI / 6.0).sin()
}

/// Drift weight in [0, 1] for the hour of day
fn drift(hour_of_day: u8) -> f64 {
    0.5 + 0.5 * (f64::from(hour_of_day) * PI / 12.0 + DRIFT_PHASE).sin()
}

fn noise(rng: &mut StdRng, half_width: f64) -> f64 {
    if half_width > 0.0 {
        rng.random_range(-half_width..=half_width)
    } else {
        0.0
    }
}

/// Project `baseline` (the state at hour 0) forward to hour offset `h` with
/// the cyclical model
#[must_use]
pub fn project(baseline: &WeatherState, h: u8, rng: &mut StdRng) -> WeatherState {
    let hod = h % 24;
    let day_index = f64::from(h / 24);
    let growth = f64::from(h) / LAST_HOUR;

    let cycle = diurnal(hod) - diurnal(0);
    let tide = semidiurnal(hod) - semidiurnal(0);
    let drift = day_index * drift(hod);

    WeatherState {
        temperature: baseline.temperature
            + TEMPERATURE_SWING / 2.0 * cycle
            + TEMPERATURE_DRIFT * drift
            + noise(rng, TEMPERATURE_NOISE * growth),
        humidity: baseline.humidity
            + HUMIDITY_SWING / 2.0 * cycle
            + HUMIDITY_DRIFT * drift
            + noise(rng, HUMIDITY_NOISE * growth),
        wind_speed: baseline.wind_speed
            + WIND_SWING / 2.0 * cycle
            + WIND_DRIFT * drift
            + noise(rng, WIND_NOISE * growth),
        pressure: baseline.pressure
            + PRESSURE_SWING / 2.0 * tide
            + PRESSURE_DRIFT * drift
            + noise(rng, PRESSURE_NOISE * growth),
        hour_offset: h,
    }
    .clamped()
}

/// Linear interpolation between the samples bracketing `h`.
///
/// Returns `None` when `h` lies beyond the last sample.
#[must_use]
pub fn interpolate(outlook: &WeatherOutlook, h: u8) -> Option<WeatherState> {
    if h == 0 {
        return Some(outlook.current.at_offset(0).clamped());
    }

    // `current` sits at offset 0 whatever offset it carries
    let (mut previous, mut previous_offset) = (&outlook.current, 0u8);
    for sample in &outlook.samples {
        if sample.hour_offset == h {
            return Some(sample.at_offset(h).clamped());
        }
        if sample.hour_offset > h {
            let span = f64::from(sample.hour_offset - previous_offset);
            let t = f64::from(h - previous_offset) / span;
            let lerp = |a: f64, b: f64| a + (b - a) * t;
            return Some(
                WeatherState {
                    temperature: lerp(previous.temperature, sample.temperature),
                    humidity: lerp(previous.humidity, sample.humidity),
                    wind_speed: lerp(previous.wind_speed, sample.wind_speed),
                    pressure: lerp(previous.pressure, sample.pressure),
                    hour_offset: h,
                }
                .clamped(),
            );
        }
        previous = sample;
        previous_offset = sample.hour_offset;
    }
    None
}

/// Weather at hour offset `h`: interpolated where samples cover it,
/// modelled from `current` otherwise
#[must_use]
pub fn evolve(outlook: &WeatherOutlook, h: u8, rng: &mut StdRng) -> WeatherState {
    interpolate(outlook, h).unwrap_or_else(|| project(&outlook.current, h, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather::{HUMIDITY_RANGE, PRESSURE_RANGE, TEMPERATURE_RANGE, WIND_SPEED_RANGE};
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_hour_zero_reproduces_baseline() {
        let baseline = WeatherState::default();
        assert_eq!(project(&baseline, 0, &mut rng()), baseline);
    }

    #[test]
    fn test_afternoon_is_warmer_and_drier() {
        let baseline = WeatherState::default();
        let afternoon = project(&baseline, 15, &mut rng());
        let dawn = project(&baseline, 4, &mut rng());
        assert!(afternoon.temperature > dawn.temperature);
        assert!(afternoon.humidity < dawn.humidity);
        assert!(afternoon.temperature > baseline.temperature + 5.0);
    }

    #[test]
    fn test_projection_stays_in_range() {
        let extremes = [
            WeatherState {
                temperature: 49.0,
                humidity: 94.0,
                wind_speed: 29.5,
                pressure: 1034.0,
                hour_offset: 0,
            },
            WeatherState {
                temperature: 15.5,
                humidity: 16.0,
                wind_speed: 0.6,
                pressure: 996.0,
                hour_offset: 0,
            },
        ];
        let mut rng = rng();
        for baseline in &extremes {
            for h in 0..48 {
                let state = project(baseline, h, &mut rng);
                assert!((TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1).contains(&state.temperature));
                assert!((HUMIDITY_RANGE.0..=HUMIDITY_RANGE.1).contains(&state.humidity));
                assert!((WIND_SPEED_RANGE.0..=WIND_SPEED_RANGE.1).contains(&state.wind_speed));
                assert!((PRESSURE_RANGE.0..=PRESSURE_RANGE.1).contains(&state.pressure));
                assert_eq!(state.hour_offset, h);
            }
        }
    }

    #[test]
    fn test_same_seed_same_projection() {
        let baseline = WeatherState::default();
        let a = project(&baseline, 40, &mut StdRng::seed_from_u64(99));
        let b = project(&baseline, 40, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_interpolates_between_samples() {
        let current = WeatherState::default();
        let later = WeatherState {
            temperature: 31.0,
            humidity: 45.0,
            wind_speed: 4.0,
            pressure: 1010.0,
            hour_offset: 3,
        };
        let outlook = WeatherOutlook::new(current, vec![later]);

        let mid = interpolate(&outlook, 2).unwrap();
        assert!((mid.temperature - 29.0).abs() < 1e-9);
        assert!((mid.humidity - 50.0).abs() < 1e-9);
        assert!((mid.wind_speed - 6.0).abs() < 1e-9);
        assert_eq!(mid.hour_offset, 2);

        assert_eq!(interpolate(&outlook, 3).unwrap().temperature, 31.0);
        assert!(interpolate(&outlook, 4).is_none());
    }

    #[test]
    fn test_interpolate_ignores_offset_stamped_on_current() {
        let outlook = WeatherOutlook {
            current: WeatherState::default().at_offset(10),
            samples: vec![WeatherState {
                temperature: 31.0,
                ..WeatherState::default().at_offset(6)
            }],
        };

        let state = interpolate(&outlook, 3).unwrap();
        assert!((state.temperature - 28.0).abs() < 1e-9);
        assert_eq!(state.hour_offset, 3);
    }

    #[test]
    fn test_evolve_falls_back_past_samples() {
        let current = WeatherState::default();
        let outlook = WeatherOutlook::new(current, vec![current.at_offset(6)]);

        assert_eq!(evolve(&outlook, 5, &mut rng()).temperature, current.temperature);
        let modelled = evolve(&outlook, 30, &mut rng());
        assert_eq!(modelled, project(&current, 30, &mut rng()));
    }
}
