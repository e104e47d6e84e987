//! Weather state model and sky condition labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default temperature in °C when no observation is available
pub const DEFAULT_TEMPERATURE: f64 = 25.0;
/// Default relative humidity in %
pub const DEFAULT_HUMIDITY: f64 = 60.0;
/// Default wind speed in m/s
pub const DEFAULT_WIND_SPEED: f64 = 10.0;
/// Default surface pressure in hPa
pub const DEFAULT_PRESSURE: f64 = 1013.0;

/// Physically plausible ranges the evolution model clamps to
pub const TEMPERATURE_RANGE: (f64, f64) = (15.0, 50.0);
pub const HUMIDITY_RANGE: (f64, f64) = (15.0, 95.0);
pub const WIND_SPEED_RANGE: (f64, f64) = (0.5, 30.0);
pub const PRESSURE_RANGE: (f64, f64) = (995.0, 1035.0);

/// Weather at one hour offset of a forecast run
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WeatherState {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Surface pressure in hPa
    pub pressure: f64,
    /// Hour offset from the run origin
    pub hour_offset: u8,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
            wind_speed: DEFAULT_WIND_SPEED,
            pressure: DEFAULT_PRESSURE,
            hour_offset: 0,
        }
    }
}

impl WeatherState {
    /// Build a state from possibly missing or invalid observations.
    ///
    /// Non-finite values and negative wind speeds are replaced by the
    /// documented defaults.
    #[must_use]
    pub fn from_partial(
        temperature: Option<f64>,
        humidity: Option<f64>,
        wind_speed: Option<f64>,
        pressure: Option<f64>,
    ) -> Self {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Self {
            temperature: finite(temperature).unwrap_or(DEFAULT_TEMPERATURE),
            humidity: finite(humidity)
                .filter(|h| (0.0..=100.0).contains(h))
                .unwrap_or(DEFAULT_HUMIDITY),
            wind_speed: finite(wind_speed)
                .filter(|w| *w >= 0.0)
                .unwrap_or(DEFAULT_WIND_SPEED),
            pressure: finite(pressure)
                .filter(|p| *p > 0.0)
                .unwrap_or(DEFAULT_PRESSURE),
            hour_offset: 0,
        }
    }

    /// Same state re-stamped for another hour offset
    #[must_use]
    pub fn at_offset(self, hour_offset: u8) -> Self {
        Self {
            hour_offset,
            ..self
        }
    }

    /// Clamp every variable into its plausible range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            temperature: self.temperature.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
            humidity: self.humidity.clamp(HUMIDITY_RANGE.0, HUMIDITY_RANGE.1),
            wind_speed: self.wind_speed.clamp(WIND_SPEED_RANGE.0, WIND_SPEED_RANGE.1),
            pressure: self.pressure.clamp(PRESSURE_RANGE.0, PRESSURE_RANGE.1),
            hour_offset: self.hour_offset,
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Format wind speed with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} m/s", self.wind_speed)
    }

    /// Format atmospheric pressure with unit
    #[must_use]
    pub fn format_pressure(&self) -> String {
        format!("{:.1} hPa", self.pressure)
    }
}

/// Weather observation plus coarser forecast samples for one location.
///
/// `current` is the state at hour offset 0. Each sample carries its hour
/// offset from the run origin; samples are kept sorted by that offset.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct WeatherOutlook {
    pub current: WeatherState,
    pub samples: Vec<WeatherState>,
}

impl WeatherOutlook {
    /// Create a new outlook, sorting samples and dropping any at offset 0
    #[must_use]
    pub fn new(current: WeatherState, mut samples: Vec<WeatherState>) -> Self {
        samples.retain(|s| s.hour_offset > 0);
        samples.sort_by_key(|s| s.hour_offset);
        samples.dedup_by_key(|s| s.hour_offset);
        Self {
            current: current.at_offset(0),
            samples,
        }
    }

    /// Outlook with only a current state and no forecast samples
    #[must_use]
    pub fn current_only(current: WeatherState) -> Self {
        Self::new(current, Vec::new())
    }

    /// Last hour offset covered by samples
    #[must_use]
    pub fn horizon(&self) -> u8 {
        self.samples.last().map_or(0, |s| s.hour_offset)
    }
}

/// Coarse sky description derived from weather and dust load
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SkyCondition {
    Dusty,
    DustStorm,
    Hazy,
    Clear,
    PartlyCloudy,
    Fair,
}

impl SkyCondition {
    /// Classify the sky. First matching rule wins.
    #[must_use]
    pub fn classify(weather: &WeatherState, dust: f64) -> Self {
        if dust > 80.0 {
            SkyCondition::Dusty
        } else if weather.wind_speed > 15.0 && dust > 40.0 {
            SkyCondition::DustStorm
        } else if weather.humidity > 80.0 && weather.temperature > 30.0 {
            SkyCondition::Hazy
        } else if weather.humidity < 30.0 && dust < 30.0 {
            SkyCondition::Clear
        } else if weather.humidity > 70.0 {
            SkyCondition::PartlyCloudy
        } else {
            SkyCondition::Fair
        }
    }
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkyCondition::Dusty => write!(f, "Dusty"),
            SkyCondition::DustStorm => write!(f, "Dust Storm"),
            SkyCondition::Hazy => write!(f, "Hazy"),
            SkyCondition::Clear => write!(f, "Clear"),
            SkyCondition::PartlyCloudy => write!(f, "Partly Cloudy"),
            SkyCondition::Fair => write!(f, "Fair"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_partial_uses_defaults() {
        let state = WeatherState::from_partial(None, Some(f64::NAN), Some(-3.0), None);
        assert_eq!(state, WeatherState::default());

        let state = WeatherState::from_partial(Some(35.0), Some(20.0), Some(4.0), Some(1008.0));
        assert_eq!(state.temperature, 35.0);
        assert_eq!(state.humidity, 20.0);
        assert_eq!(state.wind_speed, 4.0);
        assert_eq!(state.pressure, 1008.0);
    }

    #[test]
    fn test_clamped() {
        let state = WeatherState {
            temperature: 60.0,
            humidity: 2.0,
            wind_speed: 0.0,
            pressure: 1100.0,
            hour_offset: 5,
        }
        .clamped();
        assert_eq!(state.temperature, 50.0);
        assert_eq!(state.humidity, 15.0);
        assert_eq!(state.wind_speed, 0.5);
        assert_eq!(state.pressure, 1035.0);
        assert_eq!(state.hour_offset, 5);
    }

    #[test]
    fn test_sky_condition_rules() {
        let calm = WeatherState::default();
        assert_eq!(SkyCondition::classify(&calm, 90.0), SkyCondition::Dusty);

        let windy = WeatherState {
            wind_speed: 18.0,
            ..calm
        };
        assert_eq!(SkyCondition::classify(&windy, 50.0), SkyCondition::DustStorm);

        let muggy = WeatherState {
            humidity: 85.0,
            temperature: 33.0,
            ..calm
        };
        assert_eq!(SkyCondition::classify(&muggy, 20.0), SkyCondition::Hazy);

        let dry = WeatherState {
            humidity: 20.0,
            ..calm
        };
        assert_eq!(SkyCondition::classify(&dry, 20.0), SkyCondition::Clear);

        let damp = WeatherState {
            humidity: 75.0,
            ..calm
        };
        assert_eq!(SkyCondition::classify(&damp, 50.0), SkyCondition::PartlyCloudy);

        assert_eq!(SkyCondition::classify(&calm, 50.0), SkyCondition::Fair);
    }

    #[test]
    fn test_outlook_orders_samples() {
        let sample = |h: u8| WeatherState::default().at_offset(h);
        let outlook = WeatherOutlook::new(
            WeatherState::default().at_offset(7),
            vec![sample(6), sample(0), sample(3), sample(6)],
        );
        assert_eq!(outlook.current.hour_offset, 0);
        let offsets: Vec<u8> = outlook.samples.iter().map(|s| s.hour_offset).collect();
        assert_eq!(offsets, vec![3, 6]);
        assert_eq!(outlook.horizon(), 6);
        assert_eq!(WeatherOutlook::current_only(WeatherState::default()).horizon(), 0);
    }

    #[test]
    fn test_format_helpers() {
        let state = WeatherState::default();
        assert_eq!(state.format_temperature(), "25.0°C");
        assert_eq!(state.format_wind(), "10.0 m/s");
        assert_eq!(state.format_pressure(), "1013.0 hPa");
    }
}
