//! Location model: coordinates, region tag and pollution baseline

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::SkySafeError;

/// Location-specific pollution and dust baseline
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PollutionBaseline {
    /// Typical PM2.5 concentration in µg/m³
    pub pm25: f64,
    /// Typical dust concentration in µg/m³
    pub dust: f64,
    /// PM2.5 multiplier used by the pattern predictor
    pub pm25_factor: f64,
    /// PM10 multiplier used by the pattern predictor
    pub pm10_factor: f64,
}

impl Default for PollutionBaseline {
    fn default() -> Self {
        Self {
            pm25: 20.0,
            dust: 50.0,
            pm25_factor: 1.0,
            pm10_factor: 1.0,
        }
    }
}

/// Monitored location. Reference data, loaded once per session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Location name (city, site)
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Region tag (governorate, province)
    pub region: String,
    /// Pollution and dust baseline
    pub baseline: PollutionBaseline,
}

impl Location {
    /// Create a new location after validating its coordinates
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        region: impl Into<String>,
        baseline: PollutionBaseline,
    ) -> crate::Result<Self> {
        let name = name.into();
        if !valid_coordinates(latitude, longitude) {
            return Err(SkySafeError::validation(format!(
                "Coordinates out of range for {name}: {latitude}, {longitude}"
            )));
        }
        Ok(Self {
            name,
            latitude,
            longitude,
            region: region.into(),
            baseline,
        })
    }

    /// Built-in monitoring sites
    #[must_use]
    pub fn presets() -> Vec<Location> {
        vec![
            Location {
                name: "Muscat".to_string(),
                latitude: 23.5933,
                longitude: 58.2844,
                region: "Muscat".to_string(),
                baseline: PollutionBaseline {
                    pm25: 25.0,
                    dust: 60.0,
                    pm25_factor: 1.2,
                    pm10_factor: 1.3,
                },
            },
            Location {
                name: "Salalah".to_string(),
                latitude: 17.0387,
                longitude: 54.0914,
                region: "Dhofar".to_string(),
                baseline: PollutionBaseline {
                    pm25: 18.0,
                    dust: 35.0,
                    pm25_factor: 0.8,
                    pm10_factor: 0.9,
                },
            },
            Location {
                name: "Musandam".to_string(),
                latitude: 26.2041,
                longitude: 56.2606,
                region: "Musandam".to_string(),
                baseline: PollutionBaseline {
                    pm25: 15.0,
                    dust: 25.0,
                    pm25_factor: 0.6,
                    pm10_factor: 0.7,
                },
            },
        ]
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Great-circle distance to a point in kilometers
    #[must_use]
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude,
            longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Find the closest location to a point, with its distance in km
    #[must_use]
    pub fn nearest(locations: &[Location], latitude: f64, longitude: f64) -> Option<(&Location, f64)> {
        locations
            .iter()
            .map(|loc| (loc, loc.distance_km(latitude, longitude)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// Latitude within [-90, 90] and longitude within [-180, 180], both finite
#[must_use]
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}
