//! Visibility estimate from particulate and dust load

/// Clear-air visibility in km
pub const MAX_VISIBILITY_KM: f64 = 50.0;
/// Floor of the estimate in km
pub const MIN_VISIBILITY_KM: f64 = 0.1;

/// Estimate visibility in km.
///
/// `50 / (1 + pm25/50 + pm10/100 + dust/200)`, clamped to [0.1, 50]. A
/// missing term adds no load.
#[must_use]
pub fn estimate_visibility(pm25: Option<f64>, pm10: Option<f64>, dust: Option<f64>) -> f64 {
    let load = |v: Option<f64>, per: f64| {
        v.filter(|x| x.is_finite() && *x >= 0.0)
            .map_or(0.0, |x| x / per)
    };
    let denominator = 1.0 + load(pm25, 50.0) + load(pm10, 100.0) + load(dust, 200.0);
    (MAX_VISIBILITY_KM / denominator).clamp(MIN_VISIBILITY_KM, MAX_VISIBILITY_KM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_air_is_max() {
        assert_eq!(estimate_visibility(Some(0.0), Some(0.0), Some(0.0)), 50.0);
        assert_eq!(estimate_visibility(None, None, None), 50.0);
    }

    #[test]
    fn test_reference_reading() {
        let vis = estimate_visibility(Some(15.0), Some(30.0), Some(50.0));
        assert!((vis - 50.0 / 1.85).abs() < 1e-9);
        assert!((vis - 27.03).abs() < 0.01);
    }

    #[test]
    fn test_extreme_load_hits_floor() {
        let vis = estimate_visibility(Some(1e6), Some(1e6), Some(1e6));
        assert_eq!(vis, MIN_VISIBILITY_KM);
    }

    #[test]
    fn test_decreases_with_each_pollutant() {
        let base = estimate_visibility(Some(20.0), Some(40.0), Some(50.0));
        assert!(estimate_visibility(Some(30.0), Some(40.0), Some(50.0)) < base);
        assert!(estimate_visibility(Some(20.0), Some(60.0), Some(50.0)) < base);
        assert!(estimate_visibility(Some(20.0), Some(40.0), Some(90.0)) < base);
    }
}
