//! Ad hoc ingestion of single-point readings
//!
//! A batch is a JSON array of objects with the fields `site`, `lat`, `lon`,
//! `region`, `hour`, `pm25`, `pm10`, `dust`, `wind_speed`, `temperature`,
//! `humidity` and `pressure`. Only `site`, `lat` and `lon` are mandatory;
//! the rest fall back to documented defaults.
//!
//! A mandatory column absent from every record rejects the batch. A single
//! record that is unusable is skipped and reported, the others still go
//! through.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::SkySafeError;
use crate::models::location::valid_coordinates;
use crate::models::{Location, PollutantReading, PollutionBaseline, SkyCondition, WeatherState};
use crate::scoring::{AqiCategory, Assessment, AviationTier, RiskLevel};

/// Columns every batch must carry
pub const MANDATORY_COLUMNS: [&str; 3] = ["site", "lat", "lon"];
/// Greatest distance at which a known location lends its region tag
pub const REGION_MATCH_RADIUS_KM: f64 = 100.0;

const UNKNOWN_REGION: &str = "Unknown";

/// One raw ingestion record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRecord {
    pub site: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub region: Option<String>,
    pub hour: Option<u8>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub dust: Option<f64>,
    pub wind_speed: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

/// Assessment of one ingested record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessedRecord {
    pub site: String,
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    pub hour: Option<u8>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub dust: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub visibility_km: f64,
    pub aqi: Option<u16>,
    pub aqi_category: Option<AqiCategory>,
    pub safety_score: Option<f64>,
    pub risk: RiskLevel,
    pub aviation_tier: AviationTier,
    pub sky: SkyCondition,
    pub turbulence_risk: f64,
    pub air_density: f64,
}

/// Record left out of a batch and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Position in the input array
    pub index: usize,
    pub reason: String,
}

/// Result of ingesting a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub assessed: Vec<AssessedRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Parse and ingest a JSON batch
pub fn ingest_json(input: &str, known: &[Location]) -> crate::Result<IngestReport> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| SkySafeError::validation(format!("Ingestion input is not valid JSON: {e}")))?;
    let Value::Array(records) = value else {
        return Err(SkySafeError::validation("Ingestion input must be a JSON array of records"));
    };
    ingest_batch(&records, known)
}

/// Ingest already-parsed records. `known` supplies region tags and
/// baselines for nearby records.
pub fn ingest_batch(records: &[Value], known: &[Location]) -> crate::Result<IngestReport> {
    let missing = missing_columns(records);
    if !missing.is_empty() {
        warn!("Rejecting ingestion batch, missing columns: {}", missing.join(", "));
        return Err(SkySafeError::ingestion(missing));
    }

    let mut report = IngestReport::default();
    for (index, value) in records.iter().enumerate() {
        match assess_record(value, known) {
            Ok(assessed) => report.assessed.push(assessed),
            Err(reason) => {
                warn!("Skipping ingestion record {}: {}", index, reason);
                report.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    info!(
        "Ingested {} records, skipped {}",
        report.assessed.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Mandatory columns that no record in the batch carries
fn missing_columns(records: &[Value]) -> Vec<String> {
    MANDATORY_COLUMNS
        .iter()
        .filter(|column| {
            !records
                .iter()
                .any(|r| r.get(**column).is_some_and(|v| !v.is_null()))
        })
        .map(|column| (*column).to_string())
        .collect()
}

fn assess_record(value: &Value, known: &[Location]) -> Result<AssessedRecord, String> {
    let record: IngestRecord =
        serde_json::from_value(value.clone()).map_err(|e| format!("unreadable record: {e}"))?;

    let site = record
        .site
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| "missing site".to_string())?;
    let (Some(lat), Some(lon)) = (record.lat, record.lon) else {
        return Err(format!("{site}: missing coordinates"));
    };
    if !valid_coordinates(lat, lon) {
        return Err(format!("{site}: coordinates out of range ({lat}, {lon})"));
    }

    let nearby = Location::nearest(known, lat, lon).filter(|(_, km)| *km <= REGION_MATCH_RADIUS_KM);
    let region = record
        .region
        .filter(|r| !r.trim().is_empty())
        .or_else(|| nearby.map(|(loc, _)| loc.region.clone()))
        .unwrap_or_else(|| UNKNOWN_REGION.to_string());
    let baseline = nearby.map_or_else(PollutionBaseline::default, |(loc, _)| loc.baseline.clone());
    let location = Location::new(site, lat, lon, region, baseline).map_err(|e| e.to_string())?;

    let weather = WeatherState::from_partial(record.temperature, record.humidity, record.wind_speed, record.pressure);
    let reading = PollutantReading::new(record.pm25, record.pm10, record.dust);
    // Missing or invalid dust takes the default
    let reading = PollutantReading {
        dust: Some(reading.dust_or_default()),
        ..reading
    };
    let assessment = Assessment::assess(&reading, &weather);

    Ok(AssessedRecord {
        site: location.name,
        region: location.region,
        lat,
        lon,
        hour: record.hour.filter(|h| *h < 24),
        pm25: reading.pm25,
        pm10: reading.pm10,
        dust: reading.dust_or_default(),
        temperature: weather.temperature,
        humidity: weather.humidity,
        wind_speed: weather.wind_speed,
        pressure: weather.pressure,
        visibility_km: assessment.visibility_km,
        aqi: assessment.aqi,
        aqi_category: assessment.category(),
        safety_score: assessment.safety_score(),
        risk: assessment.risk(),
        aviation_tier: assessment.aviation_tier(),
        sky: assessment.sky,
        turbulence_risk: assessment.indicators.turbulence_risk,
        air_density: assessment.indicators.air_density,
    })
}
