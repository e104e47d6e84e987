//! 48-hour forecast engine
//!
//! - `weather_evolution`: weather state per hour offset
//! - `dust`: dust estimate from weather, season and baseline
//! - `predictor`: pollutant prediction collaborators and fallback
//! - `orchestrator`: drives all of the above per location and hour

pub mod dust;
pub mod orchestrator;
pub mod predictor;
pub mod weather_evolution;

pub use orchestrator::{ForecastHandle, ForecastOrchestrator, OrchestratorSettings, confidence};
pub use predictor::{
    HttpPredictor, PatternPredictor, PollutantPredictor, PredictedPollutants, PredictionRequest, fallback_reading,
};

/// Seed for one point's random draws, mixed from the run seed, the
/// location name and a per-point discriminator (hour offset or timestamp).
///
/// FNV-1a over the name followed by a SplitMix64 finalizer; stable across
/// platforms and releases.
#[must_use]
pub fn point_seed(run_seed: u64, location: &str, discriminator: u64) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET ^ run_seed;
    for byte in location.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    let mut z = hash ^ discriminator.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
