//! Logging setup
//!
//! Logs go to stderr so that stdout stays free for forecast output.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` when set, otherwise the configured level
/// (raised to `debug` for this crate when `verbose`)
#[must_use]
pub fn env_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { config.level.as_str() };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("warn,skysafe={level}")))
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = env_filter(config, verbose);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!("Logging initialized ({} format)", config.format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        let config = LoggingConfig::default();
        init(&config, false);
        init(&config, true);
    }

    #[test]
    fn test_verbose_filter_mentions_debug() {
        // SAFETY: Test environment, clearing a variable only
        unsafe {
            std::env::remove_var("RUST_LOG");
        }
        let filter = env_filter(&LoggingConfig::default(), true);
        assert!(filter.to_string().contains("skysafe=debug"));
    }
}
