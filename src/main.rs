use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use skysafe::alerts::{AlertThresholds, aggregate_hour, series_alerts};
use skysafe::forecast::{HttpPredictor, PatternPredictor, PollutantPredictor};
use skysafe::ingest::ingest_json;
use skysafe::models::HORIZON_HOURS;
use skysafe::{
    ForecastHandle, ForecastOrchestrator, ForecastRun, Location, NoWeatherSource, OpenMeteoClient,
    OrchestratorSettings, SkySafeConfig, SkySafeError, WeatherSource, logging,
};

#[derive(Parser, Debug)]
#[command(name = "skysafe", version)]
#[command(about = "Air quality and flight-safety forecasts for monitored sites", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging for skysafe
    #[arg(short, long)]
    verbose: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a 48-hour forecast for the built-in sites
    Forecast {
        #[command(flatten)]
        refresh: RefreshArgs,

        /// Only show this site
        #[arg(short, long)]
        location: Option<String>,
    },
    /// Summarise alerts for one forecast hour
    Alerts {
        #[command(flatten)]
        refresh: RefreshArgs,

        /// Hour offset 0-47
        #[arg(long, default_value_t = 0)]
        hour: u8,
    },
    /// Assess a JSON array of single-point readings
    Ingest {
        /// JSON file to read
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RefreshArgs {
    /// Skip the weather API and model from default weather
    #[arg(long)]
    offline: bool,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SkySafeConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose);

    match &cli.command {
        Command::Forecast { refresh, location } => {
            let run = refresh_run(&config, refresh).await?;
            print_forecast(&run, location.as_deref(), cli.json)?;
        }
        Command::Alerts { refresh, hour } => {
            anyhow::ensure!(*hour < HORIZON_HOURS, "hour must be between 0 and {}", HORIZON_HOURS - 1);
            let run = refresh_run(&config, refresh).await?;
            print_alerts(&run, *hour, &AlertThresholds::from(&config.alerts), cli.json)?;
        }
        Command::Ingest { file } => {
            let input = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = ingest_json(&input, &Location::presets())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for record in &report.assessed {
                    println!(
                        "{} ({}): AQI {} | safety {} | {} / {}",
                        record.site,
                        record.region,
                        record.aqi.map_or_else(|| "n/a".to_string(), |a| a.to_string()),
                        record.safety_score.map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}")),
                        record.risk,
                        record.aviation_tier
                    );
                }
                for skipped in &report.skipped {
                    println!("skipped record {}: {}", skipped.index, skipped.reason);
                }
            }
        }
    }

    Ok(())
}

async fn refresh_run(config: &SkySafeConfig, args: &RefreshArgs) -> Result<Arc<ForecastRun>> {
    let mut settings = OrchestratorSettings::from(config);
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    let predictor: Arc<dyn PollutantPredictor> = match &config.prediction.endpoint {
        Some(endpoint) => Arc::new(HttpPredictor::new(
            endpoint.clone(),
            Duration::from_millis(config.prediction.timeout_ms),
            0,
        )?),
        None => Arc::new(PatternPredictor::new(settings.seed)),
    };
    let weather: Arc<dyn WeatherSource> = if args.offline || !config.weather.enabled {
        Arc::new(NoWeatherSource)
    } else {
        Arc::new(OpenMeteoClient::new(&config.weather)?)
    };

    let orchestrator = ForecastOrchestrator::new(predictor, weather, settings);
    let handle = ForecastHandle::new();
    let run = orchestrator
        .refresh(&Location::presets(), Utc::now())
        .await
        .context("Forecast refresh failed")?;
    let run = handle.publish(run);
    info!("Published forecast run generated at {}", run.generated_at());
    Ok(run)
}

fn print_forecast(run: &ForecastRun, only: Option<&str>, json: bool) -> Result<()> {
    let series: Vec<_> = run
        .series()
        .iter()
        .filter(|s| only.is_none_or(|name| s.location().name.eq_ignore_ascii_case(name)))
        .collect();
    if series.is_empty() {
        let name = only.unwrap_or_default();
        return Err(SkySafeError::general(format!("No forecast site named {name}")).into());
    }

    if json {
        let records: Vec<_> = series.iter().flat_map(|s| s.records()).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let degraded = run.degraded_series();
    for s in series {
        let location = s.location();
        let flag = if degraded.contains(&location.name.as_str()) {
            " [degraded]"
        } else {
            ""
        };
        let peak = s.peak_aqi().map_or_else(|| "n/a".to_string(), |a| a.to_string());
        println!(
            "{} ({}) {}  peak AQI {}{}",
            location.name,
            location.region,
            location.format_coordinates(),
            peak,
            flag
        );
        for point in s.points().iter().step_by(3) {
            println!(
                "  {} +{:02}h  {:>7} {:>8}  AQI {:>3}  vis {:>5.1} km  safety {:>4}  {:<8} {:<7}  conf {:.2}  {}",
                point.timestamp().format("%a %H:%M"),
                point.hour_offset(),
                point.weather().format_temperature(),
                point.weather().format_wind(),
                point.aqi().map_or_else(|| "n/a".to_string(), |a| a.to_string()),
                point.visibility_km(),
                point.safety_score().map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}")),
                point.risk().to_string(),
                point.aviation_tier().to_string(),
                point.confidence(),
                point.sky()
            );
        }
        for alert in series_alerts(s) {
            println!("  ! {}", alert.message);
        }
    }
    Ok(())
}

fn print_alerts(run: &ForecastRun, hour: u8, thresholds: &AlertThresholds, json: bool) -> Result<()> {
    let slice = run.hour_slice(hour);
    let summary = aggregate_hour(&slice, thresholds);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Alerts for +{hour}h");
    if summary.is_all_normal() {
        println!("  All normal");
        return Ok(());
    }
    println!(
        "  Risk: {} good, {} moderate, {} high",
        summary.risk_counts.good, summary.risk_counts.moderate, summary.risk_counts.high
    );
    println!(
        "  Aviation: {} good, {} caution, {} no-fly",
        summary.tier_counts.good, summary.tier_counts.caution, summary.tier_counts.no_fly
    );
    for detail in &summary.details {
        println!("  - {}. {}", detail.line(), detail.aviation_tier.advice());
    }
    for hazard in &summary.hazards {
        println!("  ! {}", hazard.message());
    }
    Ok(())
}
