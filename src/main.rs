//! Tourier Worker - visit clustering, tour sequencing and itinerary timelines
//!
//! One invocation runs a full optimization pass over the current appointment
//! snapshot and writes clusters and itineraries back to PostgreSQL.

mod cli;
mod config;
mod defaults;
mod db;
mod services;
mod types;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, OptimizeArgs};
use crate::db::PgStore;
use crate::services::geocoding::{self, OrsGeocoder};
use crate::services::matrix::create_matrix_provider;
use crate::services::pipeline::{self, OptimizeOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "worker.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tourier_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    let args = Cli::parse();

    info!("Starting Tourier Worker...");

    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    info!("Connected to PostgreSQL");

    db::run_migrations(&pool).await?;
    info!("Database migrations complete");

    match args.command {
        Some(Command::Migrate) => {
            // Migrations already ran above
            info!("Migrations up to date");
            Ok(())
        }
        Some(Command::Geocode) => {
            let Some(api_key) = config.ors_api_key.as_deref() else {
                bail!("geocoding requires ORS_API_KEY to be set");
            };
            let geocoder = OrsGeocoder::new(&config.ors_url, api_key);
            let summary = geocoding::geocode_missing(&pool, &geocoder).await?;
            info!(
                "Geocoded {} appointments, {} failed",
                summary.resolved, summary.failed
            );
            Ok(())
        }
        Some(Command::Optimize(optimize_args)) => {
            run_optimize(&config, pool, optimize_args).await
        }
        None => run_optimize(&config, pool, OptimizeArgs::default()).await,
    }
}

async fn run_optimize(
    config: &config::Config,
    pool: sqlx::PgPool,
    args: OptimizeArgs,
) -> Result<()> {
    let options = build_options(&args)?;
    let provider = create_matrix_provider(&config.ors_url, config.ors_api_key.as_deref());
    let store = PgStore::new(pool);

    let report = pipeline::run_optimize(&store, provider.as_ref(), &options).await?;

    info!("Optimization finished: {}", report.summary());
    for skipped in &report.skipped {
        warn!("Cluster '{}' was not routed: {}", skipped.name, skipped.failure);
    }
    for excluded in &report.excluded_points {
        warn!("Point {} excluded: {}", excluded.id, excluded.issue);
    }

    Ok(())
}

fn build_options(args: &OptimizeArgs) -> Result<OptimizeOptions> {
    let mut options = OptimizeOptions::default();

    if let Some(capacity) = args.capacity {
        options.capacity = capacity;
    }
    if let Some(max_leg_km) = args.max_leg_km {
        options.max_leg_km = max_leg_km;
    }
    if let Some(strategy) = args.strategy {
        options.strategy = strategy;
    }
    if let Some(start) = &args.start {
        options.start_time = NaiveTime::parse_from_str(start, "%H:%M")
            .with_context(|| format!("invalid start time '{start}', expected HH:MM"))?;
    }
    if let Some(minutes) = args.default_visit_minutes {
        options.default_visit_minutes = minutes;
    }
    if let Some(secs) = args.budget_secs {
        options.solver_budget = Duration::from_secs(secs);
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clustering::ClusterStrategy;

    #[test]
    fn test_build_options_defaults() {
        let options = build_options(&OptimizeArgs::default()).unwrap();
        assert_eq!(options.capacity, defaults::DEFAULT_CAPACITY);
        assert_eq!(options.start_time, defaults::default_start_time());
    }

    #[test]
    fn test_build_options_overrides() {
        let args = OptimizeArgs {
            capacity: Some(4),
            max_leg_km: Some(20.0),
            strategy: Some(ClusterStrategy::DepotSweep),
            start: Some("07:15".to_string()),
            default_visit_minutes: Some(30),
            budget_secs: Some(2),
            seed: Some(42),
        };

        let options = build_options(&args).unwrap();
        assert_eq!(options.capacity, 4);
        assert_eq!(options.strategy, ClusterStrategy::DepotSweep);
        assert_eq!(options.start_time, NaiveTime::from_hms_opt(7, 15, 0).unwrap());
        assert_eq!(options.solver_budget, Duration::from_secs(2));
        assert_eq!(options.seed, 42);
    }

    #[test]
    fn test_build_options_rejects_bad_start_time() {
        let args = OptimizeArgs {
            start: Some("25:99".to_string()),
            ..OptimizeArgs::default()
        };
        assert!(build_options(&args).is_err());
    }
}
