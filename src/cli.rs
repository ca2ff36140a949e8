//! CLI argument parsing for the tourier-worker binary.

use clap::{Args, Parser, Subcommand};

use crate::services::clustering::ClusterStrategy;

#[derive(Parser)]
#[command(name = "tourier-worker", about = "Tourier visit clustering and tour planning worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one optimization pass: cluster, route and timeline (default)
    Optimize(OptimizeArgs),
    /// Geocode appointments that have no coordinates yet
    Geocode,
    /// Run database migrations and exit
    Migrate,
}

#[derive(Args, Debug, Default)]
pub struct OptimizeArgs {
    /// Maximum visits per cluster
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Maximum km between a cluster seed and a candidate member
    #[arg(long)]
    pub max_leg_km: Option<f64>,

    /// Clustering strategy
    #[arg(long, value_enum)]
    pub strategy: Option<ClusterStrategy>,

    /// Depot departure time, HH:MM
    #[arg(long)]
    pub start: Option<String>,

    /// Visit duration for appointments without one, minutes
    #[arg(long)]
    pub default_visit_minutes: Option<i32>,

    /// Tour improvement budget per cluster, seconds
    #[arg(long)]
    pub budget_secs: Option<u64>,

    /// Seed for the solver's perturbation step
    #[arg(long)]
    pub seed: Option<u64>,
}
