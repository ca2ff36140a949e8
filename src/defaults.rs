//! Default parameters of the optimization pipeline

use chrono::NaiveTime;

/// Maximum number of visits per cluster
pub const DEFAULT_CAPACITY: usize = 6;

/// Maximum distance in km between a cluster seed and a candidate member
pub const DEFAULT_MAX_LEG_KM: f64 = 30.0;

/// Visit duration used when an appointment has none recorded
pub const DEFAULT_VISIT_MINUTES: i32 = 60;

/// Wall-clock budget per cluster for tour improvement
pub const DEFAULT_SOLVER_BUDGET_SECS: u64 = 10;

/// Departure time from the depot
pub fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("valid static default start time")
}
