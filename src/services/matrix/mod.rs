//! Travel matrix providers
//!
//! Uses OpenRouteService for production, Haversine estimation when no API
//! key is configured and in tests.

mod ors;

pub use ors::{OrsConfig, OrsMatrixClient};

use async_trait::async_trait;

use crate::services::geo::haversine_km;
use crate::types::Coordinates;

/// Cost assigned to a leg the provider could not route. Large enough to
/// push the leg out of any competitive tour, small enough that summing a
/// whole tour of them cannot overflow.
pub const UNREACHABLE_COST: u64 = u64::MAX / 1024;

/// Travel duration and distance matrices between locations
#[derive(Debug, Clone)]
pub struct TravelMatrices {
    /// Duration in seconds [i][j] from location i to location j
    pub durations: Vec<Vec<u64>>,
    /// Distance in meters [i][j] from location i to location j
    pub distances: Vec<Vec<u64>>,
    /// Number of locations
    pub size: usize,
}

impl TravelMatrices {
    pub fn empty() -> Self {
        Self {
            durations: vec![],
            distances: vec![],
            size: 0,
        }
    }

    /// Duration from location i to location j in seconds
    pub fn duration(&self, from: usize, to: usize) -> u64 {
        self.durations[from][to]
    }

    /// Distance from location i to location j in meters
    pub fn distance(&self, from: usize, to: usize) -> u64 {
        self.distances[from][to]
    }
}

/// Structured failure of a matrix request. These are recoverable at the
/// per-cluster boundary and must never crash the caller.
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    #[error("matrix request timed out")]
    Timeout,
    #[error("matrix endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("matrix response is missing durations/distances")]
    MissingMatrix,
    #[error("matrix request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Provider of travel duration/distance matrices between coordinates.
/// The first location is by convention the depot.
#[async_trait]
pub trait MatrixProvider: Send + Sync {
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<TravelMatrices, MatrixError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Haversine-based matrix estimation.
///
/// Straight-line distance scaled by a road coefficient, travel time from an
/// average speed. Good enough for development and deterministic tests; not
/// a substitute for a real routing engine in production.
pub struct HaversineMatrixProvider {
    road_coefficient: f64,
    average_speed_kmh: f64,
}

impl Default for HaversineMatrixProvider {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_kmh: 40.0,
        }
    }
}

impl HaversineMatrixProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(road_coefficient: f64, average_speed_kmh: f64) -> Self {
        Self {
            road_coefficient,
            average_speed_kmh,
        }
    }
}

#[async_trait]
impl MatrixProvider for HaversineMatrixProvider {
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<TravelMatrices, MatrixError> {
        let n = locations.len();
        if n == 0 {
            return Ok(TravelMatrices::empty());
        }

        let mut durations = vec![vec![0u64; n]; n];
        let mut distances = vec![vec![0u64; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let straight_km = haversine_km(&locations[i], &locations[j]);
                    let road_km = straight_km * self.road_coefficient;
                    distances[i][j] = (road_km * 1000.0) as u64;
                    durations[i][j] = (road_km / self.average_speed_kmh * 3600.0) as u64;
                }
            }
        }

        Ok(TravelMatrices {
            durations,
            distances,
            size: n,
        })
    }

    fn name(&self) -> &str {
        "HaversineEstimate"
    }
}

/// Create the matrix provider from configuration: ORS when an API key is
/// present, Haversine estimation otherwise.
pub fn create_matrix_provider(
    ors_url: &str,
    ors_api_key: Option<&str>,
) -> Box<dyn MatrixProvider> {
    use tracing::info;

    match ors_api_key {
        Some(key) if !key.is_empty() => {
            info!("Using OpenRouteService matrix provider at {}", ors_url);
            Box::new(OrsMatrixClient::new(OrsConfig::new(ors_url, key)))
        }
        _ => {
            info!("ORS_API_KEY not set — using Haversine matrix estimation");
            Box::new(HaversineMatrixProvider::new())
        }
    }
}
