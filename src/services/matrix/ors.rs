//! OpenRouteService matrix client
//!
//! ORS matrix API documentation:
//! https://openrouteservice.org/dev/#/api-docs/v2/matrix/{profile}/post

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{MatrixError, MatrixProvider, TravelMatrices, UNREACHABLE_COST};
use crate::types::Coordinates;

/// ORS client configuration
#[derive(Debug, Clone)]
pub struct OrsConfig {
    /// Base URL (e.g. "https://api.openrouteservice.org")
    pub base_url: String,
    /// API key sent in the Authorization header
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl OrsConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_seconds: 30,
        }
    }
}

/// OpenRouteService matrix client
pub struct OrsMatrixClient {
    client: Client,
    config: OrsConfig,
}

impl OrsMatrixClient {
    pub fn new(config: OrsConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn build_matrix_request(&self, locations: &[Coordinates]) -> OrsMatrixRequest {
        OrsMatrixRequest {
            // ORS expects [lng, lat] order
            locations: locations.iter().map(|c| [c.lng, c.lat]).collect(),
            metrics: vec!["duration".to_string(), "distance".to_string()],
            units: "m".to_string(),
        }
    }
}

#[async_trait]
impl MatrixProvider for OrsMatrixClient {
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<TravelMatrices, MatrixError> {
        let n = locations.len();

        if n == 0 {
            return Ok(TravelMatrices::empty());
        }

        if n == 1 {
            return Ok(TravelMatrices {
                durations: vec![vec![0]],
                distances: vec![vec![0]],
                size: 1,
            });
        }

        let request = self.build_matrix_request(locations);
        let url = format!("{}/v2/matrix/driving-car", self.config.base_url);

        debug!("Requesting travel matrix from ORS for {} locations", n);

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MatrixError::Timeout
                } else {
                    MatrixError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MatrixError::Http { status, body });
        }

        let matrix_response: OrsMatrixResponse = response.json().await?;

        let (raw_durations, raw_distances) =
            match (matrix_response.durations, matrix_response.distances) {
                (Some(d), Some(m)) => (d, m),
                _ => return Err(MatrixError::MissingMatrix),
            };

        if raw_durations.len() != n || raw_distances.len() != n {
            return Err(MatrixError::MissingMatrix);
        }

        let (durations, distances) = convert_matrices(&raw_durations, &raw_distances, n);

        debug!("Received travel matrix from ORS: {}x{}", n, n);

        Ok(TravelMatrices {
            durations,
            distances,
            size: n,
        })
    }

    fn name(&self) -> &str {
        "OpenRouteService"
    }
}

/// ORS returns floats with `null` for unroutable pairs. A leg missing
/// either metric is unreachable in both matrices; the solver only looks
/// at durations, so a null distance must poison the duration too or the
/// leg would sneak a bogus distance into the tour totals.
fn convert_matrices(
    raw_durations: &[Vec<Option<f64>>],
    raw_distances: &[Vec<Option<f64>>],
    n: usize,
) -> (Vec<Vec<u64>>, Vec<Vec<u64>>) {
    let usable = |v: &f64| v.is_finite() && *v >= 0.0;

    let mut durations = vec![vec![0u64; n]; n];
    let mut distances = vec![vec![0u64; n]; n];
    for i in 0..n {
        for j in 0..n {
            let duration = raw_durations[i].get(j).copied().flatten().filter(usable);
            let distance = raw_distances[i].get(j).copied().flatten().filter(usable);
            match (duration, distance) {
                (Some(d), Some(m)) => {
                    durations[i][j] = d.round() as u64;
                    distances[i][j] = m.round() as u64;
                }
                _ => {
                    warn!("Unroutable leg {} -> {}", i, j);
                    durations[i][j] = UNREACHABLE_COST;
                    distances[i][j] = UNREACHABLE_COST;
                }
            }
        }
    }
    (durations, distances)
}

// ORS API types

#[derive(Debug, Serialize)]
struct OrsMatrixRequest {
    locations: Vec<[f64; 2]>,
    metrics: Vec<String>,
    units: String,
}

#[derive(Debug, Deserialize)]
struct OrsMatrixResponse {
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}
