//! Per-cluster tour sequencing.
//!
//! Builds the depot-anchored node list for one cluster, fetches the travel
//! matrices, and solves the visit order. Every failure here is recoverable
//! at the cluster level: the pipeline skips the cluster and moves on.

use std::time::Duration;

use tracing::{debug, warn};

use crate::services::matrix::{MatrixError, MatrixProvider, TravelMatrices};
use crate::services::solver;
use crate::types::{Coordinates, ExcludedPoint, StoredCluster, Tour, TourNode, TourStop};

/// Minimum node count for sequencing to be meaningful:
/// depot + depot + at least one visit.
const MIN_NODES: usize = 3;

/// Why a cluster could not be sequenced. All variants are recovered at the
/// per-cluster boundary; the run continues with the next cluster.
#[derive(Debug, thiserror::Error)]
pub enum ClusterFailure {
    #[error("too few routable nodes ({valid}, need at least {MIN_NODES})")]
    TooSmall { valid: usize },
    #[error("distance provider failed: {0}")]
    Provider(#[from] MatrixError),
    #[error("no feasible tour found within the time budget")]
    NoSolution,
}

/// A sequenced cluster: the tour plus the matrices it was solved against
/// (the timeline builder needs both), and any nodes dropped on the way.
#[derive(Debug)]
pub struct SequencedCluster {
    pub tour: Tour,
    pub matrices: TravelMatrices,
    pub excluded: Vec<ExcludedPoint>,
}

/// Sequence one cluster into a depot-anchored tour minimizing total travel
/// duration.
pub async fn sequence_cluster(
    cluster: &StoredCluster,
    depot: Coordinates,
    provider: &dyn MatrixProvider,
    time_budget: Duration,
    seed: u64,
) -> Result<SequencedCluster, ClusterFailure> {
    // Node list: [depot] + visits + [depot]; the depot appears twice as
    // fixed start/end anchors.
    let mut nodes: Vec<TourNode> = vec![TourNode::Depot];
    let mut coords: Vec<Coordinates> = vec![depot];
    let mut excluded = Vec::new();

    for point in &cluster.points {
        match point.coordinates.geocode_issue() {
            None => {
                nodes.push(TourNode::Visit {
                    point_id: point.id,
                    visit_minutes: point.visit_duration_minutes,
                });
                coords.push(point.coordinates);
            }
            Some(issue) => {
                warn!(
                    "Dropping point {} from cluster {}: {}",
                    point.id, cluster.name, issue
                );
                excluded.push(ExcludedPoint {
                    id: point.id,
                    coordinates: point.coordinates,
                    issue,
                });
            }
        }
    }

    nodes.push(TourNode::Depot);
    coords.push(depot);

    if nodes.len() < MIN_NODES {
        return Err(ClusterFailure::TooSmall { valid: nodes.len() });
    }

    debug!(
        "Sequencing cluster {} ({} visits) via {}",
        cluster.name,
        nodes.len() - 2,
        provider.name()
    );

    let matrices = provider.get_matrices(&coords).await?;

    let solution = solver::solve_open_path(&matrices.durations, time_budget, seed)
        .ok_or(ClusterFailure::NoSolution)?;

    let total_distance_meters = solution
        .order
        .windows(2)
        .map(|w| matrices.distance(w[0], w[1]))
        .fold(0u64, u64::saturating_add);

    let stops: Vec<TourStop> = solution
        .order
        .iter()
        .map(|&idx| TourStop {
            node: nodes[idx],
            matrix_idx: idx,
        })
        .collect();

    debug!(
        "Cluster {} sequenced: {} s travel, {:.1} km",
        cluster.name,
        solution.total_duration,
        total_distance_meters as f64 / 1000.0
    );

    Ok(SequencedCluster {
        tour: Tour {
            cluster_id: cluster.id,
            stops,
            total_travel_seconds: solution.total_duration,
            total_distance_meters,
        },
        matrices,
        excluded,
    })
}
