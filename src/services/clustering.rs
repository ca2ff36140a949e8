//! Capacity- and proximity-bounded clustering of visit points.
//!
//! Two strategies are available. `SeedExpansion` is the default: take the
//! first unassigned point as a seed and greedily pull in its nearest
//! neighbours while capacity allows and they stay within `max_leg_km` of
//! the seed. `DepotSweep` sorts all points by distance from the depot and
//! slices the sorted sequence into runs. Both are deterministic for a
//! fixed input order.

use anyhow::{bail, Result};
use tracing::debug;

use crate::services::geo::haversine_km;
use crate::types::{ClusterDraft, Coordinates, ExcludedPoint, VisitPoint};

/// Grouping strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ClusterStrategy {
    /// Nearest-neighbour expansion around per-cluster seed points
    #[default]
    SeedExpansion,
    /// Slice points sorted by their distance from the depot
    DepotSweep,
}

/// Result of a clustering pass. Points with unusable coordinates are
/// reported in `excluded`, never silently dropped.
#[derive(Debug)]
pub struct ClusterOutcome {
    pub clusters: Vec<ClusterDraft>,
    pub excluded: Vec<ExcludedPoint>,
}

/// Partition `points` into clusters of at most `capacity` members.
///
/// Every valid point ends up in exactly one cluster. With `SeedExpansion`
/// every member is within `max_leg_km` of its cluster's seed (a star-shaped
/// bound, not a pairwise one). Zero valid points yields an empty cluster
/// list, not an error.
pub fn cluster_points(
    points: &[VisitPoint],
    depot: Coordinates,
    capacity: usize,
    max_leg_km: f64,
    strategy: ClusterStrategy,
) -> Result<ClusterOutcome> {
    if capacity < 1 {
        bail!("cluster capacity must be at least 1 (got {})", capacity);
    }
    if !(max_leg_km > 0.0) {
        bail!("max leg distance must be positive (got {})", max_leg_km);
    }

    let mut valid = Vec::with_capacity(points.len());
    let mut excluded = Vec::new();
    for point in points {
        match point.coordinates.geocode_issue() {
            None => valid.push(point.clone()),
            Some(issue) => {
                debug!("Excluding point {} from clustering: {}", point.id, issue);
                excluded.push(ExcludedPoint {
                    id: point.id,
                    coordinates: point.coordinates,
                    issue,
                });
            }
        }
    }

    let groups = match strategy {
        ClusterStrategy::SeedExpansion => seed_expansion(valid, capacity, max_leg_km),
        ClusterStrategy::DepotSweep => depot_sweep(valid, depot, capacity, max_leg_km),
    };

    let clusters = groups
        .into_iter()
        .enumerate()
        .map(|(i, points)| ClusterDraft {
            name: format!("Cluster {}", i + 1),
            points,
        })
        .collect();

    Ok(ClusterOutcome { clusters, excluded })
}

/// Seed the next cluster with the first remaining point, then add the
/// nearest remaining points (stable order on ties) while the cluster is
/// below capacity and the candidate is within `max_leg_km` of the seed.
fn seed_expansion(
    mut remaining: Vec<VisitPoint>,
    capacity: usize,
    max_leg_km: f64,
) -> Vec<Vec<VisitPoint>> {
    let mut groups = Vec::new();

    while !remaining.is_empty() {
        let seed = remaining.remove(0);
        let seed_coords = seed.coordinates;
        let mut members = vec![seed];

        let mut by_distance: Vec<(usize, f64)> = remaining
            .iter()
            .enumerate()
            .map(|(i, p)| (i, haversine_km(&seed_coords, &p.coordinates)))
            .collect();
        // Stable: equal distances keep input order
        by_distance.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut taken = vec![false; remaining.len()];
        for (idx, distance) in by_distance {
            if members.len() >= capacity {
                break;
            }
            if distance <= max_leg_km {
                members.push(remaining[idx].clone());
                taken[idx] = true;
            }
        }

        remaining = remaining
            .into_iter()
            .zip(taken)
            .filter_map(|(p, t)| (!t).then_some(p))
            .collect();

        groups.push(members);
    }

    groups
}

/// Sort points by geodesic distance from the depot and slice the sorted
/// sequence into a new run whenever the current run is full or the jump in
/// depot distance from the previous point exceeds `max_leg_km`.
fn depot_sweep(
    points: Vec<VisitPoint>,
    depot: Coordinates,
    capacity: usize,
    max_leg_km: f64,
) -> Vec<Vec<VisitPoint>> {
    if points.is_empty() {
        return vec![];
    }

    let mut with_distance: Vec<(VisitPoint, f64)> = points
        .into_iter()
        .map(|p| {
            let d = haversine_km(&depot, &p.coordinates);
            (p, d)
        })
        .collect();
    with_distance.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut groups: Vec<Vec<VisitPoint>> = Vec::new();
    let mut current: Vec<VisitPoint> = Vec::new();
    let mut prev_distance = 0.0;

    for (point, distance) in with_distance {
        let gap = distance - prev_distance;
        if !current.is_empty() && (current.len() >= capacity || gap > max_leg_km) {
            groups.push(std::mem::take(&mut current));
        }
        prev_distance = distance;
        current.push(point);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}
