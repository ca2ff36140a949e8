//! The optimization pipeline: snapshot → clusters → tours → itineraries.
//!
//! One run regenerates everything from the current snapshot. Per-cluster
//! failures are collected into the run report and never abort the batch;
//! only a missing depot or an empty snapshot is fatal.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Store;
use crate::defaults;
use crate::services::clustering::{self, ClusterStrategy};
use crate::services::matrix::MatrixProvider;
use crate::services::sequencer::{self, ClusterFailure};
use crate::services::timeline;
use crate::types::ExcludedPoint;

/// Parameters of one optimization run
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    pub capacity: usize,
    pub max_leg_km: f64,
    pub strategy: ClusterStrategy,
    /// Departure time from the depot (combined with today's date)
    pub start_time: NaiveTime,
    /// Visit duration for appointments without an explicit one
    pub default_visit_minutes: i32,
    /// Wall-clock budget for each cluster's tour improvement search
    pub solver_budget: Duration,
    /// Seed for the solver's perturbation step
    pub seed: u64,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            capacity: defaults::DEFAULT_CAPACITY,
            max_leg_km: defaults::DEFAULT_MAX_LEG_KM,
            strategy: ClusterStrategy::default(),
            start_time: defaults::default_start_time(),
            default_visit_minutes: defaults::DEFAULT_VISIT_MINUTES,
            solver_budget: Duration::from_secs(defaults::DEFAULT_SOLVER_BUDGET_SECS),
            seed: 0,
        }
    }
}

/// A cluster the run could not route, with the named reason
#[derive(Debug)]
pub struct SkippedCluster {
    pub cluster_id: i64,
    pub name: String,
    pub failure: ClusterFailure,
}

/// Aggregate result of one optimization run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub clusters_total: usize,
    pub clusters_routed: usize,
    pub skipped: Vec<SkippedCluster>,
    pub excluded_points: Vec<ExcludedPoint>,
}

impl RunReport {
    /// Every cluster was routed and no point was excluded
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.excluded_points.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}/{} clusters routed, {} skipped, {} points excluded",
            self.clusters_routed,
            self.clusters_total,
            self.skipped.len(),
            self.excluded_points.len()
        )
    }
}

/// Run the full optimization pipeline against the given store and matrix
/// provider.
pub async fn run_optimize(
    store: &dyn Store,
    provider: &dyn MatrixProvider,
    options: &OptimizeOptions,
) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    info!("Starting optimization run {}", run_id);

    let depot = store
        .get_depot()
        .await?
        .context("no depot configured, cannot plan tours")?;
    if !depot.is_valid_geocode() {
        bail!("depot coordinates are not a valid geocode");
    }

    let points = store
        .list_points_with_coordinates(options.default_visit_minutes)
        .await?;
    if points.is_empty() {
        bail!("no appointments with resolved coordinates, nothing to plan");
    }

    let outcome = clustering::cluster_points(
        &points,
        depot,
        options.capacity,
        options.max_leg_km,
        options.strategy,
    )?;
    let mut excluded_points = outcome.excluded;

    info!(
        "Clustered {} points into {} clusters ({} excluded)",
        points.len() - excluded_points.len(),
        outcome.clusters.len(),
        excluded_points.len()
    );

    let clusters = store.replace_clusters(outcome.clusters).await?;

    let start_time = chrono::Local::now().date_naive().and_time(options.start_time);

    let mut clusters_routed = 0;
    let mut skipped = Vec::new();

    for cluster in &clusters {
        match sequencer::sequence_cluster(
            cluster,
            depot,
            provider,
            options.solver_budget,
            options.seed,
        )
        .await
        {
            Ok(sequenced) => {
                excluded_points.extend(sequenced.excluded.iter().cloned());
                let entries =
                    timeline::build_timeline(&sequenced.tour, &sequenced.matrices, start_time);
                store.replace_itinerary(cluster.id, &entries).await?;
                info!(
                    "Cluster {} routed: {} stops, {:.1} km",
                    cluster.name,
                    entries.len(),
                    sequenced.tour.total_distance_meters as f64 / 1000.0
                );
                clusters_routed += 1;
            }
            Err(failure) => {
                // Skip this cluster, keep its previous itinerary rows, and
                // continue with the rest of the batch.
                warn!("Cluster {} skipped: {}", cluster.name, failure);
                skipped.push(SkippedCluster {
                    cluster_id: cluster.id,
                    name: cluster.name.clone(),
                    failure,
                });
            }
        }
    }

    let report = RunReport {
        run_id,
        clusters_total: clusters.len(),
        clusters_routed,
        skipped,
        excluded_points,
    };
    info!("Run {} finished: {}", run_id, report.summary());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::matrix::{
        HaversineMatrixProvider, MatrixError, TravelMatrices,
    };
    use crate::types::{
        ClusterDraft, Coordinates, ItineraryEntry, StoredCluster, VisitPoint,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const KM_LAT: f64 = 1.0 / 111.195;

    fn options() -> OptimizeOptions {
        OptimizeOptions {
            solver_budget: Duration::from_millis(50),
            ..OptimizeOptions::default()
        }
    }

    fn visit_at_km(km_north: f64) -> VisitPoint {
        VisitPoint {
            id: Uuid::new_v4(),
            coordinates: Coordinates::new(46.0 + km_north * KM_LAT, 4.0),
            visit_duration_minutes: 45,
        }
    }

    /// In-memory store mirroring the Postgres store's replacement
    /// semantics: cluster ids are reused by name across runs, so
    /// preserved itinerary rows stay addressable after a regeneration.
    struct InMemoryStore {
        depot: Option<Coordinates>,
        points: Vec<VisitPoint>,
        clusters: Mutex<Vec<StoredCluster>>,
        next_id: Mutex<i64>,
        itineraries: Mutex<HashMap<i64, Vec<ItineraryEntry>>>,
    }

    impl InMemoryStore {
        fn new(depot: Option<Coordinates>, points: Vec<VisitPoint>) -> Self {
            Self {
                depot,
                points,
                clusters: Mutex::new(vec![]),
                next_id: Mutex::new(1),
                itineraries: Mutex::new(HashMap::new()),
            }
        }

        fn itinerary(&self, cluster_id: i64) -> Option<Vec<ItineraryEntry>> {
            self.itineraries.lock().unwrap().get(&cluster_id).cloned()
        }

        fn stored_clusters(&self) -> Vec<StoredCluster> {
            self.clusters.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Store for InMemoryStore {
        async fn get_depot(&self) -> Result<Option<Coordinates>> {
            Ok(self.depot)
        }

        async fn list_points_with_coordinates(
            &self,
            _default_visit_minutes: i32,
        ) -> Result<Vec<VisitPoint>> {
            Ok(self.points.clone())
        }

        async fn replace_clusters(&self, drafts: Vec<ClusterDraft>) -> Result<Vec<StoredCluster>> {
            let mut clusters = self.clusters.lock().unwrap();
            let mut next_id = self.next_id.lock().unwrap();
            let previous: HashMap<String, i64> =
                clusters.iter().map(|c| (c.name.clone(), c.id)).collect();

            let stored: Vec<StoredCluster> = drafts
                .into_iter()
                .map(|draft| {
                    let id = previous.get(&draft.name).copied().unwrap_or_else(|| {
                        let id = *next_id;
                        *next_id += 1;
                        id
                    });
                    StoredCluster {
                        id,
                        name: draft.name,
                        points: draft.points,
                    }
                })
                .collect();

            *clusters = stored.clone();
            Ok(stored)
        }

        async fn replace_itinerary(
            &self,
            cluster_id: i64,
            entries: &[ItineraryEntry],
        ) -> Result<()> {
            self.itineraries
                .lock()
                .unwrap()
                .insert(cluster_id, entries.to_vec());
            Ok(())
        }
    }

    /// Provider that fails with an HTTP error whenever the requested
    /// locations include one near the poisoned coordinate.
    struct FlakyProvider {
        inner: HaversineMatrixProvider,
        poison: Coordinates,
    }

    #[async_trait]
    impl crate::services::matrix::MatrixProvider for FlakyProvider {
        async fn get_matrices(
            &self,
            locations: &[Coordinates],
        ) -> Result<TravelMatrices, MatrixError> {
            let poisoned = locations.iter().any(|c| {
                (c.lat - self.poison.lat).abs() < 0.001 && (c.lng - self.poison.lng).abs() < 0.001
            });
            if poisoned {
                return Err(MatrixError::Http {
                    status: 500,
                    body: "internal error".to_string(),
                });
            }
            self.inner.get_matrices(locations).await
        }

        fn name(&self) -> &str {
            "FlakyProvider"
        }
    }

    #[tokio::test]
    async fn test_happy_path_routes_every_cluster() {
        // Two geographic blobs 100 km apart, capacity 3
        let points = vec![
            visit_at_km(1.0),
            visit_at_km(2.0),
            visit_at_km(3.0),
            visit_at_km(100.0),
            visit_at_km(102.0),
        ];
        let store = InMemoryStore::new(Some(Coordinates::new(46.0, 4.0)), points.clone());
        let provider = HaversineMatrixProvider::new();
        let opts = OptimizeOptions {
            capacity: 3,
            max_leg_km: 30.0,
            ..options()
        };

        let report = run_optimize(&store, &provider, &opts).await.unwrap();

        assert_eq!(report.clusters_total, 2);
        assert_eq!(report.clusters_routed, 2);
        assert!(report.is_complete());

        // Coverage: union of cluster members equals the input point set
        let clusters = store.stored_clusters();
        let mut member_ids: Vec<Uuid> = clusters
            .iter()
            .flat_map(|c| c.points.iter().map(|p| p.id))
            .collect();
        member_ids.sort();
        let mut input_ids: Vec<Uuid> = points.iter().map(|p| p.id).collect();
        input_ids.sort();
        assert_eq!(member_ids, input_ids);

        for cluster in &clusters {
            let entries = store.itinerary(cluster.id).expect("itinerary written");
            // Depot anchors at both ends, one entry per visit in between
            assert_eq!(entries.len(), cluster.points.len() + 2);
            assert!(entries.first().unwrap().point_id.is_none());
            assert!(entries.last().unwrap().point_id.is_none());
            // Contiguous sequence, monotone timestamps
            for (i, entry) in entries.iter().enumerate() {
                assert_eq!(entry.sequence, i as i32);
                assert!(entry.depart_time >= entry.arrive_time);
            }
            for pair in entries.windows(2) {
                assert!(pair[1].arrive_time >= pair[0].depart_time);
            }
        }
    }

    #[tokio::test]
    async fn test_provider_failure_skips_cluster_and_preserves_prior_rows() {
        // Three blobs far apart → three clusters of one to two points each
        let blob_a = vec![visit_at_km(1.0), visit_at_km(2.0)];
        let blob_b = vec![visit_at_km(100.0), visit_at_km(101.0)];
        let blob_c = vec![visit_at_km(200.0), visit_at_km(201.0)];
        let mut points = blob_a.clone();
        points.extend(blob_b.clone());
        points.extend(blob_c.clone());

        let store = InMemoryStore::new(Some(Coordinates::new(46.0, 4.0)), points);
        let good = HaversineMatrixProvider::new();
        let opts = OptimizeOptions {
            capacity: 3,
            max_leg_km: 30.0,
            ..options()
        };

        // First run succeeds everywhere and seeds itineraries
        let first = run_optimize(&store, &good, &opts).await.unwrap();
        assert_eq!(first.clusters_routed, 3);

        let poisoned_cluster = store
            .stored_clusters()
            .into_iter()
            .find(|c| c.points.iter().any(|p| p.id == blob_b[0].id))
            .unwrap();
        let prior_entries = store.itinerary(poisoned_cluster.id).unwrap();

        // Second run: the provider fails for the middle blob
        let flaky = FlakyProvider {
            inner: HaversineMatrixProvider::new(),
            poison: blob_b[0].coordinates,
        };
        let second = run_optimize(&store, &flaky, &opts).await.unwrap();

        assert_eq!(second.clusters_total, 3);
        assert_eq!(second.clusters_routed, 2);
        assert_eq!(second.skipped.len(), 1);
        assert!(matches!(
            second.skipped[0].failure,
            ClusterFailure::Provider(MatrixError::Http { status: 500, .. })
        ));

        // The failed cluster keeps the rows from the first run
        let preserved = store.itinerary(poisoned_cluster.id).unwrap();
        assert_eq!(preserved.len(), prior_entries.len());
        assert_eq!(preserved[0].arrive_time, prior_entries[0].arrive_time);
    }

    #[tokio::test]
    async fn test_rerun_replaces_rather_than_duplicates() {
        let points = vec![visit_at_km(1.0), visit_at_km(2.0), visit_at_km(3.0)];
        let store = InMemoryStore::new(Some(Coordinates::new(46.0, 4.0)), points);
        let provider = HaversineMatrixProvider::new();
        let opts = options();

        let first = run_optimize(&store, &provider, &opts).await.unwrap();
        let clusters_after_first = store.stored_clusters();
        let entries_after_first = store.itinerary(clusters_after_first[0].id).unwrap();

        let second = run_optimize(&store, &provider, &opts).await.unwrap();
        let clusters_after_second = store.stored_clusters();
        let entries_after_second = store.itinerary(clusters_after_second[0].id).unwrap();

        assert_eq!(first.clusters_total, second.clusters_total);
        assert_eq!(clusters_after_first.len(), clusters_after_second.len());
        assert_eq!(entries_after_first.len(), entries_after_second.len());

        // Surviving cluster names keep their ids, so itinerary rows stay
        // addressable across regenerations
        let first_ids: Vec<i64> = clusters_after_first.iter().map(|c| c.id).collect();
        let second_ids: Vec<i64> = clusters_after_second.iter().map(|c| c.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_sentinel_point_excluded_everywhere() {
        let ungeocoded = VisitPoint {
            id: Uuid::new_v4(),
            coordinates: Coordinates::new(0.0, 0.0),
            visit_duration_minutes: 45,
        };
        let points = vec![visit_at_km(1.0), ungeocoded.clone(), visit_at_km(2.0)];
        let store = InMemoryStore::new(Some(Coordinates::new(46.0, 4.0)), points);
        let provider = HaversineMatrixProvider::new();

        let report = run_optimize(&store, &provider, &options()).await.unwrap();

        assert_eq!(report.excluded_points.len(), 1);
        assert_eq!(report.excluded_points[0].id, ungeocoded.id);

        for cluster in store.stored_clusters() {
            assert!(!cluster.points.iter().any(|p| p.id == ungeocoded.id));
            if let Some(entries) = store.itinerary(cluster.id) {
                assert!(!entries.iter().any(|e| e.point_id == Some(ungeocoded.id)));
            }
        }
    }

    #[tokio::test]
    async fn test_missing_depot_is_fatal() {
        let store = InMemoryStore::new(None, vec![visit_at_km(1.0)]);
        let provider = HaversineMatrixProvider::new();

        let result = run_optimize(&store, &provider, &options()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_fatal() {
        let store = InMemoryStore::new(Some(Coordinates::new(46.0, 4.0)), vec![]);
        let provider = HaversineMatrixProvider::new();

        let result = run_optimize(&store, &provider, &options()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_depot_is_fatal() {
        let store = InMemoryStore::new(Some(Coordinates::new(0.0, 0.0)), vec![visit_at_km(1.0)]);
        let provider = HaversineMatrixProvider::new();

        let result = run_optimize(&store, &provider, &options()).await;
        assert!(result.is_err());
    }
}
