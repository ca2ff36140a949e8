//! Store abstraction over the persistence operations the pipeline needs.
//!
//! The engine reads one snapshot at the start of a run and writes once per
//! cluster; keeping those operations behind a trait lets the pipeline be
//! tested against an in-memory store.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::queries;
use crate::types::{ClusterDraft, Coordinates, ItineraryEntry, StoredCluster, VisitPoint};

#[async_trait]
pub trait Store: Send + Sync {
    /// Home base coordinates, `None` if no depot is configured
    async fn get_depot(&self) -> Result<Option<Coordinates>>;

    /// Snapshot of appointments with resolved coordinates, stable order
    async fn list_points_with_coordinates(
        &self,
        default_visit_minutes: i32,
    ) -> Result<Vec<VisitPoint>>;

    /// Replace the full cluster set atomically, returning stored ids
    async fn replace_clusters(&self, drafts: Vec<ClusterDraft>) -> Result<Vec<StoredCluster>>;

    /// Replace one cluster's itinerary atomically
    async fn replace_itinerary(&self, cluster_id: i64, entries: &[ItineraryEntry]) -> Result<()>;
}

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_depot(&self) -> Result<Option<Coordinates>> {
        queries::depot::get_depot(&self.pool).await
    }

    async fn list_points_with_coordinates(
        &self,
        default_visit_minutes: i32,
    ) -> Result<Vec<VisitPoint>> {
        queries::appointment::list_points_with_coordinates(&self.pool, default_visit_minutes).await
    }

    async fn replace_clusters(&self, drafts: Vec<ClusterDraft>) -> Result<Vec<StoredCluster>> {
        queries::cluster::replace_clusters(&self.pool, drafts).await
    }

    async fn replace_itinerary(&self, cluster_id: i64, entries: &[ItineraryEntry]) -> Result<()> {
        queries::itinerary::replace_itinerary(&self.pool, cluster_id, entries).await
    }
}
