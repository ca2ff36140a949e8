//! Cluster queries

use std::collections::HashMap;

use anyhow::Result;
use sqlx::PgPool;

use crate::types::{ClusterDraft, StoredCluster};

/// Replace all clusters with a freshly computed set, atomically.
///
/// Ids are reused for clusters whose name already exists and only vanished
/// names are deleted. Itinerary rows are keyed by cluster id, so a cluster
/// that later fails to re-route keeps its previous rows addressable under
/// the same id instead of orphaning them against a dead one.
pub async fn replace_clusters(
    pool: &PgPool,
    drafts: Vec<ClusterDraft>,
) -> Result<Vec<StoredCluster>> {
    let mut tx = pool.begin().await?;

    let existing: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM clusters")
        .fetch_all(&mut *tx)
        .await?;
    let mut by_name: HashMap<String, i64> = existing
        .into_iter()
        .map(|(id, name)| (name, id))
        .collect();

    sqlx::query("DELETE FROM cluster_members").execute(&mut *tx).await?;

    let mut stored = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let cluster_id: i64 = match by_name.remove(&draft.name) {
            Some(id) => id,
            None => sqlx::query_scalar("INSERT INTO clusters (name) VALUES ($1) RETURNING id")
                .bind(&draft.name)
                .fetch_one(&mut *tx)
                .await?,
        };

        for point in &draft.points {
            sqlx::query(
                "INSERT INTO cluster_members (cluster_id, appointment_id) VALUES ($1, $2)",
            )
            .bind(cluster_id)
            .bind(point.id)
            .execute(&mut *tx)
            .await?;
        }

        stored.push(StoredCluster {
            id: cluster_id,
            name: draft.name,
            points: draft.points,
        });
    }

    // Names absent from the new generation
    for (_, stale_id) in by_name {
        sqlx::query("DELETE FROM clusters WHERE id = $1")
            .bind(stale_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(stored)
}
