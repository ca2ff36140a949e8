//! Itinerary queries

use anyhow::Result;
use sqlx::PgPool;

use crate::types::ItineraryEntry;

/// Replace the itinerary of one cluster atomically.
///
/// Delete and insert run in one transaction so a concurrent reader never
/// observes the cluster with zero itinerary rows. The delete only happens
/// once a replacement has actually been computed — failed clusters keep
/// their previous rows.
pub async fn replace_itinerary(
    pool: &PgPool,
    cluster_id: i64,
    entries: &[ItineraryEntry],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM itineraries WHERE cluster_id = $1")
        .bind(cluster_id)
        .execute(&mut *tx)
        .await?;

    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO itineraries
                (cluster_id, point_id, sequence, depart_time, arrive_time,
                 visit_duration_minutes, travel_minutes_from_prev, distance_km_from_prev)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.cluster_id)
        .bind(entry.point_id)
        .bind(entry.sequence)
        .bind(entry.depart_time)
        .bind(entry.arrive_time)
        .bind(entry.visit_duration_minutes)
        .bind(entry.travel_minutes_from_prev)
        .bind(entry.distance_km_from_prev)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
