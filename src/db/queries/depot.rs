//! Depot queries

use anyhow::Result;
use sqlx::PgPool;

use crate::types::Coordinates;

/// The home base all tours start and end at. `None` when no depot has been
/// configured (a pipeline-level precondition failure).
pub async fn get_depot(pool: &PgPool) -> Result<Option<Coordinates>> {
    let row: Option<(f64, f64)> =
        sqlx::query_as("SELECT lat, lng FROM depots ORDER BY id LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(lat, lng)| Coordinates::new(lat, lng)))
}
