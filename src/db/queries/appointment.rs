//! Appointment queries

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::{Coordinates, VisitPoint};

#[derive(Debug, sqlx::FromRow)]
struct PointRow {
    id: Uuid,
    lat: f64,
    lng: f64,
    visit_duration_minutes: i32,
}

/// Appointments that have a resolved location, in stable creation order.
/// Appointments without an explicit visit duration get the default.
pub async fn list_points_with_coordinates(
    pool: &PgPool,
    default_visit_minutes: i32,
) -> Result<Vec<VisitPoint>> {
    let rows = sqlx::query_as::<_, PointRow>(
        r#"
        SELECT
            a.id, l.lat, l.lng,
            COALESCE(a.visit_duration_minutes, $1) AS visit_duration_minutes
        FROM appointments a
        JOIN locations l ON l.appointment_id = a.id
        ORDER BY a.created_at, a.id
        "#,
    )
    .bind(default_visit_minutes)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| VisitPoint {
            id: r.id,
            coordinates: Coordinates::new(r.lat, r.lng),
            visit_duration_minutes: r.visit_duration_minutes,
        })
        .collect())
}

/// An appointment still awaiting geocoding
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UnresolvedAppointment {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

impl UnresolvedAppointment {
    /// Single-line address for the geocoder
    pub fn full_address(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}

/// Appointments that have no location row yet
pub async fn list_unresolved(pool: &PgPool) -> Result<Vec<UnresolvedAppointment>> {
    let rows = sqlx::query_as::<_, UnresolvedAppointment>(
        r#"
        SELECT a.id, a.street, a.city, a.postal_code
        FROM appointments a
        LEFT JOIN locations l ON l.appointment_id = a.id
        WHERE l.id IS NULL
        ORDER BY a.created_at, a.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Store (or overwrite) the resolved location of an appointment
pub async fn set_location(pool: &PgPool, appointment_id: Uuid, coords: Coordinates) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO locations (appointment_id, lat, lng)
        VALUES ($1, $2, $3)
        ON CONFLICT (appointment_id)
        DO UPDATE SET lat = EXCLUDED.lat, lng = EXCLUDED.lng
        "#,
    )
    .bind(appointment_id)
    .bind(coords.lat)
    .bind(coords.lng)
    .execute(pool)
    .await?;

    Ok(())
}
