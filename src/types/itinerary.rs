//! Itinerary entries: the realized per-stop timetable of a tour

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// One timestamped stop of a realized tour.
///
/// Entries for a cluster form a contiguous 0-based `sequence`; sequence 0
/// and the final sequence are both the depot. `point_id` is `None` for the
/// depot anchors.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryEntry {
    pub cluster_id: i64,
    pub point_id: Option<Uuid>,
    pub sequence: i32,
    pub depart_time: NaiveDateTime,
    pub arrive_time: NaiveDateTime,
    pub visit_duration_minutes: i32,
    /// Whole minutes of travel from the previous stop (floor of seconds / 60);
    /// zero for sequence 0, which has no predecessor
    pub travel_minutes_from_prev: i32,
    /// Distance from the previous stop in kilometers; zero for sequence 0
    pub distance_km_from_prev: f64,
}
