//! Timetable construction for a sequenced tour.
//!
//! Walks the tour in order with a running clock: arrival is the previous
//! departure plus the travel leg, departure is arrival plus the visit
//! duration. One entry per stop, the depot anchors included: sequence 0
//! departs at the start time with no travel leg, the final sequence is the
//! return to the depot.

use chrono::{Duration as ChronoDuration, NaiveDateTime};

use crate::services::matrix::TravelMatrices;
use crate::types::{ItineraryEntry, Tour};

/// Build the per-stop timetable for a tour.
///
/// Entries form a contiguous 0-based sequence; depart/arrive timestamps
/// are monotonically non-decreasing. Travel minutes are whole minutes
/// (floor of seconds / 60), distances are kilometers.
pub fn build_timeline(
    tour: &Tour,
    matrices: &TravelMatrices,
    start_time: NaiveDateTime,
) -> Vec<ItineraryEntry> {
    let mut entries = Vec::with_capacity(tour.stops.len());
    let mut clock = start_time;
    let mut prev_idx: Option<usize> = None;

    for (sequence, stop) in tour.stops.iter().enumerate() {
        let (travel_seconds, distance_meters) = match prev_idx {
            Some(prev) => (
                matrices.duration(prev, stop.matrix_idx),
                matrices.distance(prev, stop.matrix_idx),
            ),
            None => (0, 0),
        };

        let arrive = clock + ChronoDuration::seconds(travel_seconds as i64);
        let visit_minutes = stop.node.visit_minutes();
        let depart = arrive + ChronoDuration::minutes(visit_minutes as i64);

        entries.push(ItineraryEntry {
            cluster_id: tour.cluster_id,
            point_id: stop.node.point_id(),
            sequence: sequence as i32,
            depart_time: depart,
            arrive_time: arrive,
            visit_duration_minutes: visit_minutes,
            travel_minutes_from_prev: (travel_seconds / 60) as i32,
            distance_km_from_prev: distance_meters as f64 / 1000.0,
        });

        clock = depart;
        prev_idx = Some(stop.matrix_idx);
    }

    entries
}
