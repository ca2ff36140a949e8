//! Database queries

pub mod appointment;
pub mod cluster;
pub mod depot;
pub mod itinerary;
