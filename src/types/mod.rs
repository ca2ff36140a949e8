//! Type definitions

pub mod cluster;
pub mod itinerary;
pub mod point;
pub mod tour;

pub use cluster::*;
pub use itinerary::*;
pub use point::*;
pub use tour::*;
