pub mod clustering;
pub mod geo;
pub mod geocoding;
pub mod matrix;
pub mod pipeline;
pub mod sequencer;
pub mod solver;
pub mod timeline;
