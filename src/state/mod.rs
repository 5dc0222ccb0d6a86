//! Thread-safe shared state: latest sensor frames and the fused world
//! snapshot for downstream readers.

pub mod store;
pub mod world;

pub use store::{SensorState, SensorStore};
pub use world::{WorldSnapshot, WorldState};
