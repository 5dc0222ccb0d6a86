//! Core foundation: shared types and angular math.

pub mod math;
pub mod types;
