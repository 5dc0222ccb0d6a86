//! Pose and map fusion: dead reckoning from odometry plus obstacle
//! projection from ranging sweeps.

pub mod engine;

pub use engine::{FusionConfig, FusionEngine};
