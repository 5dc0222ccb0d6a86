//! Fused world state published by the fusion thread.
//!
//! The fusion engine owns its working state privately and publishes an
//! immutable [`WorldSnapshot`] after each tick. Readers (the navigation
//! controller, the application facade) only ever see whole snapshots, so a
//! reader can never observe a half-updated pose or a path missing its latest
//! point.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::types::{Point2D, Pose};

/// One consistent view of the fused world.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    /// Current dead-reckoned pose.
    pub pose: Pose,
    /// Traveled path, oldest first, starting at the origin.
    pub path: Vec<Point2D>,
    /// Accumulated obstacle points, oldest first.
    pub obstacles: Vec<Point2D>,
    /// Fusion tick counter at publish time.
    pub tick: u64,
}

/// Cloneable handle to the latest published snapshot.
#[derive(Clone, Default)]
pub struct WorldState {
    inner: Arc<RwLock<WorldSnapshot>>,
}

impl WorldState {
    /// Create a handle holding an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: WorldSnapshot) {
        *self.inner.write() = snapshot;
    }

    /// Clone the latest snapshot.
    pub fn snapshot(&self) -> WorldSnapshot {
        self.inner.read().clone()
    }

    /// Latest fused pose.
    pub fn pose(&self) -> Pose {
        self.inner.read().pose
    }

    /// Latest traveled path.
    pub fn path(&self) -> Vec<Point2D> {
        self.inner.read().path.clone()
    }

    /// Latest obstacle points.
    pub fn obstacle_points(&self) -> Vec<Point2D> {
        self.inner.read().obstacles.clone()
    }
}
