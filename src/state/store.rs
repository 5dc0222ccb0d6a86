//! Sensor state store.
//!
//! Holds the latest accepted ranging and odometry frames behind a single
//! lock, so a snapshot always pairs frames that were each individually the
//! most recent at read time. The two frames are not guaranteed mutually
//! consistent in time; that approximation is accepted by every consumer.
//!
//! Writers: the receiver thread only. Readers: the fusion tick and the
//! navigation controller, via cloned snapshots between sleeps — the lock is
//! never held across a blocking wait.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::types::{OdometryFrame, RangingFrame, TelemetryFrame};

/// Latest accepted frames, both absent until telemetry arrives.
#[derive(Debug, Clone, Default)]
pub struct SensorState {
    /// Most recent ranging sweep.
    pub ranging: Option<RangingFrame>,
    /// Most recent odometry report.
    pub odometry: Option<OdometryFrame>,
}

impl SensorState {
    /// Latest heading in degrees, if any odometry has arrived.
    pub fn heading(&self) -> Option<f32> {
        self.odometry.as_ref().and_then(|o| o.heading())
    }

    /// Latest cumulative odometer reading, if any odometry has arrived.
    pub fn odometer(&self) -> Option<f32> {
        self.odometry.as_ref().and_then(|o| o.odometer())
    }

    /// Odometry field `index`, or `default` when absent or out of range.
    pub fn odometry_value(&self, index: usize, default: f32) -> f32 {
        self.odometry
            .as_ref()
            .and_then(|o| o.get(index))
            .unwrap_or(default)
    }

    /// Ranging beam `index`, or `default` when absent or out of range.
    pub fn ranging_value(&self, index: usize, default: f32) -> f32 {
        self.ranging
            .as_ref()
            .and_then(|r| r.get(index))
            .unwrap_or(default)
    }
}

/// Cloneable handle to the shared sensor state.
#[derive(Clone, Default)]
pub struct SensorStore {
    inner: Arc<Mutex<SensorState>>,
}

impl SensorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the matching frame atomically.
    pub fn update(&self, frame: TelemetryFrame) {
        let mut state = self.inner.lock();
        match frame {
            TelemetryFrame::Ranging(f) => state.ranging = Some(f),
            TelemetryFrame::Odometry(f) => state.odometry = Some(f),
        }
    }

    /// Immutable copy of both latest frames.
    pub fn snapshot(&self) -> SensorState {
        self.inner.lock().clone()
    }

    /// Latest heading in degrees, if available.
    pub fn heading(&self) -> Option<f32> {
        self.inner.lock().heading()
    }

    /// Latest cumulative odometer reading, if available.
    pub fn odometer(&self) -> Option<f32> {
        self.inner.lock().odometer()
    }
}
