//! Fixed-rate fusion tick loop.
//!
//! Every tick reads the latest sensor snapshot, advances the fusion engine,
//! and publishes the resulting world snapshot. The loop sleeps the remainder
//! of the interval after each tick; a tick that overruns just starts the next
//! one immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::fusion::engine::FusionEngine;
use crate::state::store::SensorStore;
use crate::state::world::WorldState;

/// Handle to the running fusion tick thread.
pub struct FusionThread {
    handle: Option<JoinHandle<()>>,
}

impl FusionThread {
    /// Spawn the tick loop; the thread takes ownership of the engine.
    pub fn spawn(
        mut engine: FusionEngine,
        store: SensorStore,
        world: WorldState,
        tick_interval: Duration,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("fusion".to_string())
            .spawn(move || {
                log::info!(
                    "fusion loop started, tick interval {} ms",
                    tick_interval.as_millis()
                );
                // Publish the initial snapshot so readers see the origin
                // pose before any telemetry arrives.
                world.publish(engine.snapshot());

                while running.load(Ordering::SeqCst) {
                    let loop_start = Instant::now();

                    let sensors = store.snapshot();
                    if engine.tick(&sensors) {
                        world.publish(engine.snapshot());
                    }

                    let elapsed = loop_start.elapsed();
                    if elapsed < tick_interval {
                        thread::sleep(tick_interval - elapsed);
                    }
                }
                log::info!("fusion loop stopped");
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the loop to exit. Call after clearing the running flag.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("fusion thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OdometryFrame, TelemetryFrame};
    use crate::fusion::engine::FusionConfig;

    #[test]
    fn test_fusion_thread_publishes_snapshots() {
        let store = SensorStore::new();
        let world = WorldState::new();
        let running = Arc::new(AtomicBool::new(true));

        let engine = FusionEngine::new(FusionConfig::default());
        let mut thread = FusionThread::spawn(
            engine,
            store.clone(),
            world.clone(),
            Duration::from_millis(5),
            running.clone(),
        )
        .unwrap();

        store.update(TelemetryFrame::Odometry(OdometryFrame::new(vec![
            0.0, 100.0,
        ])));

        // Wait for at least one tick to land
        let deadline = Instant::now() + Duration::from_secs(2);
        while world.snapshot().tick == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(world.snapshot().tick > 0);

        running.store(false, Ordering::SeqCst);
        thread.join();
    }
}
