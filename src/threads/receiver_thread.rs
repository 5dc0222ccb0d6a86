//! Telemetry receive loop.
//!
//! Blocks on the link with a short timeout, parses each message, and pushes
//! accepted frames into the sensor store. Parsed frames are also fanned out
//! over a bounded channel for downstream readers (CSV logging); when no one
//! drains the channel, frames are dropped rather than blocking the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::core::types::TelemetryFrame;
use crate::io::frame::FrameParser;
use crate::io::transport::TelemetryLink;
use crate::state::store::SensorStore;

/// Fan-out channel depth; readers lagging further than this lose frames.
const FRAME_CHANNEL_DEPTH: usize = 64;

/// Backoff after a link receive error.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Handle to the running telemetry receive thread.
pub struct ReceiverThread {
    handle: Option<JoinHandle<()>>,
}

impl ReceiverThread {
    /// Spawn the receive loop. Returns the thread handle and the fan-out
    /// receiver for parsed frames.
    pub fn spawn(
        mut link: Box<dyn TelemetryLink>,
        parser: FrameParser,
        store: SensorStore,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<(Self, Receiver<TelemetryFrame>)> {
        let (frame_tx, frame_rx): (Sender<TelemetryFrame>, Receiver<TelemetryFrame>) =
            bounded(FRAME_CHANNEL_DEPTH);

        let handle = thread::Builder::new()
            .name("telemetry-rx".to_string())
            .spawn(move || {
                log::info!("telemetry receive loop started");
                while running.load(Ordering::SeqCst) {
                    match link.recv_message() {
                        Ok(Some(message)) => {
                            for frame in parser.parse_message(&message) {
                                store.update(frame.clone());
                                // Best-effort fan-out; a full channel drops
                                frame_tx.try_send(frame).ok();
                            }
                        }
                        Ok(None) => {
                            // Receive timeout: quiet link, loop to recheck running
                        }
                        Err(e) => {
                            log::error!("telemetry receive error: {}", e);
                            thread::sleep(ERROR_BACKOFF);
                        }
                    }
                }
                log::info!("telemetry receive loop stopped");
            })?;

        Ok((
            Self {
                handle: Some(handle),
            },
            frame_rx,
        ))
    }

    /// Wait for the loop to exit. Call after clearing the running flag.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("telemetry receive thread panicked");
            }
        }
    }
}
