//! BhumiStation - Ground-station controller for a UDP-linked mobile robot
//!
//! The robot streams line-oriented telemetry (heading, odometer distance,
//! ultrasonic range, 8-channel time-of-flight ranging) over a wireless link
//! and accepts fire-and-forget MOVE/TURN/STOP commands. This crate fuses the
//! lossy telemetry stream into a 2-D pose plus obstacle point-cloud by dead
//! reckoning, and drives a cancellable multi-phase controller that steers the
//! robot to an arbitrary target pose.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   app / main                        │  ← Wiring + daemon
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   threads/                          │  ← Receive + tick loops
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────────────────┬──────────────────────────┐
//! │        fusion/           │       navigation/        │  ← Dead reckoning,
//! │   (pose + point-cloud)   │  (phased move control)   │     move execution
//! └──────────────────────────┴──────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    state/                           │  ← Shared snapshots
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Frame parsing,
//! │        (frame, transport, command, csv log)         │     link transports
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Types, math
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Data flow: link → frame parser → sensor store → {fusion tick, navigation
//! controller} → command channel → link. Downstream readers (rendering, CSV
//! logging) only ever see cloned snapshots; they never write into the core.

// Layer 1: Core foundation (no internal deps)
pub mod core;

// Layer 2: I/O infrastructure (frames, transports, commands)
pub mod io;

// Layer 3: Shared state (sensor store, world snapshot)
pub mod state;

// Layer 4: Pose & map fusion
pub mod fusion;

// Layer 5: Navigation control
pub mod navigation;

// Layer 6: Thread infrastructure
pub mod threads;

// Application wiring
pub mod app;
pub mod config;
pub mod error;

// Convenience re-exports (flat namespace for common use)
pub use app::Station;
pub use config::StationConfig;
pub use core::math::{heading_diff_deg, normalize_deg};
pub use core::types::{MoveRequest, OdometryFrame, Point2D, Pose, RangingFrame, TelemetryFrame};
pub use error::{Error, Result};
pub use fusion::{FusionConfig, FusionEngine};
pub use io::command::{Command, CommandChannel};
pub use io::frame::{FrameParser, ParseError};
pub use io::transport::{CommandSink, MockLink, MockSink, TelemetryLink, UdpCommandLink, UdpLink};
pub use navigation::{CancelToken, NavConfig, NavOutcome, NavPhase, NavigationHandle, Navigator};
pub use state::{SensorState, SensorStore, WorldSnapshot, WorldState};
