//! Station wiring: owns the worker threads and exposes the operator-facing
//! surface (world queries, move submission, manual driving).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::StationConfig;
use crate::core::types::{MoveRequest, Point2D, Pose};
use crate::error::Result;
use crate::fusion::FusionEngine;
use crate::io::command::{Command, CommandChannel};
use crate::io::frame::FrameParser;
use crate::io::telemetry_log::{TelemetryLogThread, TelemetryLogWriter};
use crate::io::transport::{CommandSink, TelemetryLink, UdpCommandLink, UdpLink};
use crate::navigation::{NavigationHandle, Navigator};
use crate::state::{SensorStore, WorldState};
use crate::threads::{FusionThread, ReceiverThread};

/// A running ground station.
///
/// Construction spawns the receive, fusion, and (optionally) telemetry-log
/// threads; [`Station::shutdown`] stops and joins them. All accessors are
/// safe to call from any thread.
pub struct Station {
    running: Arc<AtomicBool>,
    store: SensorStore,
    world: WorldState,
    commands: CommandChannel,
    navigation: NavigationHandle,
    receiver: ReceiverThread,
    fusion: FusionThread,
    telemetry_log: Option<TelemetryLogThread>,
}

impl Station {
    /// Start a station on the configured UDP endpoints.
    pub fn start(config: &StationConfig) -> Result<Self> {
        let link = UdpLink::bind(
            &config.link.bind_addr,
            Duration::from_millis(config.link.recv_timeout_ms),
        )?;
        let sink = UdpCommandLink::connect(&config.link.robot_addr)?;
        Self::with_links(config, Box::new(link), Arc::new(sink))
    }

    /// Start a station over caller-provided links. Tests drive the full
    /// pipeline through mock links this way.
    pub fn with_links(
        config: &StationConfig,
        link: Box<dyn TelemetryLink>,
        sink: Arc<dyn CommandSink>,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let store = SensorStore::new();
        let world = WorldState::new();
        let commands = CommandChannel::new(sink);

        let parser = FrameParser::new(config.sensors.sensor_count);
        let (receiver, frames) =
            ReceiverThread::spawn(link, parser, store.clone(), running.clone())?;

        let telemetry_log = if config.telemetry_log.enabled {
            let writer =
                TelemetryLogWriter::create(&config.telemetry_log.path, config.sensors.sensor_count)?;
            log::info!("logging telemetry to {}", config.telemetry_log.path);
            Some(TelemetryLogThread::spawn(writer, frames, running.clone())?)
        } else {
            // Dropping the receiver disconnects the fan-out channel; the
            // receive loop's try_send becomes a no-op.
            drop(frames);
            None
        };

        let engine = FusionEngine::new(config.fusion_config());
        let fusion = FusionThread::spawn(
            engine,
            store.clone(),
            world.clone(),
            Duration::from_millis(config.fusion.tick_interval_ms),
            running.clone(),
        )?;

        let navigator = Arc::new(Navigator::new(
            store.clone(),
            world.clone(),
            commands.clone(),
            config.nav_config(),
        ));
        let navigation = NavigationHandle::new(
            navigator,
            commands.clone(),
            Duration::from_millis(config.navigation.join_timeout_ms),
        );

        Ok(Self {
            running,
            store,
            world,
            commands,
            navigation,
            receiver,
            fusion,
            telemetry_log,
        })
    }

    /// Latest fused pose.
    pub fn latest_pose(&self) -> Pose {
        self.world.pose()
    }

    /// Latest traveled path, oldest first.
    pub fn latest_path(&self) -> Vec<Point2D> {
        self.world.path()
    }

    /// Latest obstacle points, oldest first.
    pub fn latest_obstacle_points(&self) -> Vec<Point2D> {
        self.world.obstacle_points()
    }

    /// Submit a move to the target pose, preempting any active move.
    pub fn submit_move(&self, x: f32, y: f32, heading_deg: f32, speed: f32) {
        self.navigation
            .submit_move(MoveRequest::new(x, y, heading_deg, speed));
    }

    /// Stop the robot and cancel the active move, if any.
    pub fn cancel_move(&self) {
        self.navigation.cancel_move();
    }

    /// Whether a navigation run is currently executing.
    pub fn is_navigating(&self) -> bool {
        self.navigation.is_active()
    }

    /// Nudge the robot forward by `distance` millimeters (manual driving).
    /// Returns false until odometry has arrived.
    pub fn nudge_forward(&self, distance: f32, speed: f32) -> bool {
        self.manual_command(|odometry| Command::nudge_move(odometry, distance, speed))
    }

    /// Nudge the heading by `angle_deg` degrees (manual driving). Returns
    /// false until odometry has arrived.
    pub fn nudge_heading(&self, angle_deg: f32, speed: f32) -> bool {
        self.manual_command(|odometry| Command::nudge_turn(odometry, angle_deg, speed))
    }

    fn manual_command<F>(&self, build: F) -> bool
    where
        F: FnOnce(&crate::core::types::OdometryFrame) -> Option<Command>,
    {
        let snapshot = self.store.snapshot();
        match snapshot.odometry.as_ref().and_then(build) {
            Some(command) => {
                self.commands.send(&command);
                true
            }
            None => {
                log::warn!("manual command ignored: no odometry received yet");
                false
            }
        }
    }

    /// Transmit a raw command line unchanged.
    pub fn send_raw_command(&self, line: &str) {
        self.commands.send_raw(line);
    }

    /// Stop all worker threads and join them. The active move, if any, is
    /// cancelled first so the robot is left stopped.
    pub fn shutdown(&mut self) {
        log::info!("station shutting down");
        self.navigation.cancel_move();
        self.running.store(false, Ordering::SeqCst);
        self.receiver.join();
        self.fusion.join();
        if let Some(log_thread) = &mut self.telemetry_log {
            log_thread.join();
        }
        log::info!("station stopped");
    }
}
