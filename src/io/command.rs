//! Outbound motion commands.
//!
//! Commands encode as `VERB,value,speed`. MOVE targets an absolute odometer
//! value, TURN an absolute heading; STOP ignores both. The link is
//! best-effort by design: there is no acknowledgment and no retry, so a
//! failed send is logged and swallowed rather than surfaced to the caller.

use std::fmt;
use std::sync::Arc;

use crate::core::types::OdometryFrame;
use crate::io::transport::CommandSink;

/// A motion command for the robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Drive until the odometer reaches an absolute target value.
    Move {
        /// Absolute odometer target in millimeters.
        odometer_target: f32,
        /// Drive speed (robot units).
        speed: f32,
    },
    /// Rotate to an absolute heading.
    Turn {
        /// Absolute heading in degrees.
        heading_deg: f32,
        /// Turn speed (robot units).
        speed: f32,
    },
    /// Halt all motion immediately.
    Stop,
}

impl Command {
    /// Encode to the `VERB,value,speed` wire form.
    pub fn encode(&self) -> String {
        match self {
            Command::Move {
                odometer_target,
                speed,
            } => format!("MOVE,{},{}", odometer_target, speed),
            Command::Turn { heading_deg, speed } => format!("TURN,{},{}", heading_deg, speed),
            Command::Stop => "STOP,0,0".to_string(),
        }
    }

    /// MOVE nudging the odometer forward by `distance` from the latest
    /// report, for manual driving. `None` until odometry has arrived.
    pub fn nudge_move(odometry: &OdometryFrame, distance: f32, speed: f32) -> Option<Command> {
        let current = odometry.odometer()?;
        Some(Command::Move {
            odometer_target: current + distance,
            speed,
        })
    }

    /// TURN nudging the heading by `angle_deg` from the latest report, for
    /// manual driving. `None` until odometry has arrived.
    pub fn nudge_turn(odometry: &OdometryFrame, angle_deg: f32, speed: f32) -> Option<Command> {
        let current = odometry.heading()?;
        Some(Command::Turn {
            heading_deg: current + angle_deg,
            speed,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Fire-and-forget sender for outbound commands.
///
/// Cheap to clone; every clone shares the same underlying link. Send order
/// follows program order of calls, nothing more.
#[derive(Clone)]
pub struct CommandChannel {
    sink: Arc<dyn CommandSink>,
}

impl CommandChannel {
    /// Wrap a command sink.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }

    /// Encode and transmit a command. Transmission failure is logged and
    /// swallowed; the physical link gives no delivery guarantee either way.
    pub fn send(&self, command: &Command) {
        let line = command.encode();
        log::debug!("sending command: {}", line);
        if let Err(e) = self.sink.send_line(&line) {
            log::warn!("failed to send command {:?}: {}", line, e);
        }
    }

    /// Transmit a raw command line unchanged (manual control passthrough).
    pub fn send_raw(&self, line: &str) {
        log::debug!("sending raw command: {}", line);
        if let Err(e) = self.sink.send_line(line) {
            log::warn!("failed to send raw command {:?}: {}", line, e);
        }
    }
}
