//! Phased navigation controller.
//!
//! A move request executes as three sequential phases:
//!
//! 1. Turn to face the target position.
//! 2. Translate until the odometer reaches the straight-line distance.
//! 3. Turn to the requested final heading.
//!
//! Phases 1 and 2 are skipped when the target is already within the distance
//! tolerance, so a pure rotation request never computes a degenerate bearing.
//! Each phase is a closed loop over the sensor store: issue one command, then
//! poll telemetry until the phase tolerance is met, the phase timeout lapses,
//! or cancellation is observed. A phase timeout is degraded continuation, not
//! failure: the controller sends STOP, logs a warning, and advances to the
//! next phase, preferring bounded wall-clock progress over hanging. A
//! cancelled run unwinds without sending STOP; the canceller already issued
//! it.

use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::math::{heading_diff_deg, normalize_deg};
use crate::core::types::MoveRequest;
use crate::io::command::{Command, CommandChannel};
use crate::navigation::handle::CancelToken;
use crate::state::store::SensorStore;
use crate::state::world::WorldState;

/// Navigation tolerances and timeouts.
#[derive(Debug, Clone)]
pub struct NavConfig {
    /// Heading convergence tolerance, degrees.
    pub angle_tolerance_deg: f32,
    /// Translation convergence tolerance, millimeters.
    pub distance_tolerance: f32,
    /// Telemetry poll interval within a phase.
    pub poll_interval: Duration,
    /// Timeout for each turn phase.
    pub turn_timeout: Duration,
    /// Floor for the translate-phase timeout.
    pub min_move_timeout: Duration,
    /// Translate timeout as a multiple of the naive distance/speed estimate.
    pub move_timeout_factor: f32,
    /// Overshoot past the odometer target treated as arrival, in multiples
    /// of the distance tolerance.
    pub overshoot_factor: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            angle_tolerance_deg: 2.0,
            distance_tolerance: 5.0,
            poll_interval: Duration::from_millis(50),
            turn_timeout: Duration::from_secs(10),
            min_move_timeout: Duration::from_secs(5),
            move_timeout_factor: 2.0,
            overshoot_factor: 5.0,
        }
    }
}

/// Where a run currently is in its phase sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    /// No run in progress.
    Idle,
    /// Phase 1: rotating to face the target position.
    TurnToFaceTarget,
    /// Phase 2: driving the straight-line distance.
    TranslateToTarget,
    /// Phase 3: rotating to the requested final heading.
    TurnToFinalHeading,
    /// Last run completed all phases.
    Done,
    /// Last run was cancelled mid-phase.
    Cancelled,
}

/// Terminal outcome of one navigation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// All phases finished, possibly degraded by a phase timeout.
    Completed,
    /// Cancellation was observed before completion.
    Cancelled,
    /// Required telemetry never arrived, or the request was invalid.
    Aborted(&'static str),
}

/// How a single phase's poll loop ended.
enum PhaseResult {
    Converged,
    TimedOut,
    Cancelled,
    /// Telemetry required to enter the phase has never arrived.
    Unavailable,
}

/// Executes move requests against live telemetry.
///
/// Stateless between runs apart from the reported phase; safe to share
/// behind an `Arc` with one run active at a time.
pub struct Navigator {
    store: SensorStore,
    world: WorldState,
    commands: CommandChannel,
    config: NavConfig,
    phase: Mutex<NavPhase>,
}

impl Navigator {
    /// Create a navigator over the shared state and command channel.
    pub fn new(
        store: SensorStore,
        world: WorldState,
        commands: CommandChannel,
        config: NavConfig,
    ) -> Self {
        Self {
            store,
            world,
            commands,
            config,
            phase: Mutex::new(NavPhase::Idle),
        }
    }

    /// Phase of the current (or most recent) run.
    pub fn current_phase(&self) -> NavPhase {
        *self.phase.lock()
    }

    fn set_phase(&self, phase: NavPhase) {
        *self.phase.lock() = phase;
    }

    /// Execute one move request to completion, cancellation, or abort.
    ///
    /// Blocks the calling thread for the duration of the run; the
    /// [`NavigationHandle`](crate::navigation::NavigationHandle) runs this on
    /// a dedicated worker thread.
    pub fn run(&self, request: &MoveRequest, cancel: &CancelToken) -> NavOutcome {
        if request.speed <= 0.0 {
            return self.abort("non-positive speed");
        }

        let pose = self.world.pose();
        let dx = request.x - pose.x;
        let dy = request.y - pose.y;
        let distance = (dx * dx + dy * dy).sqrt();
        log::info!(
            "move to ({:.1}, {:.1}) heading {:.1}: distance {:.1} from ({:.1}, {:.1})",
            request.x,
            request.y,
            request.heading_deg,
            distance,
            pose.x,
            pose.y
        );

        if distance > self.config.distance_tolerance {
            // World y grows counter-clockwise while wire headings grow
            // clockwise; negate the bearing to match.
            let bearing = normalize_deg((-dy.atan2(dx)).to_degrees());

            self.set_phase(NavPhase::TurnToFaceTarget);
            match self.turn_to(bearing, request.speed, cancel) {
                PhaseResult::Converged => {}
                PhaseResult::TimedOut => self.degrade("turn to bearing timed out"),
                PhaseResult::Cancelled => return self.cancelled(),
                PhaseResult::Unavailable => return self.abort("heading unavailable"),
            }

            self.set_phase(NavPhase::TranslateToTarget);
            match self.translate(distance, request.speed, cancel) {
                PhaseResult::Converged => {}
                PhaseResult::TimedOut => self.degrade("translate timed out"),
                PhaseResult::Cancelled => return self.cancelled(),
                PhaseResult::Unavailable => return self.abort("odometer unavailable"),
            }
        } else {
            log::debug!("target within distance tolerance, skipping bearing and translate");
        }

        self.set_phase(NavPhase::TurnToFinalHeading);
        match self.turn_to(request.heading_deg, request.speed, cancel) {
            PhaseResult::Converged => {}
            PhaseResult::TimedOut => self.degrade("turn to final heading timed out"),
            PhaseResult::Cancelled => return self.cancelled(),
            PhaseResult::Unavailable => return self.abort("heading unavailable"),
        }

        self.set_phase(NavPhase::Done);
        log::info!("move complete");
        NavOutcome::Completed
    }

    /// Rotate to an absolute heading and poll until within tolerance.
    ///
    /// Sends nothing if the latest reported heading is already within
    /// tolerance of the target.
    fn turn_to(&self, heading_deg: f32, speed: f32, cancel: &CancelToken) -> PhaseResult {
        let target = normalize_deg(heading_deg);
        match self.store.heading() {
            Some(current) => {
                if heading_diff_deg(current, target).abs() <= self.config.angle_tolerance_deg {
                    return PhaseResult::Converged;
                }
            }
            None => return PhaseResult::Unavailable,
        }

        self.commands.send(&Command::Turn {
            heading_deg: target,
            speed,
        });

        let deadline = Instant::now() + self.config.turn_timeout;
        loop {
            if cancel.is_cancelled() {
                return PhaseResult::Cancelled;
            }
            if let Some(current) = self.store.heading() {
                let error = heading_diff_deg(current, target);
                if error.abs() <= self.config.angle_tolerance_deg {
                    log::debug!("turn converged at {:.1} (target {:.1})", current, target);
                    return PhaseResult::Converged;
                }
            }
            if Instant::now() >= deadline {
                return PhaseResult::TimedOut;
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Drive forward by `distance` and poll the odometer until arrival.
    fn translate(&self, distance: f32, speed: f32, cancel: &CancelToken) -> PhaseResult {
        let start = match self.store.odometer() {
            Some(o) => o,
            None => return PhaseResult::Unavailable,
        };
        let target = start + distance;
        self.commands.send(&Command::Move {
            odometer_target: target,
            speed,
        });

        let estimate = Duration::from_secs_f32(self.config.move_timeout_factor * distance / speed);
        let timeout = estimate.max(self.config.min_move_timeout);
        let deadline = Instant::now() + timeout;
        let overshoot_limit = self.config.overshoot_factor * self.config.distance_tolerance;

        loop {
            if cancel.is_cancelled() {
                return PhaseResult::Cancelled;
            }
            if let Some(odometer) = self.store.odometer() {
                let remaining = target - odometer;
                // Reached or passed the target counts as arrival
                if remaining.abs() <= self.config.distance_tolerance || remaining <= 0.0 {
                    if -remaining > overshoot_limit {
                        log::warn!("translate overshot target by {:.1}, accepting", -remaining);
                    } else {
                        log::debug!("translate converged, odometer {:.1}", odometer);
                    }
                    return PhaseResult::Converged;
                }
            }
            if Instant::now() >= deadline {
                return PhaseResult::TimedOut;
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Degraded continuation after a phase timeout: stop the robot and move
    /// on to the next phase.
    fn degrade(&self, reason: &'static str) {
        log::warn!("{}; stopping and continuing to next phase", reason);
        self.commands.send(&Command::Stop);
    }

    fn abort(&self, reason: &'static str) -> NavOutcome {
        log::warn!("move aborted: {}", reason);
        self.commands.send(&Command::Stop);
        self.set_phase(NavPhase::Idle);
        NavOutcome::Aborted(reason)
    }

    fn cancelled(&self) -> NavOutcome {
        log::info!("move cancelled");
        self.set_phase(NavPhase::Cancelled);
        NavOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OdometryFrame, TelemetryFrame};
    use crate::io::transport::MockSink;
    use std::sync::Arc;

    fn fast_config() -> NavConfig {
        NavConfig {
            poll_interval: Duration::from_millis(1),
            turn_timeout: Duration::from_millis(20),
            min_move_timeout: Duration::from_millis(20),
            ..NavConfig::default()
        }
    }

    fn navigator(config: NavConfig) -> (Navigator, SensorStore, MockSink) {
        let store = SensorStore::new();
        let sink = MockSink::new();
        let nav = Navigator::new(
            store.clone(),
            WorldState::new(),
            CommandChannel::new(Arc::new(sink.clone())),
            config,
        );
        (nav, store, sink)
    }

    fn feed_odometry(store: &SensorStore, heading: f32, odometer: f32) {
        store.update(TelemetryFrame::Odometry(OdometryFrame::new(vec![
            heading, odometer,
        ])));
    }

    #[test]
    fn test_noop_when_already_at_target() {
        let (nav, store, sink) = navigator(fast_config());
        feed_odometry(&store, 0.0, 0.0);

        let request = MoveRequest::new(0.0, 0.0, 0.0, 10.0);
        let outcome = nav.run(&request, &CancelToken::default());

        assert_eq!(outcome, NavOutcome::Completed);
        assert!(sink.sent().is_empty());
        assert_eq!(nav.current_phase(), NavPhase::Done);
    }

    #[test]
    fn test_precancelled_run_sends_no_stop() {
        let (nav, store, sink) = navigator(fast_config());
        feed_odometry(&store, 0.0, 0.0);

        let cancel = CancelToken::default();
        cancel.cancel();
        // Final-heading turn is required, so the run enters a poll loop
        let request = MoveRequest::new(0.0, 0.0, 90.0, 10.0);
        let outcome = nav.run(&request, &cancel);

        assert_eq!(outcome, NavOutcome::Cancelled);
        assert_eq!(sink.sent(), vec!["TURN,90,10"]);
        assert_eq!(nav.current_phase(), NavPhase::Cancelled);
    }

    #[test]
    fn test_turn_timeout_stops_and_continues() {
        let (nav, store, sink) = navigator(fast_config());
        feed_odometry(&store, 0.0, 0.0);

        // Heading never moves, so the final-heading turn times out; the run
        // still finishes, degraded, after stopping the robot.
        let request = MoveRequest::new(0.0, 0.0, 90.0, 10.0);
        let outcome = nav.run(&request, &CancelToken::default());

        assert_eq!(outcome, NavOutcome::Completed);
        assert_eq!(sink.sent(), vec!["TURN,90,10", "STOP,0,0"]);
        assert_eq!(nav.current_phase(), NavPhase::Done);
    }

    #[test]
    fn test_missing_odometer_aborts_translate() {
        let (nav, store, sink) = navigator(fast_config());
        // Heading present, odometer missing
        store.update(TelemetryFrame::Odometry(OdometryFrame::new(vec![0.0])));

        // Target straight ahead: bearing 0 matches current heading, so the
        // run reaches the translate phase without turning.
        let request = MoveRequest::new(100.0, 0.0, 0.0, 10.0);
        let outcome = nav.run(&request, &CancelToken::default());

        assert_eq!(outcome, NavOutcome::Aborted("odometer unavailable"));
        assert_eq!(sink.sent(), vec!["STOP,0,0"]);
    }

    #[test]
    fn test_non_positive_speed_rejected() {
        let (nav, store, _sink) = navigator(fast_config());
        feed_odometry(&store, 0.0, 0.0);

        let request = MoveRequest::new(100.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            nav.run(&request, &CancelToken::default()),
            NavOutcome::Aborted(_)
        ));
    }

    #[test]
    fn test_bearing_negated_for_wire_convention() {
        // Target on world +y from origin: wire bearing must be 270, not 90.
        let (nav, store, sink) = navigator(fast_config());
        feed_odometry(&store, 0.0, 0.0);

        // High speed keeps the translate timeout short once the turn degrades
        let request = MoveRequest::new(0.0, 100.0, 0.0, 1000.0);
        let _ = nav.run(&request, &CancelToken::default());

        let sent = sink.sent();
        assert!(!sent.is_empty());
        assert_eq!(sent[0], "TURN,270,1000");
    }
}
