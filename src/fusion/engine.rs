//! Pose and map fusion engine.
//!
//! Runs a fixed-rate tick over the latest sensor snapshot. Odometry drives
//! dead reckoning: the odometer increment since the previous tick is applied
//! along the reported heading. Ranging sweeps are then projected from the
//! updated pose into world-frame obstacle points.
//!
//! The robot reports heading clockwise-positive while the world frame is
//! counter-clockwise-positive, so headings are negated before trigonometry.
//! The same negation applies to beam offsets and to bearing computation in
//! the navigation controller; the convention must stay consistent end to end.

use std::collections::VecDeque;

use crate::core::math::normalize_deg;
use crate::core::types::{Point2D, Pose};
use crate::state::store::SensorState;
use crate::state::world::WorldSnapshot;

/// Fusion engine tuning, derived from the sensors and fusion config sections.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Number of ranging beams per sweep.
    pub beam_count: usize,
    /// Mounting angle of beam 0, degrees from the robot's forward axis.
    pub first_beam_deg: f32,
    /// Angular spacing between adjacent beams, degrees.
    pub beam_step_deg: f32,
    /// Multiplier from wire range units to millimeters.
    pub range_scale: f32,
    /// Maximum retained path points and obstacle points, each.
    pub history_capacity: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            beam_count: 8,
            first_beam_deg: 22.15,
            beam_step_deg: 45.0,
            range_scale: 1.0,
            history_capacity: 10_000,
        }
    }
}

/// Dead-reckoning and obstacle-map state, owned by the fusion thread.
pub struct FusionEngine {
    config: FusionConfig,
    /// Beam offsets in world-convention radians, precomputed.
    beam_offsets_rad: Vec<f32>,
    pose: Pose,
    path: VecDeque<Point2D>,
    obstacles: VecDeque<Point2D>,
    prev_odometer: Option<f32>,
    tick_count: u64,
}

impl FusionEngine {
    /// Create an engine at the origin pose.
    pub fn new(config: FusionConfig) -> Self {
        let beam_offsets_rad = (0..config.beam_count)
            .map(|i| {
                let beam_deg = config.first_beam_deg + i as f32 * config.beam_step_deg;
                (-beam_deg).to_radians()
            })
            .collect();

        let mut path = VecDeque::with_capacity(config.history_capacity.min(1024));
        path.push_back(Point2D::new(0.0, 0.0));

        Self {
            config,
            beam_offsets_rad,
            pose: Pose::origin(),
            path,
            obstacles: VecDeque::new(),
            prev_odometer: None,
            tick_count: 0,
        }
    }

    /// Current dead-reckoned pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Advance one fusion tick over the given sensor snapshot.
    ///
    /// Returns `true` when the world state advanced (a usable odometry frame
    /// was present). The first usable frame only seeds the odometer baseline;
    /// motion is integrated from the second frame on.
    pub fn tick(&mut self, sensors: &SensorState) -> bool {
        let (heading_deg, odometer) = match (sensors.heading(), sensors.odometer()) {
            (Some(h), Some(o)) => (h, o),
            _ => return false,
        };

        // Heading negation: wire heading is clockwise-positive.
        let heading_rad = (-heading_deg).to_radians();

        match self.prev_odometer {
            None => {
                // Baseline tick: adopt the cumulative odometer without
                // integrating, so a robot that booted mid-run does not jump.
                self.prev_odometer = Some(odometer);
            }
            Some(prev) => {
                let increment = odometer - prev;
                self.prev_odometer = Some(odometer);
                if increment != 0.0 {
                    self.pose.x += increment * heading_rad.cos();
                    self.pose.y += increment * heading_rad.sin();
                    push_bounded(
                        &mut self.path,
                        self.pose.position(),
                        self.config.history_capacity,
                    );
                }
            }
        }
        self.pose.heading_deg = normalize_deg(heading_deg);

        if let Some(ranging) = &sensors.ranging {
            for (i, &offset_rad) in self.beam_offsets_rad.iter().enumerate() {
                let range = match ranging.get(i) {
                    Some(r) => r,
                    None => break,
                };
                // Negative range means no return on that beam.
                if range < 0.0 {
                    continue;
                }
                let distance = range * self.config.range_scale;
                let angle = heading_rad + offset_rad;
                let point = Point2D::new(
                    self.pose.x + distance * angle.cos(),
                    self.pose.y + distance * angle.sin(),
                );
                push_bounded(&mut self.obstacles, point, self.config.history_capacity);
            }
        }

        self.tick_count += 1;
        true
    }

    /// Build a publishable snapshot of the current world.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            pose: self.pose,
            path: self.path.iter().copied().collect(),
            obstacles: self.obstacles.iter().copied().collect(),
            tick: self.tick_count,
        }
    }
}

/// Append with oldest-first eviction at capacity.
fn push_bounded(buf: &mut VecDeque<Point2D>, point: Point2D, capacity: usize) {
    if capacity == 0 {
        return;
    }
    if buf.len() == capacity {
        buf.pop_front();
    }
    buf.push_back(point);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OdometryFrame, RangingFrame};
    use approx::assert_relative_eq;

    fn state(heading: f32, odometer: f32) -> SensorState {
        SensorState {
            ranging: None,
            odometry: Some(OdometryFrame::new(vec![heading, odometer])),
        }
    }

    #[test]
    fn test_first_tick_seeds_without_motion() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        assert!(engine.tick(&state(0.0, 1000.0)));
        let pose = engine.pose();
        assert_relative_eq!(pose.x, 0.0);
        assert_relative_eq!(pose.y, 0.0);
    }

    #[test]
    fn test_forward_motion_at_zero_heading() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        engine.tick(&state(0.0, 100.0));
        engine.tick(&state(0.0, 150.0));
        let pose = engine.pose();
        assert_relative_eq!(pose.x, 50.0, epsilon = 1e-4);
        assert_relative_eq!(pose.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_heading_negation_convention() {
        // Wire heading 90 (clockwise) maps to world -90: motion along -y.
        let mut engine = FusionEngine::new(FusionConfig::default());
        engine.tick(&state(90.0, 0.0));
        engine.tick(&state(90.0, 100.0));
        let pose = engine.pose();
        assert_relative_eq!(pose.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(pose.y, -100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_increment_leaves_pose_and_path_unchanged() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        engine.tick(&state(0.0, 100.0));
        engine.tick(&state(0.0, 150.0));
        let before = engine.snapshot();

        engine.tick(&state(0.0, 150.0));
        engine.tick(&state(0.0, 150.0));
        let after = engine.snapshot();

        assert_relative_eq!(before.pose.x, after.pose.x);
        assert_eq!(before.path.len(), after.path.len());
    }

    #[test]
    fn test_missing_odometry_is_not_a_tick() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        let sensors = SensorState {
            ranging: Some(RangingFrame::new(vec![100.0; 8])),
            odometry: None,
        };
        assert!(!engine.tick(&sensors));
        assert_eq!(engine.snapshot().tick, 0);
    }

    #[test]
    fn test_negative_ranges_project_nothing() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        let sensors = SensorState {
            ranging: Some(RangingFrame::new(vec![-1.0; 8])),
            odometry: Some(OdometryFrame::new(vec![0.0, 0.0])),
        };
        assert!(engine.tick(&sensors));
        assert!(engine.snapshot().obstacles.is_empty());
    }

    #[test]
    fn test_obstacles_projected_from_pose() {
        let config = FusionConfig {
            beam_count: 1,
            first_beam_deg: 0.0,
            beam_step_deg: 45.0,
            range_scale: 1.0,
            history_capacity: 100,
        };
        let mut engine = FusionEngine::new(config);
        let sensors = SensorState {
            ranging: Some(RangingFrame::new(vec![200.0])),
            odometry: Some(OdometryFrame::new(vec![0.0, 0.0])),
        };
        engine.tick(&sensors);
        let snap = engine.snapshot();
        assert_eq!(snap.obstacles.len(), 1);
        // Beam 0 at zero offset, zero heading: straight ahead along +x
        assert_relative_eq!(snap.obstacles[0].x, 200.0, epsilon = 1e-3);
        assert_relative_eq!(snap.obstacles[0].y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_range_scale_applied() {
        let config = FusionConfig {
            beam_count: 1,
            first_beam_deg: 0.0,
            beam_step_deg: 45.0,
            range_scale: 0.1,
            history_capacity: 100,
        };
        let mut engine = FusionEngine::new(config);
        let sensors = SensorState {
            ranging: Some(RangingFrame::new(vec![200.0])),
            odometry: Some(OdometryFrame::new(vec![0.0, 0.0])),
        };
        engine.tick(&sensors);
        assert_relative_eq!(engine.snapshot().obstacles[0].x, 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_history_eviction_keeps_newest() {
        let config = FusionConfig {
            beam_count: 1,
            first_beam_deg: 0.0,
            beam_step_deg: 45.0,
            range_scale: 1.0,
            history_capacity: 3,
        };
        let mut engine = FusionEngine::new(config);
        for i in 0..6 {
            let sensors = SensorState {
                ranging: Some(RangingFrame::new(vec![100.0 + i as f32])),
                odometry: Some(OdometryFrame::new(vec![0.0, 0.0])),
            };
            engine.tick(&sensors);
        }
        let snap = engine.snapshot();
        assert_eq!(snap.obstacles.len(), 3);
        // Oldest evicted first
        assert_relative_eq!(snap.obstacles[0].x, 103.0, epsilon = 1e-3);
        assert_relative_eq!(snap.obstacles[2].x, 105.0, epsilon = 1e-3);
    }

    #[test]
    fn test_path_starts_at_origin() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        engine.tick(&state(0.0, 0.0));
        engine.tick(&state(0.0, 50.0));
        let snap = engine.snapshot();
        assert_eq!(snap.path.len(), 2);
        assert_relative_eq!(snap.path[0].x, 0.0);
        assert_relative_eq!(snap.path[1].x, 50.0, epsilon = 1e-4);
    }
}
