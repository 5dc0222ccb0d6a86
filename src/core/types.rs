//! Telemetry frame and pose types.
//!
//! Units follow the robot's wire protocol: distances in millimeters, angles
//! in degrees. Odometry headings are cumulative and not pre-normalized.

use serde::{Deserialize, Serialize};

use crate::core::math::normalize_deg;

/// A 2D point in world frame, millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in millimeters
    pub x: f32,
    /// Y coordinate in millimeters
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Robot pose in world frame.
///
/// Position in millimeters; heading is the most recent odometry heading in
/// degrees (robot sign convention), normalized to [0, 360) by the fusion
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// X position in millimeters
    pub x: f32,
    /// Y position in millimeters
    pub y: f32,
    /// Heading in degrees, odometry sign convention
    pub heading_deg: f32,
}

impl Pose {
    /// Pose at the world origin with zero heading. Dead reckoning starts here.
    #[inline]
    pub fn origin() -> Self {
        Self::default()
    }

    /// Position component of the pose.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// One time-of-flight ranging sweep: one reading per fixed sensor-relative
/// beam angle. A negative reading is the "no return" sentinel.
///
/// The frame parser guarantees the reading count matches the configured
/// sensor count; frames of any other length never reach the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangingFrame {
    ranges: Vec<f32>,
}

impl RangingFrame {
    /// Wrap a full sweep of readings.
    pub fn new(ranges: Vec<f32>) -> Self {
        Self { ranges }
    }

    /// Number of beams in this sweep.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the sweep is empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Reading for beam `index`, or `None` past the end of the sweep.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.ranges.get(index).copied()
    }

    /// All readings in beam order.
    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }
}

/// One odometry report: field 0 = heading (degrees), field 1 = cumulative
/// odometer distance (millimeters), remaining fields = auxiliary scalars
/// (ultrasonic range etc.).
///
/// The frame parser rejects reports with fewer than two fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OdometryFrame {
    values: Vec<f32>,
}

impl OdometryFrame {
    /// Index of the heading field.
    pub const HEADING: usize = 0;
    /// Index of the cumulative odometer field.
    pub const ODOMETER: usize = 1;

    /// Wrap a decoded report.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Number of fields in the report.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Heading in degrees, if reported.
    pub fn heading(&self) -> Option<f32> {
        self.get(Self::HEADING)
    }

    /// Cumulative odometer distance in millimeters, if reported.
    pub fn odometer(&self) -> Option<f32> {
        self.get(Self::ODOMETER)
    }

    /// Field `index`, or `None` past the end of the report.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// All fields in wire order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// A decoded telemetry frame, either half of a composite message.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryFrame {
    /// Time-of-flight ranging sweep (`MF` tag).
    Ranging(RangingFrame),
    /// Odometry report (`RB` tag).
    Odometry(OdometryFrame),
}

/// A request to drive the robot to a target pose.
///
/// Owned exclusively by the active navigation run until it completes or a
/// newer request preempts it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    /// Target X position in millimeters.
    pub x: f32,
    /// Target Y position in millimeters.
    pub y: f32,
    /// Final heading in degrees, normalized to [0, 360) on construction.
    pub heading_deg: f32,
    /// Speed for both translation and rotation (robot units).
    pub speed: f32,
}

impl MoveRequest {
    /// Create a request, normalizing the final heading to [0, 360).
    pub fn new(x: f32, y: f32, heading_deg: f32, speed: f32) -> Self {
        Self {
            x,
            y,
            heading_deg: normalize_deg(heading_deg),
            speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_odometry_accessors() {
        let frame = OdometryFrame::new(vec![45.0, 1200.0, 87.0]);
        assert_eq!(frame.heading(), Some(45.0));
        assert_eq!(frame.odometer(), Some(1200.0));
        assert_eq!(frame.get(2), Some(87.0));
        assert_eq!(frame.get(3), None);
    }

    #[test]
    fn test_ranging_out_of_range_index() {
        let frame = RangingFrame::new(vec![100.0, 200.0]);
        assert_eq!(frame.get(1), Some(200.0));
        assert_eq!(frame.get(2), None);
    }

    #[test]
    fn test_move_request_normalizes_heading() {
        let req = MoveRequest::new(0.0, 0.0, -90.0, 50.0);
        assert_relative_eq!(req.heading_deg, 270.0);
        let req = MoveRequest::new(0.0, 0.0, 370.0, 50.0);
        assert_relative_eq!(req.heading_deg, 10.0, epsilon = 1e-4);
    }
}
