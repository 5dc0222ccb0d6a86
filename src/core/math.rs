//! Angular math in the degree domain used by the robot's wire protocol.
//!
//! Odometry headings arrive in degrees and are not pre-normalized; commands
//! take absolute headings in [0, 360). Radians appear only transiently when
//! projecting beams into world coordinates.

/// Normalize an angle in degrees to [0, 360).
///
/// # Example
/// ```
/// use bhumi_station::core::math::normalize_deg;
///
/// assert!((normalize_deg(-90.0) - 270.0).abs() < 1e-6);
/// assert!((normalize_deg(720.0) - 0.0).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_deg(angle: f32) -> f32 {
    let a = angle % 360.0;
    if a < 0.0 { a + 360.0 } else { a }
}

/// Shortest signed angular difference from heading `from` to heading `to`,
/// in degrees, normalized to [-180, 180].
///
/// Returns the signed turn to add to `from` to reach `to` the short way
/// around the circle.
///
/// # Example
/// ```
/// use bhumi_station::core::math::heading_diff_deg;
///
/// assert!((heading_diff_deg(10.0, 350.0) - (-20.0)).abs() < 1e-6);
/// assert!((heading_diff_deg(350.0, 10.0) - 20.0).abs() < 1e-6);
/// ```
#[inline]
pub fn heading_diff_deg(from: f32, to: f32) -> f32 {
    let mut d = (to - from) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_deg_identity() {
        assert_relative_eq!(normalize_deg(0.0), 0.0);
        assert_relative_eq!(normalize_deg(359.9), 359.9);
    }

    #[test]
    fn test_normalize_deg_wraps() {
        assert_relative_eq!(normalize_deg(360.0), 0.0);
        assert_relative_eq!(normalize_deg(725.0), 5.0, epsilon = 1e-4);
        assert_relative_eq!(normalize_deg(-45.0), 315.0);
        assert_relative_eq!(normalize_deg(-360.0), 0.0);
    }

    #[test]
    fn test_heading_diff_short_way() {
        assert_relative_eq!(heading_diff_deg(0.0, 90.0), 90.0);
        assert_relative_eq!(heading_diff_deg(90.0, 0.0), -90.0);
        // Crossing the 0/360 seam takes the short way
        assert_relative_eq!(heading_diff_deg(350.0, 10.0), 20.0);
        assert_relative_eq!(heading_diff_deg(10.0, 350.0), -20.0);
    }

    #[test]
    fn test_heading_diff_half_turn() {
        let d = heading_diff_deg(0.0, 180.0);
        assert!((d.abs() - 180.0).abs() < 1e-4, "should be ±180: {}", d);
    }

    #[test]
    fn test_heading_diff_round_trip_property() {
        // (from + diff) mod 360 == to mod 360, and |diff| <= 180
        for from in (0..360).step_by(17) {
            for to in (0..360).step_by(23) {
                let (from, to) = (from as f32, to as f32);
                let d = heading_diff_deg(from, to);
                assert!(d >= -180.0 && d <= 180.0, "diff out of range: {}", d);
                assert_relative_eq!(normalize_deg(from + d), normalize_deg(to), epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_heading_diff_unnormalized_inputs() {
        assert_relative_eq!(heading_diff_deg(-90.0, 90.0), 180.0, epsilon = 1e-4);
        assert_relative_eq!(heading_diff_deg(720.0, 90.0), 90.0, epsilon = 1e-4);
    }
}
