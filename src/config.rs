//! Configuration for the BhumiStation daemon
//!
//! Loads configuration from a TOML file. Every section has defaults so a
//! partial file (or none at all) yields a working ground station; the
//! navigation tolerances and timeouts live here rather than as magic
//! numbers so tests can shrink them.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fusion::FusionConfig;
use crate::navigation::NavConfig;

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    pub link: LinkConfig,
    pub sensors: SensorConfig,
    pub fusion: FusionSection,
    pub navigation: NavigationSection,
    pub telemetry_log: TelemetryLogConfig,
    pub logging: LoggingConfig,
}

/// Wireless link configuration (UDP endpoints)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Local bind address for inbound telemetry
    pub bind_addr: String,
    /// Robot address for outbound commands
    pub robot_addr: String,
    /// Receive timeout in milliseconds (short, so shutdown is responsive)
    pub recv_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8888".to_string(),
            robot_addr: "192.168.4.1:8889".to_string(),
            recv_timeout_ms: 1000,
        }
    }
}

/// Time-of-flight sensor ring geometry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Number of ranging beams per sweep
    pub sensor_count: usize,
    /// Relative angle of beam 0 from robot heading (degrees)
    pub first_beam_deg: f32,
    /// Angular spacing between adjacent beams (degrees)
    pub beam_step_deg: f32,
    /// Scale applied to raw range readings before projection
    pub range_scale: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sensor_count: 8,
            first_beam_deg: 22.15,
            beam_step_deg: 45.0,
            range_scale: 1.0,
        }
    }
}

/// Fusion tick configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FusionSection {
    /// Fusion tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Bounded capacity of the path and obstacle histories
    pub history_capacity: usize,
}

impl Default for FusionSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            history_capacity: 10_000,
        }
    }
}

/// Navigation controller tolerances and timeouts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationSection {
    /// Heading convergence tolerance (degrees)
    pub angle_tolerance_deg: f32,
    /// Translation convergence tolerance (millimeters)
    pub distance_tolerance_mm: f32,
    /// Poll interval while waiting for a phase to converge (milliseconds)
    pub poll_interval_ms: u64,
    /// Per-turn-phase timeout (seconds)
    pub turn_timeout_s: f32,
    /// Floor for the translate-phase timeout (seconds)
    pub min_move_timeout_s: f32,
    /// Translate timeout as a multiple of the naive time estimate
    pub move_timeout_factor: f32,
    /// Overshoot past target treated as "close enough", in multiples of
    /// the distance tolerance
    pub overshoot_factor: f32,
    /// How long to wait for a preempted run to observe cancellation (ms)
    pub join_timeout_ms: u64,
}

impl Default for NavigationSection {
    fn default() -> Self {
        Self {
            angle_tolerance_deg: 2.0,
            distance_tolerance_mm: 5.0,
            poll_interval_ms: 50,
            turn_timeout_s: 10.0,
            min_move_timeout_s: 5.0,
            move_timeout_factor: 2.0,
            overshoot_factor: 5.0,
            join_timeout_ms: 2000,
        }
    }
}

/// CSV telemetry logging (downstream reader, off by default)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryLogConfig {
    /// Enable appending telemetry rows to a CSV file
    pub enabled: bool,
    /// CSV file path
    pub path: String,
}

impl Default for TelemetryLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "sensor_data.csv".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl StationConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: StationConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| crate::error::Error::Other(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Fusion engine configuration derived from the sensor and fusion sections.
    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig {
            beam_count: self.sensors.sensor_count,
            first_beam_deg: self.sensors.first_beam_deg,
            beam_step_deg: self.sensors.beam_step_deg,
            range_scale: self.sensors.range_scale,
            history_capacity: self.fusion.history_capacity,
        }
    }

    /// Navigation controller configuration derived from the navigation section.
    pub fn nav_config(&self) -> NavConfig {
        NavConfig {
            angle_tolerance_deg: self.navigation.angle_tolerance_deg,
            distance_tolerance: self.navigation.distance_tolerance_mm,
            poll_interval: Duration::from_millis(self.navigation.poll_interval_ms),
            turn_timeout: Duration::from_secs_f32(self.navigation.turn_timeout_s),
            min_move_timeout: Duration::from_secs_f32(self.navigation.min_move_timeout_s),
            move_timeout_factor: self.navigation.move_timeout_factor,
            overshoot_factor: self.navigation.overshoot_factor,
        }
    }
}
