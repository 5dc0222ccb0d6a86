//! Telemetry frame parser.
//!
//! The robot sends line-oriented text messages. A message is either a single
//! segment or a composite of two segments joined by a line terminator:
//!
//! ```text
//! MF\t<r0>\t<r1>\t...\t<r7>          ranging sweep, tab-separated
//! RB\t<heading>,<odometer>,<aux>...  odometry report, comma-separated
//! ```
//!
//! Tag order within a composite is not guaranteed; each segment is classified
//! independently. A message containing the in-band `[ERROR]` marker is a
//! remote fault report and is never parsed as data.
//!
//! Parse failures are reported events, not crashes: [`FrameParser::parse_message`]
//! logs and drops bad segments while keeping whatever else decoded cleanly.

use thiserror::Error;

use crate::core::types::{OdometryFrame, RangingFrame, TelemetryFrame};

/// Tag prefix for ranging sweeps.
const RANGING_TAG: &str = "MF\t";
/// Tag prefix for odometry reports.
const ODOMETRY_TAG: &str = "RB\t";
/// In-band marker for remote fault reports.
const ERROR_MARKER: &str = "[ERROR]";

/// Minimum odometry field count (heading + odometer).
const MIN_ODOMETRY_FIELDS: usize = 2;

/// Frame decode errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// The robot reported a fault in-band; the diagnostic follows the marker.
    #[error("remote error from robot: {0}")]
    Remote(String),

    /// Segment does not start with a known tag.
    #[error("unknown tag in segment {0:?}")]
    UnknownTag(String),

    /// Ranging sweep length does not match the sensor count.
    #[error("ranging field count mismatch: expected {expected}, got {got}")]
    FieldCount {
        /// Configured sensor count
        expected: usize,
        /// Fields found on the wire
        got: usize,
    },

    /// Odometry report is missing heading or odometer.
    #[error("odometry report too short: {got} of {MIN_ODOMETRY_FIELDS} required fields")]
    TooFewValues {
        /// Fields found on the wire
        got: usize,
    },

    /// A field failed numeric conversion.
    #[error("invalid numeric field {field:?}")]
    InvalidNumber {
        /// The offending field text
        field: String,
        /// Underlying float parse failure
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Segment had a tag but no usable payload.
    #[error("segment payload is empty or all-blank")]
    Empty,
}

/// Stateless decoder from raw message text to typed telemetry frames.
#[derive(Debug, Clone)]
pub struct FrameParser {
    sensor_count: usize,
}

impl FrameParser {
    /// Create a parser expecting `sensor_count` readings per ranging sweep.
    pub fn new(sensor_count: usize) -> Self {
        Self { sensor_count }
    }

    /// Decode a whole message, splitting a composite on its first line
    /// terminator and classifying each segment independently.
    ///
    /// Bad segments are logged and dropped; a message carrying the `[ERROR]`
    /// marker is logged as a remote fault and yields nothing. This method
    /// never fails the caller.
    pub fn parse_message(&self, message: &str) -> Vec<TelemetryFrame> {
        if let Some(pos) = message.find(ERROR_MARKER) {
            let diagnostic = message[pos + ERROR_MARKER.len()..].trim();
            log::error!("remote error from robot: {}", diagnostic);
            return Vec::new();
        }

        let mut frames = Vec::with_capacity(2);
        for segment in split_composite(message) {
            let segment = segment.trim_end_matches(['\r', '\n']);
            if segment.is_empty() {
                continue;
            }
            match self.parse_segment(segment) {
                Ok(frame) => frames.push(frame),
                Err(e) => log::warn!("dropping telemetry segment {:?}: {}", segment, e),
            }
        }
        frames
    }

    /// Decode a single segment by its two-character tag.
    pub fn parse_segment(&self, segment: &str) -> Result<TelemetryFrame, ParseError> {
        if let Some(payload) = segment.strip_prefix(RANGING_TAG) {
            self.parse_ranging(payload).map(TelemetryFrame::Ranging)
        } else if let Some(payload) = segment.strip_prefix(ODOMETRY_TAG) {
            parse_odometry(payload).map(TelemetryFrame::Odometry)
        } else {
            Err(ParseError::UnknownTag(segment.to_string()))
        }
    }

    fn parse_ranging(&self, payload: &str) -> Result<RangingFrame, ParseError> {
        let fields: Vec<&str> = payload.split('\t').collect();
        if fields.iter().all(|f| f.trim().is_empty()) {
            return Err(ParseError::Empty);
        }
        if fields.len() != self.sensor_count {
            return Err(ParseError::FieldCount {
                expected: self.sensor_count,
                got: fields.len(),
            });
        }
        let ranges = parse_fields(&fields)?;
        Ok(RangingFrame::new(ranges))
    }
}

fn parse_odometry(payload: &str) -> Result<OdometryFrame, ParseError> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.iter().all(|f| f.trim().is_empty()) {
        return Err(ParseError::Empty);
    }
    let values = parse_fields(&fields)?;
    if values.len() < MIN_ODOMETRY_FIELDS {
        return Err(ParseError::TooFewValues { got: values.len() });
    }
    Ok(OdometryFrame::new(values))
}

/// Parse non-blank fields as floats; any non-numeric field fails the segment.
fn parse_fields(fields: &[&str]) -> Result<Vec<f32>, ParseError> {
    fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(|f| {
            f.parse::<f32>().map_err(|source| ParseError::InvalidNumber {
                field: f.to_string(),
                source,
            })
        })
        .collect()
}

/// Split a composite message on its first line terminator.
fn split_composite(message: &str) -> impl Iterator<Item = &str> {
    let (first, second) = match message.split_once("\r\n") {
        Some((a, b)) => (a, Some(b)),
        None => match message.split_once('\n') {
            Some((a, b)) => (a, Some(b)),
            None => (message, None),
        },
    };
    std::iter::once(first).chain(second)
}
