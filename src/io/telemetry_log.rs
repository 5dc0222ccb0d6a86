//! CSV telemetry logging.
//!
//! A downstream reader of the parsed frame stream: each odometry report
//! produces one timestamped row carrying the latest ranging sweep alongside
//! it. Purely additive; the fusion and navigation paths do not depend on it.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::core::types::{OdometryFrame, RangingFrame, TelemetryFrame};
use crate::error::Result;

/// Timestamp format for log rows.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// CSV writer for telemetry rows.
pub struct TelemetryLogWriter {
    writer: csv::Writer<std::fs::File>,
    sensor_count: usize,
}

impl TelemetryLogWriter {
    /// Create the CSV file and write its header row.
    pub fn create<P: AsRef<Path>>(path: P, sensor_count: usize) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec!["timestamp".to_string()];
        for i in 0..sensor_count {
            header.push(format!("tof_{}", i));
        }
        header.push("heading_deg".to_string());
        header.push("odometer_mm".to_string());
        writer.write_record(&header)?;
        writer.flush()?;

        Ok(Self {
            writer,
            sensor_count,
        })
    }

    /// Append one row: the odometry report plus the latest ranging sweep.
    /// Beams with no current reading are left blank.
    pub fn append(
        &mut self,
        ranging: Option<&RangingFrame>,
        odometry: &OdometryFrame,
    ) -> Result<()> {
        let mut row = Vec::with_capacity(self.sensor_count + 3);
        row.push(Local::now().format(TIMESTAMP_FORMAT).to_string());
        for i in 0..self.sensor_count {
            match ranging.and_then(|r| r.get(i)) {
                Some(range) => row.push(format!("{}", range)),
                None => row.push(String::new()),
            }
        }
        row.push(format_optional(odometry.heading()));
        row.push(format_optional(odometry.odometer()));

        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn format_optional(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => String::new(),
    }
}

/// Handle to the running telemetry log thread.
pub struct TelemetryLogThread {
    handle: Option<JoinHandle<()>>,
}

impl TelemetryLogThread {
    /// Spawn a consumer of the parsed frame stream that appends one row per
    /// odometry report. Write failures stop the logger without affecting the
    /// rest of the station.
    pub fn spawn(
        mut writer: TelemetryLogWriter,
        frames: Receiver<TelemetryFrame>,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("telemetry-log".to_string())
            .spawn(move || {
                log::info!("telemetry log started");
                let mut latest_ranging: Option<RangingFrame> = None;
                while running.load(Ordering::SeqCst) {
                    match frames.recv_timeout(Duration::from_millis(200)) {
                        Ok(TelemetryFrame::Ranging(frame)) => latest_ranging = Some(frame),
                        Ok(TelemetryFrame::Odometry(frame)) => {
                            if let Err(e) = writer.append(latest_ranging.as_ref(), &frame) {
                                log::error!("telemetry log write failed, stopping log: {}", e);
                                return;
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::info!("telemetry log stopped");
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the logger to exit. Call after clearing the running flag.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("telemetry log thread panicked");
            }
        }
    }
}
