//! I/O infrastructure: frame decoding, link transports, command encoding,
//! and the CSV telemetry log.

pub mod command;
pub mod frame;
pub mod telemetry_log;
pub mod transport;
