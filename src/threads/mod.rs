//! Long-running worker threads: telemetry receive loop and fusion tick loop.

pub mod fusion_thread;
pub mod receiver_thread;

pub use fusion_thread::FusionThread;
pub use receiver_thread::ReceiverThread;
