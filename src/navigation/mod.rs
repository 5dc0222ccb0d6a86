//! Navigation control: phased move execution and the single-flight handle
//! that owns the worker thread.

pub mod controller;
pub mod handle;

pub use controller::{NavConfig, NavOutcome, NavPhase, Navigator};
pub use handle::{CancelToken, NavigationHandle};
