//! Single-flight ownership of the navigation worker thread.
//!
//! At most one navigation run exists at a time. Submitting a new move while
//! one is active preempts it: the handle sends STOP, trips the old run's
//! cancel token, and waits a bounded time for the worker to unwind before
//! starting the replacement. The cancelled run itself never sends STOP, so
//! the robot sees exactly one STOP between the old run's commands and the
//! new run's first command.
//!
//! Each run gets a fresh token; a token, once cancelled, stays cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::types::MoveRequest;
use crate::io::command::{Command, CommandChannel};
use crate::navigation::controller::{NavOutcome, Navigator};

/// Cancellation signal for one navigation run.
///
/// Cloned between the handle and the worker; one-way, never reset.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

struct ActiveRun {
    cancel: CancelToken,
    handle: JoinHandle<NavOutcome>,
}

/// Owner of the single navigation worker thread.
pub struct NavigationHandle {
    navigator: Arc<Navigator>,
    commands: CommandChannel,
    join_timeout: Duration,
    active: Mutex<Option<ActiveRun>>,
}

impl NavigationHandle {
    /// Create a handle; `join_timeout` bounds how long preemption waits for
    /// the outgoing run to observe its cancellation.
    pub fn new(navigator: Arc<Navigator>, commands: CommandChannel, join_timeout: Duration) -> Self {
        Self {
            navigator,
            commands,
            join_timeout,
            active: Mutex::new(None),
        }
    }

    /// Start a navigation run, preempting any active one first.
    pub fn submit_move(&self, request: MoveRequest) {
        let mut active = self.active.lock();
        if let Some(run) = active.take() {
            self.preempt(run);
        }

        let cancel = CancelToken::new();
        let navigator = Arc::clone(&self.navigator);
        let token = cancel.clone();
        let spawn = thread::Builder::new()
            .name("navigation".to_string())
            .spawn(move || {
                let outcome = navigator.run(&request, &token);
                log::info!("navigation run finished: {:?}", outcome);
                outcome
            });
        match spawn {
            Ok(handle) => *active = Some(ActiveRun { cancel, handle }),
            Err(e) => log::error!("failed to spawn navigation thread: {}", e),
        }
    }

    /// Stop the robot and cancel the active run, if any.
    pub fn cancel_move(&self) {
        let mut active = self.active.lock();
        if let Some(run) = active.take() {
            self.preempt(run);
        }
    }

    /// Whether a navigation run is currently executing.
    pub fn is_active(&self) -> bool {
        match self.active.lock().as_ref() {
            Some(run) => !run.handle.is_finished(),
            None => false,
        }
    }

    /// Outcome of the most recent run, if it has finished. Clears the slot.
    pub fn take_outcome(&self) -> Option<NavOutcome> {
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(run) if run.handle.is_finished() => {
                let run = match active.take() {
                    Some(r) => r,
                    None => return None,
                };
                match run.handle.join() {
                    Ok(outcome) => Some(outcome),
                    Err(_) => {
                        log::error!("navigation thread panicked");
                        None
                    }
                }
            }
            _ => None,
        }
    }

    /// STOP the robot, trip the run's token, and wait a bounded time for the
    /// worker to unwind. An unresponsive worker is abandoned; its token stays
    /// tripped so it exits quietly whenever it next polls.
    fn preempt(&self, run: ActiveRun) {
        if run.handle.is_finished() {
            if run.handle.join().is_err() {
                log::error!("navigation thread panicked");
            }
            return;
        }

        log::info!("preempting active move");
        self.commands.send(&Command::Stop);
        run.cancel.cancel();

        let deadline = Instant::now() + self.join_timeout;
        while !run.handle.is_finished() {
            if Instant::now() >= deadline {
                log::error!(
                    "preempted navigation run did not unwind within {:?}, abandoning it",
                    self.join_timeout
                );
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        if run.handle.join().is_err() {
            log::error!("navigation thread panicked");
        }
    }
}
