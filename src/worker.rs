//! Background drain worker.
//!
//! # State machine
//!
//! ```text
//!            spawn()                 stop() / drop
//! Stopped ─────────────▶ Running ─────────────────────▶ Stopped
//!                          │  ▲                          (joined)
//!                   drain()│  │park_timeout(period)
//!                          ▼  │
//!                        [ cycle ]
//! ```
//!
//! Each cycle calls the drain closure once, then parks for the poll period.
//! `stop()` clears the running flag and unparks the thread, so shutdown takes
//! at most one drain pass rather than a full period. After the loop exits the
//! closure runs one last time, so anything queued before `stop()` is delivered.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error};

/// Recommended poll period between drain cycles.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(50);

/// Worker lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Running,
}

/// Owns one background thread that runs a drain closure on a fixed period.
///
/// The closure runs on the worker thread only, so it may block, allocate
/// and do I/O. It must not panic; if it does the thread dies, the panic is
/// reported when the worker is joined, and nothing more is drained.
pub struct DrainWorker {
    name: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl DrainWorker {
    /// Start a worker thread named `name`.
    pub fn spawn<F>(name: &str, period: Duration, mut drain: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    drain();
                    thread::park_timeout(period);
                }
                // Final pass for messages queued before stop()
                drain();
            })?;

        debug!(worker = name, period_ms = period.as_millis() as u64, "drain worker started");

        Ok(Self {
            name: name.to_string(),
            running,
            handle: Some(handle),
            period,
        })
    }

    pub fn state(&self) -> WorkerState {
        let alive = self.handle.as_ref().is_some_and(|h| !h.is_finished());
        if alive && self.running.load(Ordering::Acquire) {
            WorkerState::Running
        } else {
            WorkerState::Stopped
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Request stop and join the thread. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        let Some(handle) = self.handle.take() else {
            return;
        };
        handle.thread().unpark();

        if handle.join().is_err() {
            error!(worker = %self.name, "drain worker panicked; undelivered messages were lost");
        } else {
            debug!(worker = %self.name, "drain worker stopped");
        }
    }
}

impl Drop for DrainWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
