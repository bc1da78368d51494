//! Real-time capture facade.
//!
//! # Architecture
//!
//! ```text
//! RT Thread                 TransportQueue             Drain Thread
//! ──────────                ──────────────             ────────────
//!
//! log_info!() ─▶ filter ─▶ [M0][M1][M2] ──────▶ callback(&msg)
//!                  │        lock-free              blocking ok
//!                  ▼        drop-new if full
//!               return      (no formatting done)
//! ```
//!
//! # Rules
//!
//! - The `log_*` path never allocates, never blocks, never does I/O
//! - A level below the threshold returns before any formatting work
//! - Messages are formatted straight into their queue slot
//! - Full queue: the message is dropped and counted; the drain thread later
//!   reports the count as a warning through the same callback
//!
//! With the `disable-logging` feature this module exports a null-object
//! `RtLogger` with the same API whose calls compile to nothing.

#[cfg(not(feature = "disable-logging"))]
pub use enabled::RtLogger;

#[cfg(feature = "disable-logging")]
pub use disabled::RtLogger;

/// Log at an explicit level through an [`RtLogger`].
///
/// ```ignore
/// rt_log!(logger, RtLogLevel::Info, "Key {} @ {}", key, time);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($logger:expr, $level:expr, $($arg:tt)*) => {
        $logger.log($level, format_args!($($arg)*))
    };
}

/// RT-safe debug log.
#[macro_export]
macro_rules! rt_debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::rt_log!($logger, $crate::level::RtLogLevel::Debug, $($arg)*)
    };
}

/// RT-safe info log.
#[macro_export]
macro_rules! rt_info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::rt_log!($logger, $crate::level::RtLogLevel::Info, $($arg)*)
    };
}

/// RT-safe warning log.
#[macro_export]
macro_rules! rt_warning {
    ($logger:expr, $($arg:tt)*) => {
        $crate::rt_log!($logger, $crate::level::RtLogLevel::Warning, $($arg)*)
    };
}

/// RT-safe error log.
#[macro_export]
macro_rules! rt_error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::rt_log!($logger, $crate::level::RtLogLevel::Error, $($arg)*)
    };
}

#[cfg(not(feature = "disable-logging"))]
mod enabled {
    use core::fmt;
    use core::sync::atomic::{AtomicU8, Ordering};
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::level::RtLogLevel;
    use crate::message::{RtLogMessage, DEFAULT_MESSAGE_SIZE};
    use crate::queue::{TransportQueue, DEFAULT_QUEUE_SIZE};
    use crate::realtime::{current_rt_time, Clock};
    use crate::worker::{DrainWorker, WorkerState};

    /// RT-safe logger: `M`-byte messages through a `Q`-slot queue.
    ///
    /// # Producers
    ///
    /// One RT thread at a time. Concurrent producers are memory-safe but, without
    /// the `multi-producer` feature, a push that loses the race is dropped.
    pub struct RtLogger<const M: usize = DEFAULT_MESSAGE_SIZE, const Q: usize = DEFAULT_QUEUE_SIZE> {
        queue: Arc<TransportQueue<RtLogMessage<M>, Q>>,
        min_level: AtomicU8,
        clock: Clock,
        worker: DrainWorker,
    }

    impl<const M: usize, const Q: usize> RtLogger<M, Q> {
        /// Start a logger whose drain thread hands every message to `callback`.
        ///
        /// `min_log_level` is one of `debug|info|warning|error`
        /// (case-insensitive); anything else means `info`.
        pub fn new<F>(poll_period: Duration, callback: F, min_log_level: &str) -> io::Result<Self>
        where
            F: FnMut(&RtLogMessage<M>) + Send + 'static,
        {
            // Anchor the clock here so no RT thread pays for it
            current_rt_time();
            Self::with_clock(poll_period, callback, min_log_level, current_rt_time)
        }

        /// Same as [`RtLogger::new`] with an injected timestamp source.
        pub fn with_clock<F>(
            poll_period: Duration,
            mut callback: F,
            min_log_level: &str,
            clock: Clock,
        ) -> io::Result<Self>
        where
            F: FnMut(&RtLogMessage<M>) + Send + 'static,
        {
            let queue = Arc::new(TransportQueue::<RtLogMessage<M>, Q>::new());
            let drain_queue = Arc::clone(&queue);

            let worker = DrainWorker::spawn("rtlog-drain", poll_period, move || {
                while drain_queue.pop_with(|msg| callback(msg)) {}

                let dropped = drain_queue.take_dropped();
                if dropped > 0 {
                    let mut report = RtLogMessage::<M>::new();
                    report.set_message(
                        RtLogLevel::Warning,
                        clock(),
                        format_args!("Dropped {} real-time log messages", dropped),
                    );
                    callback(&report);
                }
            })?;

            Ok(Self {
                queue,
                min_level: AtomicU8::new(RtLogLevel::parse_or_default(min_log_level) as u8),
                clock,
                worker,
            })
        }

        /// Change the threshold. Safe to call while other threads log; an
        /// in-flight call may still use the old value.
        pub fn set_log_level(&self, min_log_level: &str) {
            let level = RtLogLevel::parse_or_default(min_log_level);
            self.min_level.store(level as u8, Ordering::Relaxed);
        }

        pub fn min_log_level(&self) -> RtLogLevel {
            RtLogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
        }

        #[inline]
        pub fn is_enabled(&self, level: RtLogLevel) -> bool {
            level as u8 <= self.min_level.load(Ordering::Relaxed)
        }

        /// Capture one message.
        ///
        /// # Timing
        ///
        /// Skipped level: one relaxed load. Otherwise one clock read, one
        /// bounded format into the slot, two atomic index operations.
        #[inline]
        pub fn log(&self, level: RtLogLevel, args: fmt::Arguments<'_>) {
            if !self.is_enabled(level) {
                return;
            }
            let timestamp = (self.clock)();
            self.queue.push_with(|slot| slot.set_message(level, timestamp, args));
        }

        #[inline]
        pub fn log_debug(&self, args: fmt::Arguments<'_>) {
            self.log(RtLogLevel::Debug, args);
        }

        #[inline]
        pub fn log_info(&self, args: fmt::Arguments<'_>) {
            self.log(RtLogLevel::Info, args);
        }

        #[inline]
        pub fn log_warning(&self, args: fmt::Arguments<'_>) {
            self.log(RtLogLevel::Warning, args);
        }

        #[inline]
        pub fn log_error(&self, args: fmt::Arguments<'_>) {
            self.log(RtLogLevel::Error, args);
        }

        /// Messages waiting for the next drain cycle.
        pub fn pending(&self) -> usize {
            self.queue.len()
        }

        /// Messages dropped since the last drain cycle reported them.
        pub fn dropped(&self) -> u32 {
            self.queue.dropped()
        }

        pub fn worker_state(&self) -> WorkerState {
            self.worker.state()
        }

        /// Stop the drain thread after a final drain pass. Further log calls
        /// are queued but never delivered.
        pub fn shutdown(&mut self) {
            self.worker.stop();
        }
    }
}

#[cfg(feature = "disable-logging")]
mod disabled {
    use core::fmt;
    use core::marker::PhantomData;
    use std::io;
    use std::time::Duration;

    use crate::level::RtLogLevel;
    use crate::message::{RtLogMessage, DEFAULT_MESSAGE_SIZE};
    use crate::queue::DEFAULT_QUEUE_SIZE;
    use crate::realtime::Clock;
    use crate::worker::WorkerState;

    /// Null-object logger: same API, no thread, no queue, no work.
    pub struct RtLogger<const M: usize = DEFAULT_MESSAGE_SIZE, const Q: usize = DEFAULT_QUEUE_SIZE> {
        _message: PhantomData<RtLogMessage<M>>,
    }

    impl<const M: usize, const Q: usize> RtLogger<M, Q> {
        pub fn new<F>(_poll_period: Duration, _callback: F, _min_log_level: &str) -> io::Result<Self>
        where
            F: FnMut(&RtLogMessage<M>) + Send + 'static,
        {
            Ok(Self { _message: PhantomData })
        }

        pub fn with_clock<F>(
            poll_period: Duration,
            callback: F,
            min_log_level: &str,
            _clock: Clock,
        ) -> io::Result<Self>
        where
            F: FnMut(&RtLogMessage<M>) + Send + 'static,
        {
            Self::new(poll_period, callback, min_log_level)
        }

        pub fn set_log_level(&self, _min_log_level: &str) {}

        pub fn min_log_level(&self) -> RtLogLevel {
            RtLogLevel::Error
        }

        #[inline(always)]
        pub fn is_enabled(&self, _level: RtLogLevel) -> bool {
            false
        }

        #[inline(always)]
        pub fn log(&self, _level: RtLogLevel, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn log_debug(&self, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn log_info(&self, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn log_warning(&self, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn log_error(&self, _args: fmt::Arguments<'_>) {}

        pub fn pending(&self) -> usize {
            0
        }

        pub fn dropped(&self) -> u32 {
            0
        }

        pub fn worker_state(&self) -> WorkerState {
            WorkerState::Stopped
        }

        pub fn shutdown(&mut self) {}
    }
}
