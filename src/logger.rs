//! Backend logger: one entry point for RT and non-RT threads.
//!
//! Each call asks the realtime predicate which thread it is on. Real-time
//! threads go through the [`RtLogger`](crate::rt_logger::RtLogger) queue and
//! reach the file from the drain thread; everything else writes to the file
//! synchronously.
//!
//! ```text
//! RT thread  ──▶ RtLogger ──▶ queue ──▶ drain thread ──▶ bridge::forward ─┐
//!                                                                         ├─▶ RotatingFileSink
//! other      ─────────────────────────────────────────────────────────────┘
//! ```
//!
//! With the `disable-logging` feature this module exports a null-object
//! `BridgeLogger` with the same API: it opens no file, starts no thread and
//! writes nothing.

#[cfg(not(feature = "disable-logging"))]
pub use enabled::BridgeLogger;

#[cfg(feature = "disable-logging")]
pub use disabled::BridgeLogger;

#[cfg(not(feature = "disable-logging"))]
mod enabled {
    use core::fmt;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::{Mutex, RwLock};
    use tracing::{debug, info, warn};

    use super::{parse_severity, rt_level};
    use crate::bridge;
    use crate::config::{LoggerConfig, SinkOptions};
    use crate::error::{LogError, StartFailure};
    use crate::level::Severity;
    use crate::message::RtLogMessage;
    use crate::realtime::{is_current_thread_realtime, RealtimeProbe};
    use crate::registry::{self, Registration};
    use crate::rt_logger::RtLogger;
    use crate::sink::{LogFormat, LogRecord, LogSink, RotatingFileSink};
    use crate::worker::{DrainWorker, DEFAULT_POLL_PERIOD};

    const STARTED_STATUS: &str = r#"{ "status": "Started" }"#;
    const FINISHED_STATUS: &str = r#"{ "status": "Finished" }"#;

    struct Active {
        sink: Arc<RotatingFileSink>,
        rt: RtLogger,
        flusher: Option<DrainWorker>,
        _registration: Registration,
    }

    /// File logger with a real-time front door.
    ///
    /// Real-time callers only ever `try_read` the running state, so they
    /// never wait on [`shutdown`](Self::shutdown); a call racing it is dropped.
    pub struct BridgeLogger {
        min_log_level: Mutex<String>,
        format: LogFormat,
        poll_period: Duration,
        realtime: RealtimeProbe,
        options: SinkOptions,
        active: RwLock<Option<Active>>,
        closed: Arc<AtomicBool>,
    }

    impl BridgeLogger {
        /// Unstarted logger. Nothing is written until [`initialize`](Self::initialize).
        pub fn new(min_log_level: &str, format: LogFormat) -> Self {
            Self {
                min_log_level: Mutex::new(min_log_level.to_string()),
                format,
                poll_period: DEFAULT_POLL_PERIOD,
                realtime: is_current_thread_realtime,
                options: SinkOptions::default(),
                active: RwLock::new(None),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Replace the "is this thread real-time" predicate.
        pub fn with_realtime_probe(mut self, probe: RealtimeProbe) -> Self {
            self.realtime = probe;
            self
        }

        pub fn with_poll_period(mut self, period: Duration) -> Self {
            self.poll_period = period;
            self
        }

        /// Build and initialize a logger in one step.
        pub fn from_config(config: &LoggerConfig) -> Result<Self, LogError> {
            let mut logger = Self::new(&config.min_log_level, config.format).with_poll_period(config.poll_period());
            logger.initialize(config.sink.clone())?;
            Ok(logger)
        }

        /// Open the sink, claim the name and start the worker threads.
        ///
        /// A logger that is already running is shut down first.
        pub fn initialize(&mut self, options: SinkOptions) -> Result<(), LogError> {
            self.shutdown();

            let level_name = self.min_log_level.get_mut().clone();
            let severity = parse_severity(&level_name)?;
            let name = options.logger_name.clone();

            let registration = registry::register(&name, options.drop_logger_if_duplicate)
                .ok_or_else(|| LogError::start_failed(&name, StartFailure::DuplicateName))?;

            let sink = RotatingFileSink::new(
                &name,
                &options.log_file_path,
                self.format,
                options.max_file_size,
                options.max_files,
            )
            .map_err(|e| LogError::start_failed(&name, e))?;
            sink.set_level(severity);
            let sink = Arc::new(sink);

            let drain_sink = Arc::clone(&sink);
            let closed = Arc::clone(&self.closed);
            let rt = <RtLogger>::new(
                self.poll_period,
                move |msg: &RtLogMessage| {
                    if !closed.load(Ordering::Acquire) {
                        bridge::forward(drain_sink.as_ref(), msg);
                    }
                },
                rt_level(severity).as_str(),
            )
            .map_err(|e| LogError::start_failed(&name, StartFailure::Thread(e)))?;

            let flusher = if options.flush_interval_secs > 0 {
                let flush_sink = Arc::clone(&sink);
                let worker = DrainWorker::spawn("rtlog-flush", options.flush_interval(), move || {
                    if let Err(e) = flush_sink.flush() {
                        warn!(sink = flush_sink.name(), error = %e, "periodic flush failed");
                    }
                })
                .map_err(|e| LogError::start_failed(&name, StartFailure::Thread(e)))?;
                Some(worker)
            } else {
                None
            };

            let active = Active {
                sink,
                rt,
                flusher,
                _registration: registration,
            };
            match self.format {
                LogFormat::Json => write_to(&active, Severity::Info, format_args!("{}", STARTED_STATUS)),
                LogFormat::Text => write_to(&active, Severity::Info, format_args!("Started logger: {}.", name)),
            }

            self.closed.store(false, Ordering::Release);
            *self.active.get_mut() = Some(active);
            self.options = options;

            info!(logger = %name, path = %self.options.log_file_path.display(), level = %severity, "logger started");
            Ok(())
        }

        /// Change the threshold of both paths.
        ///
        /// The RT path falls back to `info` on an unknown name; the file path
        /// only changes when the name is valid.
        pub fn set_log_level(&self, min_log_level: &str) -> Result<(), LogError> {
            let parsed = parse_severity(min_log_level);
            let active = self.active.read();

            if let Some(active) = active.as_ref() {
                match &parsed {
                    Ok(severity) => active.rt.set_log_level(rt_level(*severity).as_str()),
                    Err(_) => active.rt.set_log_level(min_log_level),
                }
            }

            let severity = parsed?;
            *self.min_log_level.lock() = min_log_level.to_string();
            if let Some(active) = active.as_ref() {
                active.sink.set_level(severity);
            }
            debug!(level = %severity, "log level changed");
            Ok(())
        }

        pub fn debug(&self, args: fmt::Arguments<'_>) {
            self.dispatch(Severity::Debug, args);
        }

        pub fn info(&self, args: fmt::Arguments<'_>) {
            self.dispatch(Severity::Info, args);
        }

        pub fn warning(&self, args: fmt::Arguments<'_>) {
            self.dispatch(Severity::Warning, args);
        }

        pub fn error(&self, args: fmt::Arguments<'_>) {
            self.dispatch(Severity::Error, args);
        }

        /// Critical. On a real-time thread this is queued as an error.
        pub fn critical(&self, args: fmt::Arguments<'_>) {
            self.dispatch(Severity::Critical, args);
        }

        /// Flush and stop accepting messages. JSON logs get a final
        /// `{ "status": "Finished" }` record. Calling it again is a no-op.
        pub fn close_log(&self) {
            if let Some(active) = self.active.read().as_ref() {
                self.finish(active);
            }
        }

        /// Stop the workers after a final drain, close the log and release the
        /// logger name. Every handle to this logger becomes a no-op.
        ///
        /// Idempotent; also run on drop.
        pub fn shutdown(&self) {
            let Some(mut active) = self.active.write().take() else {
                return;
            };

            // Final drain first, so queued RT messages land before the close record
            active.rt.shutdown();
            if let Some(flusher) = active.flusher.as_mut() {
                flusher.stop();
            }
            self.finish(&active);
            debug!(logger = active.sink.name(), "logger shut down");
        }

        /// Configured threshold, as given.
        pub fn min_log_level(&self) -> String {
            self.min_log_level.lock().clone()
        }

        pub fn log_file_path(&self) -> &Path {
            &self.options.log_file_path
        }

        pub fn logger_name(&self) -> &str {
            &self.options.logger_name
        }

        pub fn format(&self) -> LogFormat {
            self.format
        }

        /// Whether the logger is running: initialized and not shut down.
        pub fn is_initialized(&self) -> bool {
            self.active.read().is_some()
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::Acquire)
        }

        /// Real-time messages dropped since the drain thread last reported.
        pub fn rt_dropped(&self) -> u32 {
            self.active.read().as_ref().map_or(0, |active| active.rt.dropped())
        }

        #[inline]
        fn dispatch(&self, severity: Severity, args: fmt::Arguments<'_>) {
            if self.closed.load(Ordering::Acquire) {
                return;
            }

            if (self.realtime)() {
                // Never wait here: busy means a shutdown is in progress
                if let Some(active) = self.active.try_read() {
                    if let Some(active) = active.as_ref() {
                        active.rt.log(rt_level(severity), args);
                    }
                }
            } else if let Some(active) = self.active.read().as_ref() {
                write_to(active, severity, args);
            }
        }

        fn finish(&self, active: &Active) {
            if self.closed.load(Ordering::Acquire) {
                return;
            }

            if self.format == LogFormat::Json {
                write_to(active, Severity::Info, format_args!("{}", FINISHED_STATUS));
            }
            if let Err(e) = active.sink.flush() {
                warn!(sink = active.sink.name(), error = %e, "failed to flush log on close");
            }
            self.closed.store(true, Ordering::Release);
            debug!(logger = active.sink.name(), "log closed");
        }
    }

    impl fmt::Debug for BridgeLogger {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("BridgeLogger")
                .field("name", &self.options.logger_name)
                .field("path", &self.options.log_file_path)
                .field("format", &self.format)
                .field("closed", &self.is_closed())
                .finish_non_exhaustive()
        }
    }

    impl Drop for BridgeLogger {
        fn drop(&mut self) {
            self.shutdown();
        }
    }

    fn write_to(active: &Active, severity: Severity, args: fmt::Arguments<'_>) {
        if !active.sink.should_log(severity) {
            return;
        }

        let text = args.to_string();
        if let Err(e) = active.sink.write(&LogRecord::now(severity, &text)) {
            warn!(sink = active.sink.name(), error = %e, "failed to write log record");
        }
    }
}

#[cfg(feature = "disable-logging")]
mod disabled {
    use core::fmt;
    use std::path::Path;
    use std::time::Duration;

    use crate::config::{LoggerConfig, SinkOptions};
    use crate::error::LogError;
    use crate::realtime::RealtimeProbe;
    use crate::sink::LogFormat;

    /// Null-object logger: same API, no file, no threads, no output.
    pub struct BridgeLogger {
        min_log_level: String,
        format: LogFormat,
        options: SinkOptions,
    }

    impl BridgeLogger {
        pub fn new(min_log_level: &str, format: LogFormat) -> Self {
            Self {
                min_log_level: min_log_level.to_string(),
                format,
                options: SinkOptions::default(),
            }
        }

        pub fn with_realtime_probe(self, _probe: RealtimeProbe) -> Self {
            self
        }

        pub fn with_poll_period(self, _period: Duration) -> Self {
            self
        }

        pub fn from_config(config: &LoggerConfig) -> Result<Self, LogError> {
            let mut logger = Self::new(&config.min_log_level, config.format);
            logger.initialize(config.sink.clone())?;
            Ok(logger)
        }

        /// Records the options; opens nothing.
        pub fn initialize(&mut self, options: SinkOptions) -> Result<(), LogError> {
            self.options = options;
            Ok(())
        }

        pub fn set_log_level(&self, _min_log_level: &str) -> Result<(), LogError> {
            Ok(())
        }

        #[inline(always)]
        pub fn debug(&self, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn info(&self, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn warning(&self, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn error(&self, _args: fmt::Arguments<'_>) {}

        #[inline(always)]
        pub fn critical(&self, _args: fmt::Arguments<'_>) {}

        pub fn close_log(&self) {}

        pub fn shutdown(&self) {}

        pub fn min_log_level(&self) -> String {
            self.min_log_level.clone()
        }

        pub fn log_file_path(&self) -> &Path {
            &self.options.log_file_path
        }

        pub fn logger_name(&self) -> &str {
            &self.options.logger_name
        }

        pub fn format(&self) -> LogFormat {
            self.format
        }

        pub fn is_initialized(&self) -> bool {
            false
        }

        pub fn is_closed(&self) -> bool {
            false
        }

        pub fn rt_dropped(&self) -> u32 {
            0
        }
    }

    impl fmt::Debug for BridgeLogger {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("BridgeLogger")
                .field("name", &self.options.logger_name)
                .field("disabled", &true)
                .finish_non_exhaustive()
        }
    }
}

#[cfg(not(feature = "disable-logging"))]
fn parse_severity(name: &str) -> Result<crate::level::Severity, crate::error::LogError> {
    name.parse::<crate::level::Severity>()
        .map_err(|_| crate::error::LogError::InvalidLogLevel(name.to_string()))
}

/// RT queue level for a backend severity. The RT scale has no critical.
#[cfg(not(feature = "disable-logging"))]
fn rt_level(severity: crate::level::Severity) -> crate::level::RtLogLevel {
    use crate::level::{RtLogLevel, Severity};

    match severity {
        Severity::Debug => RtLogLevel::Debug,
        Severity::Info => RtLogLevel::Info,
        Severity::Warning => RtLogLevel::Warning,
        Severity::Error | Severity::Critical => RtLogLevel::Error,
    }
}
