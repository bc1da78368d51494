//! # rt-log-bridge
//!
//! Real-time-safe logging bridged to a file logger.
//!
//! ## Architecture
//!
//! Real-time threads never touch the backend. A log call on an RT thread
//! formats into a fixed-size slot of a bounded SPSC queue and returns; a drain
//! thread empties the queue on a fixed period and hands each message to the
//! file sink:
//!
//! ```text
//! RT thread ──▶ RtLogger ──▶ TransportQueue ──▶ DrainWorker ──▶ bridge ──▶ RotatingFileSink
//!  no alloc      level        drop-new when       50 ms poll     level
//!  no lock       filter       full, counted       period         mapping
//! ```
//!
//! - [`RtLogger`]: the RT-safe capture facade
//! - [`BridgeLogger`]: one entry point for every thread; routes RT threads
//!   through the facade and writes directly otherwise
//! - [`log_globals`]: a process-wide `BridgeLogger` and the `log_*!` macros
//!
//! ## Features
//!
//! - `multi-producer`: concurrent producers spin on the queue instead of
//!   dropping the message that lost the race
//! - `disable-logging`: every RT log call and global macro compiles to nothing

pub mod bridge;
pub mod config;
pub mod error;
pub mod level;
pub mod log_globals;
pub mod logger;
pub mod message;
pub mod queue;
pub mod realtime;
pub mod registry;
pub mod rt_logger;
pub mod sink;
pub mod worker;

pub use config::{LoggerConfig, SinkOptions};
pub use error::{LogError, StartFailure};
pub use level::{RtLogLevel, Severity};
pub use log_globals::{init_logger, logger, shutdown_logger};
pub use logger::BridgeLogger;
pub use message::RtLogMessage;
pub use queue::TransportQueue;
pub use realtime::{is_current_thread_realtime, ThreadRtFlag};
pub use rt_logger::RtLogger;
pub use sink::{LogFormat, LogSink, RotatingFileSink};
pub use worker::{DrainWorker, WorkerState};
