//! Bridge from drained RT messages to the backend sink.
//!
//! Runs only on the drain thread, so blocking and allocation are fine here.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::level::{RtLogLevel, Severity};
use crate::message::RtLogMessage;
use crate::sink::{LogRecord, LogSink};

/// Backend severity for each RT level, indexed by `RtLogLevel as usize`.
const SEVERITY_TABLE: [Severity; 4] = [
    Severity::Error,   // RtLogLevel::Error
    Severity::Warning, // RtLogLevel::Warning
    Severity::Info,    // RtLogLevel::Info
    Severity::Debug,   // RtLogLevel::Debug
];

/// Map an RT level onto the backend scale.
#[inline]
pub fn backend_severity(level: RtLogLevel) -> Severity {
    SEVERITY_TABLE[level as usize]
}

/// Write one drained message to `sink`, keeping the time it was captured at.
///
/// Messages below the sink's own threshold are skipped. Write errors are
/// reported on the ambient log and otherwise swallowed: the drain thread must
/// keep going.
pub fn forward<const N: usize>(sink: &dyn LogSink, msg: &RtLogMessage<N>) {
    let severity = backend_severity(msg.level());
    if !sink.should_log(severity) {
        return;
    }

    let record = LogRecord {
        severity,
        text: msg.message(),
        time: message_time(msg),
    };
    if let Err(e) = sink.write(&record) {
        warn!(sink = sink.name(), error = %e, "failed to write real-time log message");
    }
}

/// Wall-clock time of a message stamped by the default clock.
///
/// On hosts the stamp is monotonic time anchored to the wall clock when the
/// first logger started, so it can trail a later system clock change.
/// On ESP-IDF it is time since boot.
pub fn message_time<const N: usize>(msg: &RtLogMessage<N>) -> SystemTime {
    UNIX_EPOCH + msg.timestamp()
}
