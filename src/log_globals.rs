//! Global logger instance.
//!
//! One process-wide [`BridgeLogger`] behind a `parking_lot` rwlock, plus the
//! `log_*!` macros that reach it from anywhere.
//!
//! The macros only ever `try_read` the slot: a thread never waits on it, so
//! real-time threads can use them. A message logged while the slot is being
//! swapped by [`init_logger`] or [`shutdown_logger`] is dropped.
//!
//! ```ignore
//! rt_log_bridge::declare_log_module!("audio");
//!
//! fn process() {
//!     log_warning!("underrun on channel {}", 2); // "[audio] underrun on channel 2"
//! }
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::LoggerConfig;
use crate::error::LogError;
use crate::logger::BridgeLogger;

static LOGGER: RwLock<Option<Arc<BridgeLogger>>> = RwLock::new(None);

/// Build a logger from `config` and install it, replacing any previous one.
///
/// The previous logger is shut down first so its name is free to reuse.
pub fn init_logger(config: &LoggerConfig) -> Result<Arc<BridgeLogger>, LogError> {
    shutdown_logger();

    let logger = Arc::new(BridgeLogger::from_config(config)?);
    *LOGGER.write() = Some(Arc::clone(&logger));
    debug!(logger = logger.logger_name(), "global logger installed");
    Ok(logger)
}

/// Shared handle to the installed logger.
pub fn logger() -> Result<Arc<BridgeLogger>, LogError> {
    LOGGER.read().clone().ok_or(LogError::LoggerNotInitialized)
}

/// Run `f` against the installed logger without blocking.
///
/// Returns `None` when no logger is installed or the slot is busy.
#[inline]
pub fn with_logger<R>(f: impl FnOnce(&BridgeLogger) -> R) -> Option<R> {
    let guard = LOGGER.try_read()?;
    guard.as_deref().map(f)
}

/// Uninstall the global logger and shut it down.
///
/// The log is closed and its name released right away, even while other
/// handles from [`logger`] or [`init_logger`] are still alive; those handles
/// then do nothing.
pub fn shutdown_logger() {
    let previous = LOGGER.write().take();
    if let Some(logger) = previous {
        logger.shutdown();
        debug!(logger = logger.logger_name(), "global logger removed");
    }
}

/// Define the `[module] ` prefix used by the `log_*!` macros in this module.
///
/// Without an argument the Rust module path is used.
#[macro_export]
macro_rules! declare_log_module {
    () => {
        #[allow(dead_code)]
        const LOG_MODULE_PREFIX: &str = module_path!();
    };
    ($name:expr) => {
        #[allow(dead_code)]
        const LOG_MODULE_PREFIX: &str = $name;
    };
}

#[cfg(not(feature = "disable-logging"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_global {
    ($method:ident, $($arg:tt)*) => {
        $crate::log_globals::with_logger(|logger| {
            logger.$method(format_args!("[{}] {}", LOG_MODULE_PREFIX, format_args!($($arg)*)))
        })
    };
}

#[cfg(feature = "disable-logging")]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_global {
    ($method:ident, $($arg:tt)*) => {
        ()
    };
}

/// Debug log through the global logger.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::__log_global!(debug, $($arg)*)
    };
}

/// Info log through the global logger.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::__log_global!(info, $($arg)*)
    };
}

/// Warning log through the global logger.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::__log_global!(warning, $($arg)*)
    };
}

/// Error log through the global logger.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::__log_global!(error, $($arg)*)
    };
}

/// Critical log through the global logger.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)*) => {
        $crate::__log_global!(critical, $($arg)*)
    };
}

/// `log_debug!` when `$cond` holds.
#[macro_export]
macro_rules! log_debug_if {
    ($cond:expr, $($arg:tt)*) => {
        if $cond {
            $crate::log_debug!($($arg)*);
        }
    };
}

/// `log_info!` when `$cond` holds.
#[macro_export]
macro_rules! log_info_if {
    ($cond:expr, $($arg:tt)*) => {
        if $cond {
            $crate::log_info!($($arg)*);
        }
    };
}

/// `log_warning!` when `$cond` holds.
#[macro_export]
macro_rules! log_warning_if {
    ($cond:expr, $($arg:tt)*) => {
        if $cond {
            $crate::log_warning!($($arg)*);
        }
    };
}

/// `log_error!` when `$cond` holds.
#[macro_export]
macro_rules! log_error_if {
    ($cond:expr, $($arg:tt)*) => {
        if $cond {
            $crate::log_error!($($arg)*);
        }
    };
}

/// `log_critical!` when `$cond` holds.
#[macro_export]
macro_rules! log_critical_if {
    ($cond:expr, $($arg:tt)*) => {
        if $cond {
            $crate::log_critical!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing in the unit test binary installs a global logger; the install
    // lifecycle is covered in tests/global_logger_tests.rs.

    #[test]
    fn test_logger_not_initialized() {
        let error = logger().unwrap_err();
        assert_eq!(error.code(), "LOGGER_NOT_INITIALIZED");
    }

    #[test]
    fn test_macros_without_logger_are_noops() {
        crate::declare_log_module!("unit");
        assert_eq!(LOG_MODULE_PREFIX, "unit");

        assert!(with_logger(|_| ()).is_none());
        crate::log_info!("dropped {}", 1);
        crate::log_error_if!(true, "dropped {}", 2);
    }
}
