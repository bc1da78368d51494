//! Module: config
//!
//! Purpose: Logger configuration, from serde sources or the environment.
//!
//! Layout: [`LoggerConfig`] carries the facade settings and embeds the
//! backend [`SinkOptions`] flattened, so one flat table configures both:
//!
//! ```toml
//! min_log_level = "warning"
//! format = "json"
//! log_file_path = "/var/log/app/log.txt"
//! logger_name = "audio"
//! flush_interval_secs = 2
//! ```
//!
//! Environment overrides: `RTLOG_LEVEL`, `RTLOG_FILE`, `RTLOG_NAME`,
//! `RTLOG_FORMAT`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::sink::{LogFormat, DEFAULT_MAX_FILE_SIZE};

pub const ENV_LEVEL: &str = "RTLOG_LEVEL";
pub const ENV_FILE: &str = "RTLOG_FILE";
pub const ENV_NAME: &str = "RTLOG_NAME";
pub const ENV_FORMAT: &str = "RTLOG_FORMAT";

/// Backend sink settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SinkOptions {
    pub log_file_path: PathBuf,
    pub logger_name: String,
    /// Periodic flush interval; 0 disables the flush worker.
    pub flush_interval_secs: u64,
    /// Take over a name already held by another live logger instead of failing.
    pub drop_logger_if_duplicate: bool,
    /// Rotated files kept besides the active one.
    pub max_files: usize,
    pub max_file_size: u64,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            log_file_path: PathBuf::from("log.txt"),
            logger_name: "rtlog".to_string(),
            flush_interval_secs: 0,
            drop_logger_if_duplicate: false,
            max_files: 1,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl SinkOptions {
    pub fn new(log_file_path: impl Into<PathBuf>, logger_name: impl Into<String>) -> Self {
        Self {
            log_file_path: log_file_path.into(),
            logger_name: logger_name.into(),
            ..Self::default()
        }
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_secs = interval.as_secs();
        self
    }

    pub fn with_drop_if_duplicate(mut self, replace: bool) -> Self {
        self.drop_logger_if_duplicate = replace;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

/// Full logger configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// `debug|info|warning|error|critical`, validated at initialization.
    pub min_log_level: String,
    pub format: LogFormat,
    /// Drain worker wake-up period.
    pub poll_period_ms: u64,
    #[serde(flatten)]
    pub sink: SinkOptions,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_log_level: "info".to_string(),
            format: LogFormat::Text,
            poll_period_ms: 50,
            sink: SinkOptions::default(),
        }
    }
}

impl LoggerConfig {
    /// Defaults overlaid with the `RTLOG_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values found through `lookup`. Unknown formats are ignored.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LEVEL) {
            self.min_log_level = level;
        }
        if let Some(path) = lookup(ENV_FILE) {
            self.sink.log_file_path = PathBuf::from(path);
        }
        if let Some(name) = lookup(ENV_NAME) {
            self.sink.logger_name = name;
        }
        if let Some(format) = lookup(ENV_FORMAT) {
            match format.to_ascii_lowercase().as_str() {
                "text" => self.format = LogFormat::Text,
                "json" => self.format = LogFormat::Json,
                other => warn!(value = other, "ignoring unknown {}", ENV_FORMAT),
            }
        }
        self
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }
}
