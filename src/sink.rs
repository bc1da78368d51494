//! Non-real-time backend: leveled, formatted, size-rotated file output.
//!
//! Everything here may block, allocate and do I/O. It is only ever called
//! from the drain thread or from non-RT threads.
//!
//! # Line formats
//!
//! ```text
//! Text: [2024-05-01 12:00:00.123] [warning] Buffer underrun
//! JSON: {"data":{"status":"Started"},"level":"info","name":"audio","process":4242,"thread":1,"time":"2024-05-01T12:00:00.123+0200"}
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::level::Severity;

/// Default rotation threshold in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_000_000;

/// Output line format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line; the message is embedded as `data`, parsed
    /// as JSON when it is valid JSON and as a string otherwise.
    Json,
}

/// One rendered log event on its way to a sink.
#[derive(Clone, Copy, Debug)]
pub struct LogRecord<'a> {
    pub severity: Severity,
    pub text: &'a str,
    pub time: SystemTime,
}

impl<'a> LogRecord<'a> {
    /// Record stamped with the current wall-clock time.
    pub fn now(severity: Severity, text: &'a str) -> Self {
        Self {
            severity,
            text,
            time: SystemTime::now(),
        }
    }
}

/// Backend contract: named, leveled, already-rendered text in.
pub trait LogSink: Send + Sync {
    /// Logical source name written with every record.
    fn name(&self) -> &str;

    fn level(&self) -> Severity;

    fn set_level(&self, level: Severity);

    fn should_log(&self, severity: Severity) -> bool {
        severity >= self.level()
    }

    fn write(&self, record: &LogRecord<'_>) -> io::Result<()>;

    fn flush(&self) -> io::Result<()>;
}

struct FileState {
    writer: BufWriter<File>,
    size: u64,
}

/// File sink rotating on size: `log.txt` → `log.1.txt` → … → `log.<max_files>.txt`.
pub struct RotatingFileSink {
    name: String,
    path: PathBuf,
    format: LogFormat,
    max_size: u64,
    max_files: usize,
    level: AtomicU8,
    flush_level: Severity,
    state: Mutex<FileState>,
}

impl RotatingFileSink {
    /// Open (append) `path`, creating parent directories as needed.
    pub fn new(
        name: &str,
        path: impl AsRef<Path>,
        format: LogFormat,
        max_size: u64,
        max_files: usize,
    ) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            name: name.to_string(),
            path,
            format,
            max_size,
            max_files,
            level: AtomicU8::new(Severity::Debug as u8),
            flush_level: Severity::Error,
            state: Mutex::new(FileState {
                writer: BufWriter::new(file),
                size,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        state.writer.flush()?;

        for i in (1..=self.max_files).rev() {
            let src = rotated_path(&self.path, i - 1);
            if !src.exists() {
                continue;
            }
            let target = rotated_path(&self.path, i);
            if target.exists() {
                fs::remove_file(&target)?;
            }
            fs::rename(&src, &target)?;
        }

        state.writer = BufWriter::new(File::create(&self.path)?);
        state.size = 0;
        debug!(sink = %self.name, path = %self.path.display(), "rotated log file");
        Ok(())
    }
}

impl LogSink for RotatingFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Severity {
        Severity::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn set_level(&self, level: Severity) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    fn write(&self, record: &LogRecord<'_>) -> io::Result<()> {
        let line = format_line(self.format, &self.name, record);
        let len = line.len() as u64;

        let mut state = self.state.lock();
        if state.size > 0 && state.size + len > self.max_size {
            if let Err(e) = self.rotate(&mut state) {
                // Keep appending to the current file rather than losing the record
                warn!(sink = %self.name, error = %e, "log rotation failed");
            }
        }

        state.writer.write_all(line.as_bytes())?;
        state.size += len;

        if record.severity >= self.flush_level {
            state.writer.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        self.state.lock().writer.flush()
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.state.get_mut().writer.flush() {
            warn!(sink = %self.name, error = %e, "failed to flush log file on close");
        }
    }
}

/// `dir/log.txt`, 2 → `dir/log.2.txt`; index 0 is the base path itself.
pub fn rotated_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let stem = base.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{}.{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}.{}", stem, index),
    };
    base.with_file_name(file_name)
}

static NEXT_THREAD_NUMBER: AtomicU64 = AtomicU64::new(1);

std::thread_local! {
    static THREAD_NUMBER: u64 = NEXT_THREAD_NUMBER.fetch_add(1, Ordering::Relaxed);
}

/// Small per-process number of the calling thread, assigned on first use.
fn thread_number() -> u64 {
    THREAD_NUMBER.with(|n| *n)
}

/// Render one record as a full line, newline included.
pub fn format_line(format: LogFormat, name: &str, record: &LogRecord<'_>) -> String {
    let time: DateTime<Local> = record.time.into();

    match format {
        LogFormat::Text => format!(
            "[{}] [{}] {}\n",
            time.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.severity,
            record.text
        ),
        LogFormat::Json => {
            let data = serde_json::from_str::<Value>(record.text)
                .unwrap_or_else(|_| Value::String(record.text.to_string()));
            let line = json!({
                "time": time.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
                "name": name,
                "level": record.severity.as_str(),
                "process": std::process::id(),
                "thread": thread_number(),
                "data": data,
            });
            format!("{}\n", line)
        }
    }
}
