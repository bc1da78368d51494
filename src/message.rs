//! Fixed-capacity log message.
//!
//! # Layout
//!
//! ```text
//! ┌───────┬───────────┬────────┬──────────────────────────────┐
//! │ level │ timestamp │ length │ text[N] ... '\0' ...         │
//! └───────┴───────────┴────────┴──────────────────────────────┘
//! ```
//!
//! The whole record is `Copy` and owns no heap memory, so the transport queue
//! can move it by value between the RT thread and the drain thread.
//!
//! # Rules
//!
//! - `length <= N - 1`
//! - `text[length] == 0` after every mutation
//! - Overflowing output is truncated silently, never reported

use core::ffi::CStr;
use core::fmt;
use core::time::Duration;

use crate::level::RtLogLevel;

/// Default message capacity in bytes (terminator included).
pub const DEFAULT_MESSAGE_SIZE: usize = 2048;

/// A single log event with a bounded payload of `N` bytes.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct RtLogMessage<const N: usize = DEFAULT_MESSAGE_SIZE> {
    level: RtLogLevel,
    timestamp: Duration,
    length: usize,
    text: [u8; N],
}

impl<const N: usize> RtLogMessage<N> {
    /// Create an empty `Info` message with a zero timestamp.
    ///
    /// # Panics
    ///
    /// Panics at compile time (in const contexts) if `N` is zero: there would
    /// be no room for the terminator.
    pub const fn new() -> Self {
        assert!(N > 0, "Message buffer must hold at least the terminator");

        Self {
            level: RtLogLevel::Info,
            timestamp: Duration::ZERO,
            length: 0,
            text: [0; N],
        }
    }

    /// Render `args` into the buffer.
    ///
    /// Output longer than `N - 1` bytes is cut at the last character that
    /// fits. Never allocates.
    #[inline]
    pub fn set_message(&mut self, level: RtLogLevel, timestamp: Duration, args: fmt::Arguments<'_>) {
        self.level = level;
        self.timestamp = timestamp;
        self.length = format_to_buffer(&mut self.text[..N - 1], args);
        self.text[self.length] = 0;
    }

    /// Back to the freshly constructed state.
    pub fn reset(&mut self) {
        self.level = RtLogLevel::Info;
        self.timestamp = Duration::ZERO;
        self.length = 0;
        self.text[0] = 0;
    }

    /// Formatted text, without the terminator.
    #[inline]
    pub fn message(&self) -> &str {
        let bytes = self.as_bytes();
        match core::str::from_utf8(bytes) {
            Ok(text) => text,
            // Only reachable if a Display impl wrote invalid UTF-8 through unsafe code.
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    /// Formatted bytes, without the terminator.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.text[..self.length]
    }

    /// Null-terminated view. Stops early if the text itself contains a NUL.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.text[..=self.length]).unwrap_or_default()
    }

    #[inline]
    pub fn level(&self) -> RtLogLevel {
        self.level
    }

    #[inline]
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Length of the formatted text, excluding the terminator.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Maximum number of text bytes a message can hold.
    #[inline]
    pub const fn capacity() -> usize {
        N - 1
    }
}

impl<const N: usize> Default for RtLogMessage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for RtLogMessage<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtLogMessage")
            .field("level", &self.level)
            .field("timestamp", &self.timestamp)
            .field("length", &self.length)
            .field("message", &self.message())
            .finish()
    }
}

impl<const N: usize> PartialEq for RtLogMessage<N> {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level
            && self.timestamp == other.timestamp
            && self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for RtLogMessage<N> {}

/// `<seconds>.<millis> [level] [RT] text`
impl<const N: usize> fmt::Display for RtLogMessage<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:03} {} [RT] {}",
            self.timestamp.as_secs(),
            self.timestamp.subsec_millis(),
            self.level,
            self.message()
        )
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written. Output that does not fit is dropped at
/// a character boundary and formatting stops early.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let remaining = self.buf.len() - self.pos;
            if s.len() <= remaining {
                self.buf[self.pos..self.pos + s.len()].copy_from_slice(s.as_bytes());
                self.pos += s.len();
                return Ok(());
            }

            let mut cut = remaining;
            while !s.is_char_boundary(cut) {
                cut -= 1;
            }
            self.buf[self.pos..self.pos + cut].copy_from_slice(&s.as_bytes()[..cut]);
            self.pos += cut;
            // Full: abort the rest of the formatting work
            Err(fmt::Error)
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = fmt::write(&mut writer, args);
    writer.pos
}
