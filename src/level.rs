//! Severity levels on both sides of the bridge.
//!
//! [`RtLogLevel`] is what real-time code filters and records. [`Severity`] is
//! the backend's five-level scale (it adds `Critical`). Parsing differs on
//! purpose: the RT side never fails and falls back to `Info`, the backend side
//! is strict so initialization can report a bad level.

use core::fmt;
use core::str::FromStr;

/// Level names accepted on the RT side, indexed by discriminant.
const RT_LEVEL_NAMES: [&str; 4] = ["error", "warning", "info", "debug"];

/// Real-time log level.
///
/// Lower discriminant means more severe. A message is captured when
/// `level <= minimum`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum RtLogLevel {
    Error = 0,
    Warning = 1,
    #[default]
    Info = 2,
    Debug = 3,
}

impl RtLogLevel {
    /// All levels, most severe first.
    pub const ALL: [RtLogLevel; 4] = [
        RtLogLevel::Error,
        RtLogLevel::Warning,
        RtLogLevel::Info,
        RtLogLevel::Debug,
    ];

    /// Parse a level name case-insensitively.
    ///
    /// Returns `None` for anything outside `debug|info|warning|error`.
    /// Does not allocate, so it may be called from any context.
    pub fn parse(name: &str) -> Option<Self> {
        RT_LEVEL_NAMES
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|idx| Self::ALL[idx])
    }

    /// Parse a level name, resolving unknown names to `Info`.
    ///
    /// This is the documented fallback for the RT facade: a bad level string
    /// is a configuration slip, not something an RT caller can handle.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    /// Convert from raw u8 value (saturating at `Debug`).
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => RtLogLevel::Error,
            1 => RtLogLevel::Warning,
            2 => RtLogLevel::Info,
            _ => RtLogLevel::Debug,
        }
    }

    /// Lower-case name, as accepted by [`RtLogLevel::parse`].
    pub fn as_str(self) -> &'static str {
        RT_LEVEL_NAMES[self as usize]
    }
}

impl fmt::Display for RtLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.as_str())
    }
}

/// Backend severity.
///
/// Ordered from least to most severe so that `severity >= threshold` reads
/// naturally in the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Severity {
    Debug = 0,
    #[default]
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl Severity {
    /// Convert from raw u8 value (saturating at `Critical`).
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Debug,
            1 => Severity::Info,
            2 => Severity::Warning,
            3 => Severity::Error,
            _ => Severity::Critical,
        }
    }

    /// Name written into log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!(
                "Invalid log level: '{s}'. Valid levels are: debug, info, warning, error, critical",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rt_level_ordering() {
        assert!(RtLogLevel::Error < RtLogLevel::Warning);
        assert!(RtLogLevel::Warning < RtLogLevel::Info);
        assert!(RtLogLevel::Info < RtLogLevel::Debug);
    }

    #[test]
    fn test_rt_level_parse_case_insensitive() {
        assert_eq!(RtLogLevel::parse("debug"), Some(RtLogLevel::Debug));
        assert_eq!(RtLogLevel::parse("WARNING"), Some(RtLogLevel::Warning));
        assert_eq!(RtLogLevel::parse("eRrOr"), Some(RtLogLevel::Error));
        assert_eq!(RtLogLevel::parse("warn"), None);
        assert_eq!(RtLogLevel::parse(""), None);
    }

    #[test]
    fn test_rt_level_fallback_is_info() {
        assert_eq!(RtLogLevel::parse_or_default("debbbug"), RtLogLevel::Info);
        assert_eq!(RtLogLevel::parse_or_default("critical"), RtLogLevel::Info);
        assert_eq!(RtLogLevel::parse_or_default("Debug"), RtLogLevel::Debug);
    }

    #[test]
    fn test_rt_level_u8_round_trip() {
        for level in RtLogLevel::ALL {
            assert_eq!(RtLogLevel::from_u8(level as u8), level);
        }
        assert_eq!(RtLogLevel::from_u8(200), RtLogLevel::Debug);
    }

    #[test]
    fn test_rt_level_display() {
        assert_eq!(RtLogLevel::Warning.to_string(), "[warning]");
    }

    #[test]
    fn test_severity_strict_parse() {
        assert_eq!("critical".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!("Info".parse::<Severity>(), Ok(Severity::Info));
        let err = "debbbug".parse::<Severity>().unwrap_err();
        assert!(err.contains("debbbug"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Error < Severity::Critical);
        assert_eq!(Severity::from_u8(Severity::Warning as u8), Severity::Warning);
    }
}
