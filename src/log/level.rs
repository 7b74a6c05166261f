use crate::LogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log entry
///
/// Serialized as its integer value so exports stay compact and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Whether entries at this level go to the remote sink in production
    pub fn is_severe(&self) -> bool {
        *self >= LogLevel::Error
    }
}

impl From<LogLevel> for u8 {
    fn from(level: LogLevel) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = LogError;

    fn try_from(value: u8) -> Result<Self, LogError> {
        LogLevel::ALL
            .get(value as usize)
            .copied()
            .ok_or(LogError::InvalidLevel(value))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<u8>() {
            return LogLevel::try_from(value);
        }
        LogLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LogError::ConfigError(format!("unknown log level: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "2");
        let level: LogLevel = serde_json::from_str("4").unwrap();
        assert_eq!(level, LogLevel::Fatal);
        assert!(serde_json::from_str::<LogLevel>("7").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("3".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_severity() {
        assert!(!LogLevel::Warn.is_severe());
        assert!(LogLevel::Error.is_severe());
        assert!(LogLevel::Fatal.is_severe());
    }
}
