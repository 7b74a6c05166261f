//! Structured event log for the audiobook reader app
//!
//! Screens and platform call sites hand leveled, categorized events to an
//! [`EventLog`]; it enriches them with session, device and app metadata,
//! keeps the most recent ones in a bounded buffer, mirrors them to the
//! console and forwards severe ones to a remote sink in production.

pub mod config;
pub mod log;

pub use config::{Environment, LogConfig, MetadataMode};
pub use log::{
    parse_export, payload, AppInfo, DeviceInfo, ErrorInfo, EventLog, EventLogBuilder, LogData,
    LogEntry, LogLevel, TimerHandle, MAX_BUFFER_SIZE,
};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LogError {
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Remote sink error: {0}")]
    RemoteSink(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(u8),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for LogError {
    fn from(e: std::io::Error) -> Self {
        LogError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for LogError {
    fn from(e: serde_json::Error) -> Self {
        LogError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LogError>;
