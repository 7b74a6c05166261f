//! Configuration for the event log
//!
//! Everything here is fixed once the [`EventLog`](crate::EventLog) is built.

use crate::log::LogLevel;
use crate::{LogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Build environment the app is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Environment implied by the build profile
    pub fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    /// Name used in app info and config values
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Lowest level retained by default
    pub fn default_min_level(&self) -> LogLevel {
        match self {
            Environment::Development => LogLevel::Debug,
            Environment::Production => LogLevel::Info,
        }
    }

    /// Check if severe entries should reach the remote sink
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(LogError::ConfigError(format!("unknown environment: {other}"))),
        }
    }
}

/// When device and app metadata is gathered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataMode {
    /// Query the sources again for every entry
    #[default]
    PerEntry,
    /// Query once at construction and reuse the snapshot
    Cached,
}

/// Configuration for an [`EventLog`](crate::EventLog)
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub environment: Environment,

    /// Overrides the environment's default threshold
    pub min_level: Option<LogLevel>,

    pub metadata_mode: MetadataMode,

    /// Capacity of the remote forwarding queue
    pub remote_queue_size: usize,

    pub app_version: String,

    pub build_number: Option<String>,

    /// `"native"` or `"web"`
    pub app_platform: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            environment: Environment::from_build(),
            min_level: None,
            metadata_mode: MetadataMode::default(),
            remote_queue_size: 64,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            build_number: None,
            app_platform: "native".to_string(),
        }
    }
}

impl LogConfig {
    /// Create a development configuration
    pub fn development() -> Self {
        Self::default().with_environment(Environment::Development)
    }

    /// Create a production configuration
    pub fn production() -> Self {
        Self::default().with_environment(Environment::Production)
    }

    /// Load configuration from `READERLOG_*` environment variables
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(env) = std::env::var("READERLOG_ENV") {
            config.environment = env.parse()?;
        }
        if let Ok(level) = std::env::var("READERLOG_MIN_LEVEL") {
            config.min_level = Some(level.parse()?);
        }
        if let Ok(version) = std::env::var("READERLOG_APP_VERSION") {
            config.app_version = version;
        }
        if let Ok(build) = std::env::var("READERLOG_BUILD_NUMBER") {
            config.build_number = Some(build);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the minimum retained level
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Set when device and app metadata is gathered
    pub fn with_metadata_mode(mut self, mode: MetadataMode) -> Self {
        self.metadata_mode = mode;
        self
    }

    /// Set the reported app version
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Set the reported build number
    pub fn with_build_number(mut self, build: impl Into<String>) -> Self {
        self.build_number = Some(build.into());
        self
    }

    /// Set the remote forwarding queue capacity
    pub fn with_remote_queue_size(mut self, size: usize) -> Self {
        self.remote_queue_size = size;
        self
    }

    /// Threshold the log will run with
    pub fn effective_min_level(&self) -> LogLevel {
        self.min_level
            .unwrap_or_else(|| self.environment.default_min_level())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.remote_queue_size == 0 {
            return Err(LogError::ConfigError(
                "remote queue size must be at least 1".to_string(),
            ));
        }
        if self.app_version.trim().is_empty() {
            return Err(LogError::ConfigError("app version is required".to_string()));
        }
        Ok(())
    }
}
