use super::level::LogLevel;
use crate::config::Environment;
use crate::Result;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::Write;

/// Structured payload attached to an entry
///
/// The log never interprets it, only stores and serializes it.
pub type LogData = serde_json::Map<String, Value>;

/// Turn any JSON value into an entry payload
///
/// Objects are used as-is, `null` means no payload, anything else is
/// wrapped under a `"value"` key.
pub fn payload(value: Value) -> Option<LogData> {
    match value {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            let mut map = LogData::new();
            map.insert("value".to_string(), other);
            Some(map)
        }
    }
}

/// Parse the output of [`EventLog::export_logs`](crate::EventLog::export_logs)
pub fn parse_export(json: &str) -> Result<Vec<LogEntry>> {
    Ok(serde_json::from_str(json)?)
}

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub platform: String,
    /// OS version
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_device: Option<bool>,
    /// Bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_memory: Option<u64>,
}

impl DeviceInfo {
    pub fn new(platform: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            version: version.into(),
            model: None,
            brand: None,
            is_device: None,
            total_memory: None,
        }
    }

    /// Placeholder used when the device can't be queried
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Fill blank required fields with `"unknown"` and drop blank optionals
    pub fn normalized(mut self) -> Self {
        if self.platform.trim().is_empty() {
            self.platform = UNKNOWN.to_string();
        }
        if self.version.trim().is_empty() {
            self.version = UNKNOWN.to_string();
        }
        self.model = self.model.filter(|m| !m.trim().is_empty());
        self.brand = self.brand.filter(|b| !b.trim().is_empty());
        self
    }

    /// The subset attached to every entry
    pub fn for_entry(&self) -> Self {
        Self {
            is_device: None,
            total_memory: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<String>,
    pub environment: Environment,
    /// `"native"` or `"web"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl AppInfo {
    pub fn unknown(environment: Environment) -> Self {
        Self {
            version: UNKNOWN.to_string(),
            build_number: None,
            environment,
            platform: None,
        }
    }
}

/// A caller-supplied error recorded as entry payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Capture name, message, cause chain and (if enabled) a backtrace
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let name = short_type_name(std::any::type_name::<E>());
        let mut stack = format!("{name}: {err}");

        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(stack, "\n    caused by: {cause}");
            source = cause.source();
        }

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(stack, "\n{backtrace}");
        }

        Self {
            name,
            message: err.to_string(),
            stack: Some(stack),
        }
    }
}

impl From<&anyhow::Error> for ErrorInfo {
    fn from(err: &anyhow::Error) -> Self {
        Self {
            name: "Error".to_string(),
            message: err.to_string(),
            // Debug output carries the context chain and any backtrace
            stack: Some(format!("{err:?}")),
        }
    }
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// One logged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LogData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub session_id: String,
    pub device_info: DeviceInfo,
    pub app_info: AppInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        category: impl Into<String>,
        message: impl Into<String>,
        session_id: impl Into<String>,
        device_info: DeviceInfo,
        app_info: AppInfo,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            category: category.into(),
            message: message.into(),
            data: None,
            user_id: None,
            session_id: session_id.into(),
            device_info,
            app_info,
            stack_trace: None,
        }
    }

    pub fn with_data(mut self, data: Option<LogData>) -> Self {
        self.data = data;
        self
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Record a caller error: `errorName`/`errorMessage` merged into the
    /// payload, stack kept alongside
    pub fn with_error(mut self, error: Option<ErrorInfo>) -> Self {
        if let Some(error) = error {
            let data = self.data.get_or_insert_with(LogData::new);
            data.insert("errorName".to_string(), Value::String(error.name));
            data.insert("errorMessage".to_string(), Value::String(error.message));
            self.stack_trace = error.stack;
        }
        self
    }

    /// Human-readable console rendition
    pub fn console_line(&self) -> String {
        let time = self.timestamp.with_timezone(&Local).format("%H:%M:%S");
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            time, self.level, self.category, self.message
        );

        if let Some(data) = &self.data {
            if let Ok(json) = serde_json::to_string(data) {
                let _ = write!(line, " {json}");
            }
        }

        if self.level.is_severe() {
            if let Some(stack) = &self.stack_trace {
                let _ = write!(line, "\n{stack}");
            }
        }

        line
    }
}
