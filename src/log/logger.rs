//! The event log service
//!
//! [`EventLog`] is a cheap, cloneable handle; build one per process and pass
//! it to every screen or call site that needs to log. Independent instances
//! never share state.

use super::buffer::{LogBuffer, MAX_BUFFER_SIZE};
use super::entry::{payload, AppInfo, DeviceInfo, ErrorInfo, LogData, LogEntry};
use super::level::LogLevel;
use super::sink::{ConsoleSink, NoopRemoteSink, RemoteForwarder, RemoteSink, TracingConsole};
use super::source::{AppInfoSource, DeviceInfoSource, HostDevice, StaticAppInfo};
use super::timer::TimerHandle;
use crate::config::{Environment, LogConfig, MetadataMode};
use crate::Result;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

enum Metadata {
    PerEntry {
        device: Arc<dyn DeviceInfoSource>,
        app: Arc<dyn AppInfoSource>,
    },
    Cached {
        device: DeviceInfo,
        app: AppInfo,
    },
}

struct Inner {
    session_id: String,
    user_id: RwLock<Option<String>>,
    /// Guards append, eviction and the console write as one step
    buffer: Mutex<LogBuffer>,
    min_level: LogLevel,
    environment: Environment,
    metadata: Metadata,
    console: Arc<dyn ConsoleSink>,
    /// Present only in production
    remote: Option<RemoteForwarder>,
}

/// Builder for an [`EventLog`] with custom collaborators
pub struct EventLogBuilder {
    config: LogConfig,
    device: Arc<dyn DeviceInfoSource>,
    app: Option<Arc<dyn AppInfoSource>>,
    console: Arc<dyn ConsoleSink>,
    remote: Arc<dyn RemoteSink>,
}

impl EventLogBuilder {
    /// Create a builder with default collaborators
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            device: Arc::new(HostDevice),
            app: None,
            console: Arc::new(TracingConsole),
            remote: Arc::new(NoopRemoteSink),
        }
    }

    /// Set the device metadata source
    pub fn device_source(mut self, source: Arc<dyn DeviceInfoSource>) -> Self {
        self.device = source;
        self
    }

    /// Set the app metadata source
    pub fn app_source(mut self, source: Arc<dyn AppInfoSource>) -> Self {
        self.app = Some(source);
        self
    }

    /// Must not log back into the same [`EventLog`]
    pub fn console(mut self, console: Arc<dyn ConsoleSink>) -> Self {
        self.console = console;
        self
    }

    /// Set the sink for production ERROR/FATAL entries
    pub fn remote_sink(mut self, sink: Arc<dyn RemoteSink>) -> Self {
        self.remote = sink;
        self
    }

    /// Validate the config, start the forwarder and log the startup entry
    pub fn build(self) -> Result<EventLog> {
        self.config.validate()?;

        let app_source: Arc<dyn AppInfoSource> = match self.app {
            Some(source) => source,
            None => Arc::new(StaticAppInfo::from_config(&self.config)),
        };
        let environment = self.config.environment;

        let device = query_device(self.device.as_ref());
        let app = query_app(app_source.as_ref(), environment);

        let metadata = match self.config.metadata_mode {
            MetadataMode::PerEntry => Metadata::PerEntry {
                device: self.device,
                app: app_source,
            },
            MetadataMode::Cached => Metadata::Cached {
                device: device.for_entry(),
                app: app.clone(),
            },
        };

        let remote = if environment.is_production() {
            Some(RemoteForwarder::start(
                self.remote,
                Arc::clone(&self.console),
                self.config.remote_queue_size,
            )?)
        } else {
            None
        };

        let log = EventLog {
            inner: Arc::new(Inner {
                session_id: generate_session_id(),
                user_id: RwLock::new(None),
                buffer: Mutex::new(LogBuffer::new(MAX_BUFFER_SIZE)),
                min_level: self.config.effective_min_level(),
                environment,
                metadata,
                console: self.console,
                remote,
            }),
        };

        let mut startup = LogData::new();
        startup.insert(
            "sessionId".to_string(),
            Value::String(log.inner.session_id.clone()),
        );
        startup.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        startup.insert(
            "deviceInfo".to_string(),
            serde_json::to_value(&device).unwrap_or(Value::Null),
        );
        startup.insert(
            "appInfo".to_string(),
            serde_json::to_value(&app).unwrap_or(Value::Null),
        );
        log.info("Logger", "Application started", Some(startup));

        Ok(log)
    }
}

/// `"{unix millis}-{9 random lowercase alphanumerics}"`
fn generate_session_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn query_device(source: &dyn DeviceInfoSource) -> DeviceInfo {
    source
        .device_info()
        .map(DeviceInfo::normalized)
        .unwrap_or_else(|_| DeviceInfo::unknown())
}

fn query_app(source: &dyn AppInfoSource, environment: Environment) -> AppInfo {
    source
        .app_info()
        .unwrap_or_else(|_| AppInfo::unknown(environment))
}

/// Leveled, structured, bounded event log
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<Inner>,
}

impl EventLog {
    /// Build with host device info, tracing console and a no-op remote sink
    pub fn new(config: LogConfig) -> Result<Self> {
        EventLogBuilder::new(config).build()
    }

    /// Start a builder for custom collaborators
    pub fn builder(config: LogConfig) -> EventLogBuilder {
        EventLogBuilder::new(config)
    }

    /// Get the session id shared by every entry
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// Get the current user id, if set
    pub fn user_id(&self) -> Option<String> {
        self.inner.user_id.read().clone()
    }

    /// Get the lowest level that is retained
    pub fn min_level(&self) -> LogLevel {
        self.inner.min_level
    }

    /// Get the environment the log was built for
    pub fn environment(&self) -> Environment {
        self.inner.environment
    }

    /// Get the number of buffered entries
    pub fn len(&self) -> usize {
        self.inner.buffer.lock().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inner.buffer.lock().is_empty()
    }

    /// Get the capacity of the buffer
    pub fn capacity(&self) -> usize {
        self.inner.buffer.lock().capacity()
    }

    /// Log at DEBUG
    pub fn debug(&self, category: &str, message: &str, data: Option<LogData>) {
        self.log(LogLevel::Debug, category, message, data, None);
    }

    /// Log at INFO
    pub fn info(&self, category: &str, message: &str, data: Option<LogData>) {
        self.log(LogLevel::Info, category, message, data, None);
    }

    /// Log at WARN
    pub fn warn(&self, category: &str, message: &str, data: Option<LogData>) {
        self.log(LogLevel::Warn, category, message, data, None);
    }

    /// Log at ERROR, recording `error` if given
    pub fn error(
        &self,
        category: &str,
        message: &str,
        data: Option<LogData>,
        error: Option<ErrorInfo>,
    ) {
        self.log(LogLevel::Error, category, message, data, error);
    }

    /// Log at FATAL, recording `error` if given
    pub fn fatal(
        &self,
        category: &str,
        message: &str,
        data: Option<LogData>,
        error: Option<ErrorInfo>,
    ) {
        self.log(LogLevel::Fatal, category, message, data, error);
    }

    /// Attach `user_id` to every entry created from now on
    pub fn set_user_id(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        *self.inner.user_id.write() = Some(user_id.clone());
        self.info("Logger", "User ID set", payload(json!({ "userId": user_id })));
    }

    /// Log the start of `name` and return its completion handle
    pub fn start_timer(&self, name: &str) -> TimerHandle {
        let start = Instant::now();
        self.debug("Performance", &format!("Timer started: {name}"), None);
        TimerHandle::started_at(self.clone(), name.to_string(), start)
    }

    /// Log `"{action} on {screen}"` under `UserAction`
    pub fn log_user_action(&self, action: &str, screen: &str, data: Option<LogData>) {
        self.info("UserAction", &format!("{action} on {screen}"), data);
    }

    /// Log `"{from} -> {to}"` under `Navigation`
    pub fn log_navigation(&self, from: &str, to: &str, params: Option<LogData>) {
        self.info("Navigation", &format!("{from} -> {to}"), params);
    }

    /// ERROR when `error` is given, INFO otherwise, whatever the status code
    pub fn log_api_call(
        &self,
        method: &str,
        url: &str,
        status: Option<u16>,
        duration_ms: Option<u64>,
        error: Option<ErrorInfo>,
    ) {
        let level = if error.is_some() {
            LogLevel::Error
        } else {
            LogLevel::Info
        };

        let mut data = LogData::new();
        if let Some(status) = status {
            data.insert("status".to_string(), json!(status));
        }
        if let Some(duration) = duration_ms {
            data.insert("duration".to_string(), json!(duration));
        }

        self.log(level, "API", &format!("{method} {url}"), Some(data), error);
    }

    /// Oldest-first copy of the buffer, optionally filtered by level
    pub fn get_logs(&self, min_level: Option<LogLevel>) -> Vec<LogEntry> {
        self.inner.buffer.lock().snapshot(min_level)
    }

    /// Empty the buffer; the "Logs cleared" entry is its only occupant after
    pub fn clear_logs(&self) {
        let entry = (LogLevel::Info >= self.inner.min_level)
            .then(|| self.build_entry(LogLevel::Info, "Logger", "Logs cleared", None, None));

        let mut buffer = self.inner.buffer.lock();
        buffer.clear();
        if let Some(mut entry) = entry {
            entry.timestamp = buffer.next_timestamp();
            let line = entry.console_line();
            buffer.push(entry);
            self.inner.console.write(LogLevel::Info, &line);
        }
    }

    /// Pretty-printed JSON array of the buffer, oldest first
    pub fn export_logs(&self) -> String {
        let entries = self.get_logs(None);
        serde_json::to_string_pretty(&entries).unwrap_or_else(|e| {
            self.inner
                .console
                .warn(&format!("Failed to export logs: {e}"));
            "[]".to_string()
        })
    }

    fn log(
        &self,
        level: LogLevel,
        category: &str,
        message: &str,
        data: Option<LogData>,
        error: Option<ErrorInfo>,
    ) {
        if level < self.inner.min_level {
            return;
        }

        let mut entry = self.build_entry(level, category, message, data, error);
        let remote = self
            .inner
            .remote
            .as_ref()
            .filter(|_| level.is_severe());

        let forwarded = {
            let mut buffer = self.inner.buffer.lock();
            entry.timestamp = buffer.next_timestamp();
            let line = entry.console_line();
            let forwarded = remote.map(|_| entry.clone());
            buffer.push(entry);
            self.inner.console.write(level, &line);
            forwarded
        };

        if let (Some(remote), Some(entry)) = (remote, forwarded) {
            remote.forward(&entry);
        }
    }

    fn build_entry(
        &self,
        level: LogLevel,
        category: &str,
        message: &str,
        data: Option<LogData>,
        error: Option<ErrorInfo>,
    ) -> LogEntry {
        let (device_info, app_info) = match &self.inner.metadata {
            Metadata::PerEntry { device, app } => (
                query_device(device.as_ref()).for_entry(),
                query_app(app.as_ref(), self.inner.environment),
            ),
            Metadata::Cached { device, app } => (device.clone(), app.clone()),
        };

        LogEntry::new(
            level,
            category,
            message,
            self.inner.session_id.clone(),
            device_info,
            app_info,
        )
        .with_data(data)
        .with_user_id(self.user_id())
        .with_error(error)
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("session_id", &self.inner.session_id)
            .field("environment", &self.inner.environment)
            .field("min_level", &self.inner.min_level)
            .field("len", &self.len())
            .finish()
    }
}
