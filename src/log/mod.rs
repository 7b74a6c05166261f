pub mod buffer;
pub mod entry;
pub mod level;
pub mod logger;
pub mod sink;
pub mod source;
pub mod timer;

pub use buffer::{LogBuffer, MAX_BUFFER_SIZE};
pub use entry::{parse_export, payload, AppInfo, DeviceInfo, ErrorInfo, LogData, LogEntry};
pub use level::LogLevel;
pub use logger::{EventLog, EventLogBuilder};
pub use sink::{ConsoleSink, NoopRemoteSink, RemoteForwarder, RemoteSink, TracingConsole};
pub use source::{AppInfoSource, DeviceInfoSource, HostDevice, StaticAppInfo};
pub use timer::TimerHandle;
