//! Destinations for finalized entries
//!
//! - [`ConsoleSink`]: synchronous, severity-routed text output
//! - [`RemoteSink`]: best-effort delivery of serialized entries, driven by a
//!   [`RemoteForwarder`] worker thread so callers never wait on it

use super::entry::LogEntry;
use super::level::LogLevel;
use crate::Result;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

pub trait ConsoleSink: Send + Sync {
    fn debug(&self, line: &str);
    fn info(&self, line: &str);
    fn warn(&self, line: &str);
    fn error(&self, line: &str);

    /// Route a line by severity; FATAL shares the error channel
    fn write(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug => self.debug(line),
            LogLevel::Info => self.info(line),
            LogLevel::Warn => self.warn(line),
            LogLevel::Error | LogLevel::Fatal => self.error(line),
        }
    }
}

/// Console output through the `tracing` macros
#[derive(Debug, Clone, Default)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn debug(&self, line: &str) {
        debug!("{}", line);
    }

    fn info(&self, line: &str) {
        info!("{}", line);
    }

    fn warn(&self, line: &str) {
        warn!("{}", line);
    }

    fn error(&self, line: &str) {
        error!("{}", line);
    }
}

/// Receives one serialized entry per call
pub trait RemoteSink: Send + Sync {
    fn send(&self, payload: &str) -> Result<()>;
}

/// Accepts everything and sends nothing
#[derive(Debug, Clone, Default)]
pub struct NoopRemoteSink;

impl RemoteSink for NoopRemoteSink {
    fn send(&self, _payload: &str) -> Result<()> {
        Ok(())
    }
}

/// Hands entries to a [`RemoteSink`] on a background thread
///
/// The worker exits once the forwarder is dropped and the queue drains.
pub struct RemoteForwarder {
    payload_tx: Sender<String>,
    console: Arc<dyn ConsoleSink>,
}

impl RemoteForwarder {
    /// Spawn the forwarding worker
    pub fn start(
        sink: Arc<dyn RemoteSink>,
        console: Arc<dyn ConsoleSink>,
        queue_size: usize,
    ) -> Result<Self> {
        let (payload_tx, payload_rx) = bounded::<String>(queue_size.max(1));
        let worker_console = Arc::clone(&console);

        thread::Builder::new()
            .name("readerlog-remote".to_string())
            .spawn(move || {
                while let Ok(payload) = payload_rx.recv() {
                    // Never retried
                    if let Err(e) = sink.send(&payload) {
                        worker_console.warn(&format!("Failed to send log to service: {e}"));
                    }
                }
            })?;

        Ok(Self {
            payload_tx,
            console,
        })
    }

    /// Queue an entry without blocking; problems only reach the console
    pub fn forward(&self, entry: &LogEntry) {
        let payload = match serde_json::to_string(entry) {
            Ok(payload) => payload,
            Err(e) => {
                self.console
                    .warn(&format!("Failed to serialize log for service: {e}"));
                return;
            }
        };

        match self.payload_tx.try_send(payload) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.console
                    .warn("Failed to send log to service: queue full, entry dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.console
                    .warn("Failed to send log to service: forwarder stopped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::log::entry::{AppInfo, DeviceInfo};
    use crate::LogError;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Lines(Mutex<Vec<(LogLevel, String)>>);

    impl ConsoleSink for Lines {
        fn debug(&self, line: &str) {
            self.0.lock().push((LogLevel::Debug, line.to_string()));
        }
        fn info(&self, line: &str) {
            self.0.lock().push((LogLevel::Info, line.to_string()));
        }
        fn warn(&self, line: &str) {
            self.0.lock().push((LogLevel::Warn, line.to_string()));
        }
        fn error(&self, line: &str) {
            self.0.lock().push((LogLevel::Error, line.to_string()));
        }
    }

    struct FailingSink;

    impl RemoteSink for FailingSink {
        fn send(&self, _payload: &str) -> Result<()> {
            Err(LogError::RemoteSink("503 from collector".to_string()))
        }
    }

    /// Holds every send until the gate is closed
    struct GatedSink {
        gate: crossbeam_channel::Receiver<()>,
    }

    impl RemoteSink for GatedSink {
        fn send(&self, _payload: &str) -> Result<()> {
            let _ = self.gate.recv();
            Ok(())
        }
    }

    struct PanickingSink;

    impl RemoteSink for PanickingSink {
        fn send(&self, _payload: &str) -> Result<()> {
            panic!("collector crashed");
        }
    }

    fn entry() -> LogEntry {
        LogEntry::new(
            LogLevel::Error,
            "Audio",
            "Speech synthesis failed",
            "session",
            DeviceInfo::unknown(),
            AppInfo::unknown(Environment::Production),
        )
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_fatal_routes_to_error() {
        let console = Lines::default();
        console.write(LogLevel::Fatal, "boom");
        console.write(LogLevel::Info, "hello");

        let lines = console.0.lock();
        assert_eq!(lines[0], (LogLevel::Error, "boom".to_string()));
        assert_eq!(lines[1], (LogLevel::Info, "hello".to_string()));
    }

    #[test]
    fn test_failure_becomes_console_warning() {
        let console = Arc::new(Lines::default());
        let forwarder =
            RemoteForwarder::start(Arc::new(FailingSink), console.clone(), 4).unwrap();

        forwarder.forward(&entry());

        assert!(wait_for(|| {
            console.0.lock().iter().any(|(level, line)| {
                *level == LogLevel::Warn && line.contains("503 from collector")
            })
        }));
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let console = Arc::new(Lines::default());
        let (gate_tx, gate_rx) = bounded::<()>(0);
        let forwarder =
            RemoteForwarder::start(Arc::new(GatedSink { gate: gate_rx }), console.clone(), 1)
                .unwrap();

        let started = Instant::now();
        for _ in 0..3 {
            forwarder.forward(&entry());
        }
        assert!(started.elapsed() < Duration::from_millis(500));

        assert!(console.0.lock().iter().any(|(level, line)| {
            *level == LogLevel::Warn && line.contains("queue full")
        }));
        drop(gate_tx);
    }

    #[test]
    fn test_stopped_worker_reported() {
        let console = Arc::new(Lines::default());
        let forwarder =
            RemoteForwarder::start(Arc::new(PanickingSink), console.clone(), 4).unwrap();

        forwarder.forward(&entry());

        assert!(wait_for(|| {
            forwarder.forward(&entry());
            console.0.lock().iter().any(|(level, line)| {
                *level == LogLevel::Warn && line.contains("forwarder stopped")
            })
        }));
    }

    #[test]
    fn test_noop_sink_is_silent() {
        let console = Arc::new(Lines::default());
        let forwarder =
            RemoteForwarder::start(Arc::new(NoopRemoteSink), console.clone(), 4).unwrap();

        forwarder.forward(&entry());
        thread::sleep(Duration::from_millis(20));

        assert!(console.0.lock().is_empty());
    }
}
