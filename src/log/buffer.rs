use super::entry::LogEntry;
use super::level::LogLevel;
use chrono::{DateTime, Utc};
use ringbuf::{traits::*, HeapRb};

/// Number of entries retained in memory
pub const MAX_BUFFER_SIZE: usize = 1000;

/// Bounded, insertion-ordered retention of log entries
///
/// When full, the oldest entry is dropped to make room for the newest.
/// Not synchronized; the owner guards it.
pub struct LogBuffer {
    entries: HeapRb<LogEntry>,
    /// Survives `clear` so stamps never go backwards within a session
    last_stamp: Option<DateTime<Utc>>,
}

impl LogBuffer {
    /// Create a new buffer with the specified capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HeapRb::new(capacity.max(1)),
            last_stamp: None,
        }
    }

    /// Timestamp for the next entry, never earlier than the previous one
    pub fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = self.last_stamp.map_or(now, |last| last.max(now));
        self.last_stamp = Some(stamp);
        stamp
    }

    /// Append an entry, returning the one evicted to make room, if any
    pub fn push(&mut self, entry: LogEntry) -> Option<LogEntry> {
        self.entries.push_overwrite(entry)
    }

    /// Oldest-first copy of the entries at or above `min_level`
    pub fn snapshot(&self, min_level: Option<LogLevel>) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|entry| min_level.map_or(true, |min| entry.level >= min))
            .cloned()
            .collect()
    }

    /// Get the number of buffered entries
    pub fn len(&self) -> usize {
        self.entries.occupied_len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get the capacity of the buffer
    pub fn capacity(&self) -> usize {
        self.entries.capacity().get()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(MAX_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::log::entry::{AppInfo, DeviceInfo};

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry::new(
            level,
            "Test",
            message,
            "session",
            DeviceInfo::unknown(),
            AppInfo::unknown(Environment::Development),
        )
    }

    fn messages(entries: &[LogEntry]) -> Vec<String> {
        entries.iter().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn test_push_snapshot() {
        let mut buffer = LogBuffer::new(8);
        buffer.push(entry(LogLevel::Info, "a"));
        buffer.push(entry(LogLevel::Warn, "b"));

        assert_eq!(buffer.len(), 2);
        assert_eq!(messages(&buffer.snapshot(None)), vec!["a", "b"]);
        assert_eq!(messages(&buffer.snapshot(Some(LogLevel::Warn))), vec!["b"]);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut buffer = LogBuffer::new(3);
        for i in 0..5 {
            let evicted = buffer.push(entry(LogLevel::Debug, &i.to_string()));
            if i >= 3 {
                assert_eq!(evicted.unwrap().message, (i - 3).to_string());
            } else {
                assert!(evicted.is_none());
            }
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(messages(&buffer.snapshot(None)), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut buffer = LogBuffer::new(4);
        buffer.push(entry(LogLevel::Info, "original"));

        let mut copy = buffer.snapshot(None);
        copy[0].message = "changed".to_string();
        copy.clear();

        assert_eq!(messages(&buffer.snapshot(None)), vec!["original"]);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let mut buffer = LogBuffer::new(4);
        let mut previous = buffer.next_timestamp();
        for _ in 0..1000 {
            let stamp = buffer.next_timestamp();
            assert!(stamp >= previous);
            previous = stamp;
        }

        buffer.clear();
        assert!(buffer.next_timestamp() >= previous);
    }

    #[test]
    fn test_clear() {
        let mut buffer = LogBuffer::default();
        assert_eq!(buffer.capacity(), MAX_BUFFER_SIZE);
        buffer.push(entry(LogLevel::Info, "x"));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
