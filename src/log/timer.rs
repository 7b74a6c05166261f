use super::entry::payload;
use super::logger::EventLog;
use serde_json::json;
use std::time::Instant;

/// Completion handle returned by [`EventLog::start_timer`]
///
/// Each call to [`complete`](Self::complete) logs the time elapsed since the
/// timer was started; calling it again measures from the same start.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    log: EventLog,
    name: String,
    start: Instant,
}

impl TimerHandle {
    pub(crate) fn started_at(log: EventLog, name: String, start: Instant) -> Self {
        Self { log, name, start }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn complete(&self) {
        let duration = self.elapsed_ms();
        self.log.info(
            "Performance",
            &format!("Timer completed: {}", self.name),
            payload(json!({ "duration": duration })),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;
    use crate::log::level::LogLevel;
    use std::time::Duration;

    fn recorded_duration(log: &EventLog) -> u64 {
        let entries = log.get_logs(Some(LogLevel::Info));
        let last = entries.last().unwrap();
        assert_eq!(last.category, "Performance");
        last.data.as_ref().unwrap()["duration"].as_u64().unwrap()
    }

    #[test]
    fn test_known_delay() {
        let log = EventLog::new(LogConfig::development()).unwrap();
        let start = Instant::now()
            .checked_sub(Duration::from_millis(250))
            .unwrap();
        let timer = TimerHandle::started_at(log.clone(), "chapter load".to_string(), start);

        timer.complete();

        let duration = recorded_duration(&log);
        assert!((250..300).contains(&duration), "duration was {duration}");
        let last = log.get_logs(None).pop().unwrap();
        assert_eq!(last.message, "Timer completed: chapter load");
    }

    #[test]
    fn test_second_completion_measures_from_start() {
        let log = EventLog::new(LogConfig::development()).unwrap();
        let start = Instant::now()
            .checked_sub(Duration::from_millis(100))
            .unwrap();
        let timer = TimerHandle::started_at(log.clone(), "tts".to_string(), start);

        timer.complete();
        let first = recorded_duration(&log);
        std::thread::sleep(Duration::from_millis(30));
        timer.complete();
        let second = recorded_duration(&log);

        assert!(first >= 100);
        assert!(second >= first + 30);
    }
}
