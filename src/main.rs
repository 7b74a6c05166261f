use anyhow::Result;
use readerlog::{payload, ErrorInfo, EventLog, LogConfig, LogLevel};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readerlog=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let log = EventLog::new(LogConfig::from_env()?)?;
    info!("Event log ready, session {}", log.session_id());

    // Walk through the reader app's screens the way the UI would
    log.set_user_id("demo-reader");
    log.info("Screen", "Library loaded", payload(json!({ "books": 3 })));
    log.log_user_action("tap", "Library", payload(json!({ "bookId": "alice" })));
    log.log_navigation("Library", "Player", payload(json!({ "bookId": "alice" })));

    let speaking = log.start_timer("speak chapter 1");
    log.info("Audio", "Speech started", payload(json!({ "rate": 1.0, "pitch": 1.0 })));
    speaking.complete();

    log.log_navigation("Player", "AliceReader", None);
    log.log_user_action("highlight", "AliceReader", payload(json!({ "paragraph": 4 })));
    log.log_user_action("tag quote", "AliceReader", payload(json!({ "tag": "favorite" })));

    let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "microphone access denied");
    log.error(
        "Recording",
        "Failed to start voice annotation",
        payload(json!({ "paragraph": 4 })),
        Some(ErrorInfo::from_error(&err)),
    );
    log.log_api_call("GET", "/library", Some(200), Some(84), None);

    let problems = log.get_logs(Some(LogLevel::Warn)).len();
    info!(
        "{} entries buffered ({} at WARN or above)",
        log.len(),
        problems
    );
    println!("{}", log.export_logs());

    Ok(())
}
