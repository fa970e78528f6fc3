use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

pub fn tracing_log_path() -> PathBuf {
    env::var("NOSSAT_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("nossat_trace.jsonl"))
}

/// Install the global subscriber once. Stdout is reserved for the JSON event
/// stream, so human-readable logs go to stderr and JSON logs to a file.
pub fn init_tracing(config: &AppConfig) {
    if config.no_logs {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
        if config.log_json {
            let path = tracing_log_path();
            let file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => file,
                Err(_) => return,
            };
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(Mutex::new(file))
                .with_current_span(false)
                .with_span_list(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        } else {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(io::stderr)
                .with_target(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    });
}
