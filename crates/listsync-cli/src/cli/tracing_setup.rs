use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// Stderr output is filtered by `LISTSYNC_LOG` (default `warn`). Setting
/// `LISTSYNC_LOG_FILE` adds a debug-level file layer and routes the engine's
/// tagged log to a sibling file.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LISTSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file_logging = std::env::var("LISTSYNC_LOG_FILE").ok().filter(|p| !p.is_empty());
    let Some(log_path) = file_logging else {
        registry.init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);
            registry.with(file_layer).init();
            listsync_core::logging::set_log_path(format!("{}.tagged", log_path).into());
        }
        Err(e) => {
            registry.init();
            tracing::warn!("Could not open log file {}: {}", log_path, e);
        }
    }
}
