//! Tagged file logger.
//!
//! Operational traces (`SYNC`, `PUBLISH`, `CRYPTO`, ...) go to a plain append-only
//! file so they survive when no tracing subscriber is installed.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Set the log file path. Must be called before any logging occurs.
pub fn set_log_path(path: PathBuf) {
    let _ = LOG_PATH.set(path);
}

fn get_log_path() -> PathBuf {
    LOG_PATH
        .get()
        .cloned()
        .unwrap_or_else(|| std::env::temp_dir().join("listsync.log"))
}

pub fn elapsed_ms() -> u64 {
    START_TIME.get_or_init(Instant::now).elapsed().as_millis() as u64
}

pub fn log_to_file(tag: &str, msg: &str) {
    let lock = LOG_LOCK.get_or_init(|| Mutex::new(()));
    if let Ok(_guard) = lock.lock() {
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(get_log_path())
        {
            let _ = writeln!(file, "[{:>8}ms] [{}] {}", elapsed_ms(), tag, msg);
        }
    }
}

#[macro_export]
macro_rules! tlog {
    ($tag:expr, $($arg:tt)*) => {
        $crate::logging::log_to_file($tag, &format!($($arg)*))
    };
}

/// Shorten a hex id or pubkey for log lines.
pub fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_handles_short_ids() {
        assert_eq!(short("abc"), "abc");
        assert_eq!(short("0123456789abcdef"), "01234567");
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let a = elapsed_ms();
        let b = elapsed_ms();
        assert!(b >= a);
    }
}
