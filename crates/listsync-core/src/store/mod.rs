pub mod atomic;
pub mod browser_cache;
pub mod file_backend;
pub mod list_state;

pub use browser_cache::BrowserSnapshot;
pub use file_backend::{FileBackend, FileSnapshot};
pub use list_state::{ListState, ListStateStore, MergeTelemetry, MigrationState};
