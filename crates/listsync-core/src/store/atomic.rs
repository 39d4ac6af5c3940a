//! JSON file helpers shared by every persisted store.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Serialize `value` and write it with a write-to-temp-then-rename so a crash
/// mid-write never leaves a truncated file behind.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StorageError::Serialize(format!("{}: {}", path.display(), e)))?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = std::path::PathBuf::from(temp_name);

    std::fs::write(&temp_path, &bytes).map_err(|e| io_error(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| io_error(path, e))?;
    Ok(())
}

/// `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Missing files are not an error.
pub fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path, e)),
    }
}
