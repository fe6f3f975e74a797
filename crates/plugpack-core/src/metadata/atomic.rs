//! Atomic file operations for manifest persistence.
//!
//! Writes go through a temp file with a PID suffix, are synced to disk and
//! then renamed over the target. Output has sorted keys and four-space
//! indentation so manifests diff cleanly.

use crate::config::ManifestConfig;
use crate::{PackageError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process;
use tracing::debug;

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|e| PackageError::ManifestIo {
        path: path.to_path_buf(),
        message: format!("Failed to read {}", path.display()),
        source: Some(e),
    })?;

    let data: T = serde_json::from_str(&contents).map_err(|e| PackageError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Serialize `data` as pretty JSON with sorted keys.
pub fn to_sorted_json<T: Serialize>(data: &T) -> Result<String> {
    // serde_json's default map is ordered, so going through Value sorts every
    // object, flattened fields included.
    let value = serde_json::to_value(data).map_err(|e| PackageError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(ManifestConfig::INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer).map_err(|e| PackageError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    String::from_utf8(buf).map_err(|e| PackageError::Other(e.to_string()))
}

/// Write data to a JSON file atomically.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let io_err = |message: String, e: std::io::Error| PackageError::ManifestIo {
        path: path.to_path_buf(),
        message,
        source: Some(e),
    };

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                io_err(format!("Failed to create directory {}", parent.display()), e)
            })?;
        }
    }

    let temp_path = path.with_extension(format!("json.{}.tmp", process::id()));
    let serialized = to_sorted_json(data)?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| {
                io_err(format!("Failed to create temp file {}", temp_path.display()), e)
            })?;

        file.write_all(serialized.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .map_err(|e| io_err(format!("Failed to write temp file {}", temp_path.display()), e))?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_err(
            format!("Failed to rename {} to {}", temp_path.display(), path.display()),
            e,
        ));
    }

    debug!("Atomically wrote {}", path.display());
    Ok(())
}
