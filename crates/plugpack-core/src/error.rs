//! Error types for plugpack.
//!
//! Every fallible operation in the library returns [`PackageError`]. The
//! deferred-apply phases catch these per package and turn them into log lines
//! and notices; scheduling calls hand them back to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the package manager.
#[derive(Debug, Error)]
pub enum PackageError {
    // Archive errors
    #[error("Package archive for {package_id} is missing: {path}")]
    MissingArchive { package_id: String, path: PathBuf },

    #[error("Invalid package archive {path}: {message}")]
    InvalidArchive { path: PathBuf, message: String },

    #[error("Failed to extract {path}: {message}")]
    ArchiveExtraction { path: PathBuf, message: String },

    // File system errors
    #[error("Failed to move {src} to {dest}: {message}")]
    FilesystemMove {
        src: PathBuf,
        dest: PathBuf,
        message: String,
    },

    #[error("Failed to purge {path} for package {package_id}: {message}")]
    Purge {
        package_id: String,
        path: PathBuf,
        message: String,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Manifest errors
    #[error("Manifest load failed: {message}")]
    ManifestLoad { message: String },

    #[error("Manifest IO failed for {path}: {message}")]
    ManifestIo {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid package info field {field}: {message}")]
    InvalidPackageInfo { field: String, message: String },

    #[error("Invalid package version: {version}")]
    InvalidVersion { version: String },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Locking
    #[error("Failed to lock {path}: {message}")]
    Lock { path: PathBuf, message: String },

    // Lifecycle
    #[error("Package manager is already initialized")]
    AlreadyInitialized,

    #[error("Invalid package URL: {0}")]
    InvalidUrl(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, PackageError>;

impl From<std::io::Error> for PackageError {
    fn from(err: std::io::Error) -> Self {
        PackageError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PackageError {
    fn from(err: serde_json::Error) -> Self {
        PackageError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<zip::result::ZipError> for PackageError {
    fn from(err: zip::result::ZipError) -> Self {
        PackageError::Other(format!("zip error: {}", err))
    }
}

impl PackageError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PackageError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Process exit code for the command-line front end.
    ///
    /// - 2: bad input (archive, package info, version, URL)
    /// - 3: manifest or lock problems
    /// - 4: filesystem failures while applying
    /// - 1: everything else
    pub fn to_exit_code(&self) -> i32 {
        match self {
            PackageError::InvalidArchive { .. }
            | PackageError::InvalidPackageInfo { .. }
            | PackageError::InvalidVersion { .. }
            | PackageError::InvalidUrl(_) => 2,

            PackageError::ManifestLoad { .. }
            | PackageError::ManifestIo { .. }
            | PackageError::Json { .. }
            | PackageError::Lock { .. } => 3,

            PackageError::MissingArchive { .. }
            | PackageError::ArchiveExtraction { .. }
            | PackageError::FilesystemMove { .. }
            | PackageError::Purge { .. } => 4,

            _ => 1,
        }
    }
}
