//! Manifest persistence.
//!
//! This module provides:
//! - Atomic JSON file operations
//! - The user and bundled manifest schemas
//! - The cross-process manifest lock

mod atomic;
mod lock;
mod manifest;

pub use atomic::{atomic_read_json, atomic_write_json, to_sorted_json};
pub use lock::{ManifestLock, ManifestLockGuard};
pub use manifest::{
    load_bundled_manifests, BundledManifest, BundledPackage, InstalledPackage, ManifestStore,
    PendingInstall, UserManifest,
};
