//! Package lifecycle manager.
//!
//! Installs and removes packages in two phases. During a session,
//! [`PackageManager::install_package`] and [`PackageManager::remove_package`]
//! only record intent in the manifest (plus a cached archive copy). The files
//! of a running application are touched only by
//! [`PackageManager::initialize`], which applies pending removals and then
//! pending installs at the next start.
//!
//! The manager is driven through `&mut self` from a single thread. The
//! manifest file itself is shared between processes and guarded by
//! [`ManifestLock`](crate::metadata::ManifestLock).

mod apply;
mod query;
mod schedule;

use crate::events::{EventBus, Notice, PackageEvent};
use crate::metadata::{load_bundled_manifests, ManifestStore, UserManifest};
use crate::package::PackageInfo;
use crate::registry::PluginRegistry;
use crate::storage::StorageLayout;
use crate::{PackageError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub use schedule::{InstallOutcome, RemoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Stopped,
}

/// What the startup apply phase did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StartupReport {
    pub removed: Vec<String>,
    /// Still pending; retried at the next start.
    pub failed_removals: Vec<String>,
    pub installed: Vec<String>,
    /// Abandoned installs with the reason.
    pub failed_installs: BTreeMap<String, String>,
    pub notices: Vec<Notice>,
}

impl StartupReport {
    pub fn is_clean(&self) -> bool {
        self.failed_removals.is_empty() && self.failed_installs.is_empty()
    }
}

/// Tracks bundled, installed and pending packages.
pub struct PackageManager {
    layout: StorageLayout,
    registry: Arc<dyn PluginRegistry>,
    store: ManifestStore,
    bundled_manifest_paths: Vec<PathBuf>,
    bundled: BTreeMap<String, PackageInfo>,
    state: UserManifest,
    events: EventBus,
    lifecycle: Lifecycle,
}

impl PackageManager {
    /// Create a manager for `layout`.
    ///
    /// Manifest locations are resolved here; nothing is read until
    /// [`initialize`](Self::initialize).
    pub fn new(layout: StorageLayout, registry: Arc<dyn PluginRegistry>) -> Self {
        let bundled_manifest_paths = layout.bundled_manifest_paths();
        for path in &bundled_manifest_paths {
            info!("Found bundled packages location: {}", path.display());
        }
        let store = ManifestStore::new(layout.user_manifest_path());

        Self {
            layout,
            registry,
            store,
            bundled_manifest_paths,
            bundled: BTreeMap::new(),
            state: UserManifest::default(),
            events: EventBus::new(),
            lifecycle: Lifecycle::Created,
        }
    }

    /// Load manifests and apply everything scheduled by the previous session.
    ///
    /// Steps run in order: bundled manifests, user manifest, pending
    /// removals, pending installs. Filesystem failures while applying are
    /// reported in the returned [`StartupReport`], not as errors. An
    /// unreadable user manifest is an error.
    pub fn initialize(&mut self) -> Result<StartupReport> {
        if self.lifecycle != Lifecycle::Created {
            return Err(PackageError::AlreadyInitialized);
        }

        self.load_management_data()?;

        let mut report = StartupReport::default();
        self.remove_all_scheduled_packages(&mut report);
        self.install_all_scheduled_packages(&mut report);

        self.lifecycle = Lifecycle::Running;
        self.events.publish(PackageEvent::InstalledPackagesChanged);

        info!(
            "Package startup complete: {} removed, {} installed, {} failed",
            report.removed.len(),
            report.installed.len(),
            report.failed_removals.len() + report.failed_installs.len()
        );
        Ok(report)
    }

    /// Load manifests without applying pending work.
    ///
    /// For tools that schedule or inspect while the application that owns the
    /// files is not being started. Pending removals and installs stay pending.
    pub fn attach(&mut self) -> Result<()> {
        if self.lifecycle != Lifecycle::Created {
            return Err(PackageError::AlreadyInitialized);
        }
        self.load_management_data()?;
        self.lifecycle = Lifecycle::Running;
        debug!(
            "Attached to {}: {} pending removals, {} pending installs",
            self.store.path().display(),
            self.state.to_remove.len(),
            self.state.to_install.len()
        );
        Ok(())
    }

    /// Persist the manifest one last time.
    pub fn shutdown(&mut self) -> Result<()> {
        self.persist()?;
        self.lifecycle = Lifecycle::Stopped;
        info!("Package manager shut down");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    /// Receive [`PackageEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<PackageEvent> {
        self.events.subscribe()
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn manifest_path(&self) -> &std::path::Path {
        self.store.path()
    }

    /// In-memory view of the persisted state.
    pub fn manifest(&self) -> &UserManifest {
        &self.state
    }

    fn load_management_data(&mut self) -> Result<()> {
        match load_bundled_manifests(&self.bundled_manifest_paths) {
            Ok(bundled) => self.bundled = bundled,
            Err(e) => {
                warn!("{}", e);
                self.bundled = BTreeMap::new();
            }
        }

        if let Some(manifest) = self.store.load()? {
            self.state = manifest;
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.state)
    }

    /// Persist during startup, where failures must not abort.
    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            error!("Failed to save package management file: {}", e);
        }
    }

    fn notify(&self, notice: Notice, report: &mut StartupReport) {
        self.events.publish(PackageEvent::Notice(notice.clone()));
        report.notices.push(notice);
    }
}
