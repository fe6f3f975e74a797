//! Startup apply phase: pending removals, then pending installs.

use super::{PackageManager, StartupReport};
use crate::config::PathsConfig;
use crate::events::Notice;
use crate::metadata::{InstalledPackage, PendingInstall};
use crate::package::PackageArchive;
use crate::{PackageError, Result};
use chrono::Utc;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

impl PackageManager {
    pub(super) fn remove_all_scheduled_packages(&mut self, report: &mut StartupReport) {
        let scheduled: Vec<String> = self.state.to_remove.iter().cloned().collect();
        let mut failures = BTreeSet::new();

        for package_id in scheduled {
            match self.purge_package(&package_id) {
                Ok(()) => {
                    self.state.installed.remove(&package_id);
                    info!("Removed package [{}]", package_id);
                    report.removed.push(package_id);
                }
                Err(e) => {
                    warn!("Failed to remove package [{}]: {}", package_id, e);
                    report.failed_removals.push(package_id.clone());
                    failures.insert(package_id);
                }
            }
        }

        if !failures.is_empty() {
            let listing = failures
                .iter()
                .map(|id| format!("- {}", id))
                .collect::<Vec<_>>()
                .join("\n");
            let notice = Notice::error(
                "Uninstalling errors",
                format!(
                    "There were some errors uninstalling the following packages:\n{}",
                    listing
                ),
            );
            self.notify(notice, report);
        }

        self.state.to_remove = failures;
        self.persist_logged();
    }

    pub(super) fn install_all_scheduled_packages(&mut self, report: &mut StartupReport) {
        // One save per package so a crash leaves processed packages consistent.
        while let Some((package_id, pending)) = self.state.to_install.pop_first() {
            match self.install_scheduled_package(&package_id, &pending, report) {
                Ok(()) => {
                    self.state.installed.insert(
                        package_id.clone(),
                        InstalledPackage {
                            package_info: pending.package_info,
                            filename: Some(pending.filename),
                            installed_at: Some(Utc::now().to_rfc3339()),
                        },
                    );
                    report.installed.push(package_id);
                }
                Err(e) => {
                    warn!("Abandoned install of package [{}]: {}", package_id, e);
                    report.failed_installs.insert(package_id, e.to_string());
                }
            }
            self.persist_logged();
        }
    }

    fn install_scheduled_package(
        &mut self,
        package_id: &str,
        pending: &PendingInstall,
        report: &mut StartupReport,
    ) -> Result<()> {
        let archive_path = &pending.filename;
        info!(
            "Installing package [{}] from file [{}]",
            package_id,
            archive_path.display()
        );

        if !archive_path.is_file() {
            warn!(
                "Package [{}] file '{}' is missing, cannot install this package",
                package_id,
                archive_path.display()
            );
            return Err(PackageError::MissingArchive {
                package_id: package_id.to_string(),
                path: archive_path.clone(),
            });
        }

        let scratch = self.scratch_dir(archive_path)?;
        PackageArchive::open(archive_path)
            .and_then(|mut archive| archive.extract_to(scratch.path()))
            .map_err(|e| {
                error!("Failed to install package from file [{}]: {}", archive_path.display(), e);
                match e {
                    PackageError::ArchiveExtraction { .. } => e,
                    other => PackageError::ArchiveExtraction {
                        path: archive_path.clone(),
                        message: other.to_string(),
                    },
                }
            })?;

        // Remove the old version first, then install.
        if let Err(e) = self.purge_package(package_id) {
            let notice = Notice::error(
                "Updating error",
                format!(
                    "There was an error uninstalling the package {} before installing new version:\n{}.\nPlease try to upgrade again later.",
                    package_id, e
                ),
            );
            self.notify(notice, report);
            return Err(e);
        }
        // The old files are gone; keep the record in step with the disk.
        if self.state.installed.remove(package_id).is_some() {
            debug!("Purged previous install of package [{}]", package_id);
        }

        let files_dir = scratch.path().join(PathsConfig::ARCHIVE_FILES_DIR);
        let mut placed = Vec::new();
        for (category, root) in self.layout.install_roots() {
            let src = files_dir.join(category);
            if !src.is_dir() {
                continue;
            }
            let dst = root.join(package_id);
            info!(
                "Moving package {} from {} to {}",
                package_id,
                src.display(),
                dst.display()
            );
            if let Err(e) = move_dir(&src, &dst) {
                placed.push(dst);
                discard_partial_install(package_id, &placed);
                return Err(e);
            }
            placed.push(dst);
        }

        if let Err(e) = fs::remove_file(archive_path) {
            warn!("Tried to delete file [{}], but it failed: {}", archive_path.display(), e);
        }

        Ok(())
    }

    fn scratch_dir(&self, archive_path: &Path) -> Result<tempfile::TempDir> {
        let base = self.layout.cache_dir();
        fs::create_dir_all(base)
            .and_then(|_| {
                tempfile::Builder::new()
                    .prefix(PathsConfig::SCRATCH_PREFIX)
                    .tempdir_in(base)
            })
            .map_err(|e| PackageError::ArchiveExtraction {
                path: archive_path.to_path_buf(),
                message: format!("Failed to create scratch directory in {}: {}", base.display(), e),
            })
    }

    /// Delete every on-disk directory owned by `package_id`.
    ///
    /// Looks for `<data_dir>/<category>/<package_id>` and
    /// `<install root>/<package_id>`.
    pub(super) fn purge_package(&self, package_id: &str) -> Result<()> {
        let purge_err = |path: &Path, e: std::io::Error| PackageError::Purge {
            package_id: package_id.to_string(),
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut candidates = Vec::new();
        let data_dir = self.layout.data_dir();
        if data_dir.is_dir() {
            let entries = fs::read_dir(data_dir).map_err(|e| purge_err(data_dir, e))?;
            for entry in entries.filter_map(|e| e.ok()) {
                let dir = entry.path();
                if dir.is_dir() {
                    candidates.push(dir.join(package_id));
                }
            }
        }
        for root in self.layout.install_roots().values() {
            let dir = root.join(package_id);
            if !candidates.contains(&dir) {
                candidates.push(dir);
            }
        }

        for package_dir in candidates {
            if !package_dir.exists() {
                continue;
            }
            info!("Removing '{}' for package [{}]", package_dir.display(), package_id);
            fs::remove_dir_all(&package_dir).map_err(|e| purge_err(&package_dir, e))?;
        }
        Ok(())
    }
}

/// Remove the directories a failed install already put in place.
fn discard_partial_install(package_id: &str, placed: &[PathBuf]) {
    for dir in placed {
        if !dir.exists() {
            continue;
        }
        match fs::remove_dir_all(dir) {
            Ok(()) => info!("Removed partial install '{}' of package [{}]", dir.display(), package_id),
            Err(e) => warn!(
                "Failed to remove partial install '{}' of package [{}]: {}",
                dir.display(),
                package_id,
                e
            ),
        }
    }
}

/// Move a directory, falling back to copy + delete across filesystems.
fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    let move_err = |message: String| PackageError::FilesystemMove {
        src: src.to_path_buf(),
        dest: dst.to_path_buf(),
        message,
    };

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| move_err(format!("Failed to create {}: {}", parent.display(), e)))?;
    }
    if dst.exists() {
        fs::remove_dir_all(dst).map_err(|e| move_err(format!("Failed to clear destination: {}", e)))?;
    }

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("Rename failed, falling back to copy: {}", e);
            copy_dir_recursive(src, dst).map_err(move_err)?;
            if let Err(rm_err) = fs::remove_dir_all(src) {
                warn!("Failed to remove source after copy: {}", rm_err);
            }
            Ok(())
        }
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::result::Result<(), String> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| e.to_string())?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| format!("Failed to create {}: {}", target.display(), e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| format!("Failed to copy {}: {}", entry.path().display(), e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_dir_replaces_destination() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("out").join("pkg");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub/new.txt"), "new").unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("old.txt"), "old").unwrap();

        move_dir(&src, &dst).unwrap();

        assert!(!src.exists());
        assert!(dst.join("sub/new.txt").is_file());
        assert!(!dst.join("old.txt").exists());
    }

    #[test]
    fn test_copy_dir_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/c.txt"), "c").unwrap();

        copy_dir_recursive(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("a/b/c.txt")).unwrap(), "c");
    }
}
