//! Read-only queries over the bundled, installed and pending sets.

use super::PackageManager;
use crate::package::{self, InstalledPackageInfo, PackageInfo};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

impl PackageManager {
    pub fn get_bundled_package_info(&self, package_id: &str) -> Option<&PackageInfo> {
        self.bundled.get(package_id)
    }

    /// Resolved view of one package.
    ///
    /// Pending removal hides the package. Otherwise a pending install (not
    /// yet installed) wins over the installed copy, which wins over the
    /// bundled one.
    pub fn get_installed_package_info(&self, package_id: &str) -> Option<InstalledPackageInfo> {
        if self.state.to_remove.contains(package_id) {
            return None;
        }

        let (info, is_installed) = if let Some(pending) = self.state.to_install.get(package_id) {
            (pending.package_info.clone(), false)
        } else if let Some(installed) = self.state.installed.get(package_id) {
            (installed.package_info.clone(), true)
        } else if let Some(bundled) = self.bundled.get(package_id) {
            (bundled.clone(), true)
        } else {
            return None;
        };

        let is_bundled = self.bundled.contains_key(&info.package_id)
            && !self.is_user_installed_package(&info.package_id);
        Some(InstalledPackageInfo {
            is_active: self.registry.is_active_plugin(package_id),
            is_bundled,
            is_installed,
            info,
        })
    }

    /// Bundled and installed ids minus pending removals, plus pending
    /// installs (an update in progress still counts as present).
    pub fn get_all_installed_package_ids(&self) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = self
            .bundled
            .keys()
            .chain(self.state.installed.keys())
            .filter(|id| !self.state.to_remove.contains(*id))
            .cloned()
            .collect();
        ids.extend(self.state.to_install.keys().cloned());
        ids
    }

    /// Installed packages grouped by package type, without required plugins.
    pub fn get_all_installed_packages_info(&self) -> BTreeMap<String, Vec<InstalledPackageInfo>> {
        let required = self.registry.required_plugins();
        let mut grouped: BTreeMap<String, Vec<InstalledPackageInfo>> = BTreeMap::new();

        for package_id in self.get_all_installed_package_ids() {
            if required.contains(&package_id) {
                continue;
            }
            if let Some(info) = self.get_installed_package_info(&package_id) {
                grouped
                    .entry(info.package_type().to_string())
                    .or_default()
                    .push(info);
            }
        }
        grouped
    }

    pub fn to_remove_package_ids(&self) -> &BTreeSet<String> {
        &self.state.to_remove
    }

    pub fn to_install_package_ids(&self) -> BTreeSet<String> {
        self.state.to_install.keys().cloned().collect()
    }

    pub fn is_package_installed(&self, package_id: &str) -> bool {
        self.get_installed_package_info(package_id).is_some()
    }

    pub fn is_user_installed_package(&self, package_id: &str) -> bool {
        self.state.installed.contains_key(package_id)
    }

    pub fn read_package_info(&self, archive: &Path) -> Result<PackageInfo> {
        package::read_package_info(archive)
    }

    pub fn read_package_license(&self, archive: &Path) -> Result<Option<String>> {
        package::read_package_license(archive)
    }

    /// Directories (and their file names) owned by the package on disk.
    pub fn package_files(&self, package_id: &str) -> Vec<(PathBuf, Vec<String>)> {
        package::package_files(self.layout.data_dir(), package_id)
    }

    pub fn package_container_ids(&self, package_id: &str) -> Vec<String> {
        package::package_container_ids(self.layout.data_dir(), package_id)
    }
}
