//! Shared fixtures for integration tests.

#![allow(dead_code)]

use plugpack_core::{PackageManager, StaticPluginRegistry, StorageLayout};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Test environment with data, cache, config and bundled resource dirs.
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        for dir in ["data", "cache", "config", "resources", "downloads"] {
            fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        Self { root }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn downloads(&self) -> PathBuf {
        self.root.path().join("downloads")
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(self.data_dir(), self.root.path().join("cache"))
            .with_config_dir(self.root.path().join("config"))
            .with_bundled_search_path(self.root.path().join("resources"))
    }

    pub fn manager(&self) -> PackageManager {
        self.manager_with(StaticPluginRegistry::new())
    }

    pub fn manager_with(&self, registry: StaticPluginRegistry) -> PackageManager {
        PackageManager::new(self.layout(), Arc::new(registry))
    }

    /// Simulate an application start with a custom layout.
    pub fn started_with_layout(&self, layout: StorageLayout) -> PackageManager {
        let mut manager = PackageManager::new(layout, Arc::new(StaticPluginRegistry::new()));
        manager.initialize().expect("initialize");
        manager
    }

    /// Simulate an application start.
    pub fn started(&self) -> PackageManager {
        let mut manager = self.manager();
        manager.initialize().expect("initialize");
        manager
    }

    pub fn write_bundled(&self, packages: &[(&str, &str, &str)]) {
        let entries: Vec<String> = packages
            .iter()
            .map(|(id, version, kind)| {
                format!(
                    r#""{id}": {{"package_info": {{"package_id": "{id}", "package_version": "{version}", "package_type": "{kind}"}}}}"#
                )
            })
            .collect();
        fs::write(
            self.root.path().join("resources/bundled_packages.json"),
            format!("{{{}}}", entries.join(",")),
        )
        .unwrap();
    }

    /// Build `<downloads>/<id>-<version>.curapackage` containing the given
    /// files below `files/plugins/`.
    pub fn package(&self, id: &str, version: &str, plugin_files: &[(&str, &str)]) -> PathBuf {
        let path = self.downloads().join(format!("{id}-{version}.curapackage"));
        build_package(&path, id, version, "plugin", plugin_files);
        path
    }

    /// Like [`package`](Self::package) with entries given relative to
    /// `files/`, so several categories can be shipped.
    pub fn package_with(&self, id: &str, version: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = self.downloads().join(format!("{id}-{version}.curapackage"));
        build_archive(&path, id, version, "plugin", files);
        path
    }

    /// Replace an installed package directory with a plain file so that
    /// deleting it as a directory fails.
    pub fn block_package_dir(&self, category: &str, id: &str) {
        let dir = self.data_dir().join(category).join(id);
        fs::remove_dir_all(&dir).unwrap();
        fs::write(&dir, "not a directory").unwrap();
    }
}

pub fn build_package(
    path: &Path,
    id: &str,
    version: &str,
    package_type: &str,
    plugin_files: &[(&str, &str)],
) {
    let named: Vec<(String, &str)> = plugin_files
        .iter()
        .map(|(name, body)| (format!("plugins/{name}"), *body))
        .collect();
    let files: Vec<(&str, &str)> = named.iter().map(|(n, b)| (n.as_str(), *b)).collect();
    build_archive(path, id, version, package_type, &files);
}

/// Build a package archive; `files` are placed below `files/`.
pub fn build_archive(
    path: &Path,
    id: &str,
    version: &str,
    package_type: &str,
    files: &[(&str, &str)],
) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    zip.start_file("package.json", options).unwrap();
    write!(
        zip,
        r#"{{"package_id": "{id}", "package_version": "{version}", "package_type": "{package_type}", "display_name": "{id} display"}}"#
    )
    .unwrap();

    zip.start_file("LICENSE", options).unwrap();
    zip.write_all(b"Test license").unwrap();

    for (name, body) in files {
        zip.start_file(format!("files/{name}"), options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}
