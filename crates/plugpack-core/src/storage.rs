//! Storage layout: where packages, caches and manifests live.

use crate::config::{ManifestConfig, PathsConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Category-specific storage roots used by the package manager.
///
/// # Example
///
/// ```rust,ignore
/// let layout = StorageLayout::new("/home/me/.local/share/app", "/home/me/.cache/app")
///     .with_config_dir("/home/me/.config/app")
///     .with_bundled_search_path("/usr/share/app/resources");
/// ```
#[derive(Debug, Clone)]
pub struct StorageLayout {
    data_dir: PathBuf,
    cache_dir: PathBuf,
    config_dir: PathBuf,
    bundled_search_paths: Vec<PathBuf>,
    install_roots: BTreeMap<String, PathBuf>,
}

impl StorageLayout {
    /// Layout with `plugins` installed under `data_dir/plugins` and config
    /// stored alongside data.
    pub fn new(data_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let mut install_roots = BTreeMap::new();
        install_roots.insert(
            PathsConfig::PLUGINS_DIR_NAME.to_string(),
            data_dir.join(PathsConfig::PLUGINS_DIR_NAME),
        );
        Self {
            config_dir: data_dir.clone(),
            data_dir,
            cache_dir: cache_dir.into(),
            bundled_search_paths: Vec::new(),
            install_roots,
        }
    }

    pub fn with_config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = config_dir.into();
        self
    }

    pub fn with_bundled_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundled_search_paths.push(path.into());
        self
    }

    /// Install `files/<category>` from archives into `root/<package_id>`.
    pub fn with_install_root(mut self, category: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.install_roots.insert(category.into(), root.into());
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn bundled_search_paths(&self) -> &[PathBuf] {
        &self.bundled_search_paths
    }

    pub fn install_roots(&self) -> &BTreeMap<String, PathBuf> {
        &self.install_roots
    }

    /// Where scheduled archives are cached.
    pub fn package_cache_dir(&self) -> PathBuf {
        self.cache_dir.join(PathsConfig::PACKAGE_CACHE_DIR_NAME)
    }

    pub fn cached_archive_path(&self, package_id: &str) -> PathBuf {
        self.package_cache_dir()
            .join(format!("{}.{}", package_id, PathsConfig::ARCHIVE_EXTENSION))
    }

    /// Existing bundled manifests, in search-path order.
    pub fn bundled_manifest_paths(&self) -> Vec<PathBuf> {
        self.bundled_search_paths
            .iter()
            .map(|p| p.join(ManifestConfig::BUNDLED_MANIFEST_FILENAME))
            .filter(|p| p.is_file())
            .collect()
    }

    /// User manifest location.
    ///
    /// The data dir is checked first and the config dir second; the last
    /// existing file wins. With neither present, the data dir is used.
    pub fn user_manifest_path(&self) -> PathBuf {
        let mut found = None;
        for dir in [&self.data_dir, &self.config_dir] {
            let candidate = dir.join(ManifestConfig::USER_MANIFEST_FILENAME);
            if candidate.is_file() {
                found = Some(candidate);
            }
        }
        found.unwrap_or_else(|| self.data_dir.join(ManifestConfig::USER_MANIFEST_FILENAME))
    }
}
