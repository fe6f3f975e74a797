//! Centralized configuration for plugpack.
//!
//! File names, directory names and manifest constants shared by the manager,
//! the manifest store and the CLI.

/// Manifest file configuration.
pub struct ManifestConfig;

impl ManifestConfig {
    /// Schema version written into the user manifest.
    pub const VERSION: u32 = 1;
    pub const USER_MANIFEST_FILENAME: &'static str = "packages.json";
    pub const BUNDLED_MANIFEST_FILENAME: &'static str = "bundled_packages.json";
    pub const LOCK_EXTENSION: &'static str = "lock";
    /// Indentation used when writing manifests.
    pub const INDENT: &'static [u8] = b"    ";
}

/// Directory and file naming inside the storage layout.
pub struct PathsConfig;

impl PathsConfig {
    pub const APP_DIR_NAME: &'static str = "plugpack";
    /// Subdirectory of the cache dir holding scheduled archives.
    pub const PACKAGE_CACHE_DIR_NAME: &'static str = "packages";
    pub const ARCHIVE_EXTENSION: &'static str = "curapackage";
    pub const PLUGINS_DIR_NAME: &'static str = "plugins";
    /// Top-level archive directory holding one tree per category.
    pub const ARCHIVE_FILES_DIR: &'static str = "files";
    pub const PACKAGE_INFO_ENTRY: &'static str = "package.json";
    pub const LICENSE_ENTRY: &'static str = "LICENSE";
    pub const SCRATCH_PREFIX: &'static str = "extract-";
}

/// Container files recognised inside installed packages.
pub struct ContainerConfig;

impl ContainerConfig {
    /// Longest suffixes first so `.xml.fdm_material` wins over shorter ones.
    pub const SUFFIXES: &'static [&'static str] = &[
        ".xml.fdm_material",
        ".inst.cfg",
        ".def.json",
        ".stack.cfg",
    ];
}
