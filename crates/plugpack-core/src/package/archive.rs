//! Zip package archives.
//!
//! An archive holds a `package.json` describing the package, an optional
//! `LICENSE`, and a `files/<category>/...` tree per installable category.

use super::info::PackageInfo;
use crate::config::PathsConfig;
use crate::{PackageError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Read-only view of a package archive on disk.
pub struct PackageArchive {
    path: PathBuf,
    archive: zip::ZipArchive<File>,
}

impl PackageArchive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| PackageError::io_with_path(e, &path))?;
        let archive = zip::ZipArchive::new(file).map_err(|e| PackageError::InvalidArchive {
            path: path.clone(),
            message: format!("Invalid zip archive: {}", e),
        })?;
        Ok(Self { path, archive })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the first entry ending in `package.json` that holds valid
    /// package info. Unreadable candidates are logged and skipped.
    pub fn package_info(&mut self) -> Result<PackageInfo> {
        for i in 0..self.archive.len() {
            let name = match self.archive.by_index(i) {
                Ok(entry) => entry.name().to_string(),
                Err(e) => {
                    debug!("Skipping unreadable zip entry {}: {}", i, e);
                    continue;
                }
            };
            if !name.ends_with(PathsConfig::PACKAGE_INFO_ENTRY) {
                continue;
            }

            debug!("Found potential package.json file '{}'", name);
            match self.read_entry(i).and_then(|bytes| PackageInfo::from_slice(&bytes)) {
                Ok(info) => return Ok(info),
                Err(e) => error!("Failed to load potential package.json file '{}': {}", name, e),
            }
        }

        Err(PackageError::InvalidArchive {
            path: self.path.clone(),
            message: "no valid package.json entry".to_string(),
        })
    }

    /// Text of the first entry ending in `LICENSE`, if any.
    pub fn license(&mut self) -> Result<Option<String>> {
        for i in 0..self.archive.len() {
            let name = match self.archive.by_index(i) {
                Ok(entry) => entry.name().to_string(),
                Err(_) => continue,
            };
            if !name.ends_with(PathsConfig::LICENSE_ENTRY) {
                continue;
            }

            debug!("Found potential license file '{}'", name);
            let bytes = self.read_entry(i)?;
            match String::from_utf8(bytes) {
                Ok(text) => return Ok(Some(text)),
                Err(e) => {
                    error!("Failed to load potential license file '{}' as text: {}", name, e);
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_index(index)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| PackageError::io_with_path(e, &self.path))?;
        Ok(bytes)
    }

    /// Extract every entry below `extract_dir`.
    ///
    /// Entries whose names escape the target directory are skipped.
    pub fn extract_to(&mut self, extract_dir: &Path) -> Result<()> {
        let archive_path = self.path.clone();
        let extraction_err = |message: String| PackageError::ArchiveExtraction {
            path: archive_path.clone(),
            message,
        };

        std::fs::create_dir_all(extract_dir)
            .map_err(|e| extraction_err(format!("Failed to create {}: {}", extract_dir.display(), e)))?;

        for i in 0..self.archive.len() {
            let mut file = self
                .archive
                .by_index(i)
                .map_err(|e| extraction_err(format!("Failed to read zip entry {}: {}", i, e)))?;

            let outpath = match file.enclosed_name() {
                Some(path) => extract_dir.join(path),
                None => continue,
            };

            if file.is_dir() {
                std::fs::create_dir_all(&outpath).map_err(|e| {
                    extraction_err(format!("Failed to create directory {}: {}", outpath.display(), e))
                })?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    extraction_err(format!("Failed to create directory {}: {}", parent.display(), e))
                })?;
            }

            let mut outfile = File::create(&outpath).map_err(|e| {
                extraction_err(format!("Failed to create file {}: {}", outpath.display(), e))
            })?;
            std::io::copy(&mut file, &mut outfile).map_err(|e| {
                extraction_err(format!("Failed to extract file {}: {}", outpath.display(), e))
            })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = file.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
                }
            }
        }

        Ok(())
    }
}

/// Read the package info of the archive at `path`.
pub fn read_package_info(path: &Path) -> Result<PackageInfo> {
    PackageArchive::open(path)?.package_info()
}

/// Read the license text of the archive at `path`.
pub fn read_package_license(path: &Path) -> Result<Option<String>> {
    PackageArchive::open(path)?.license()
}
