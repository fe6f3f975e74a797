//! Package metadata, versions, archives and on-disk files.

mod archive;
mod files;
mod info;
mod version;

pub use archive::{read_package_info, read_package_license, PackageArchive};
pub use files::{container_id_for, package_container_ids, package_files};
pub use info::{InstalledPackageInfo, PackageInfo};
pub use version::PackageVersion;
