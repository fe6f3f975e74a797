//! Session commands: they load state without applying it.

use anyhow::{bail, Context, Result};
use plugpack_core::{
    InstallOutcome, InstalledPackageInfo, PackageArchive, PackageManager, RemoveOutcome,
};
use std::path::Path;

/// Load state without applying it; pending work is left for `apply`.
fn session(mut manager: PackageManager) -> Result<PackageManager> {
    manager.attach()?;
    Ok(manager)
}

pub fn install(manager: PackageManager, source: &str) -> Result<()> {
    let mut manager = session(manager)?;
    let outcome = if source.starts_with("file://") {
        manager.install_package_from_url(source)?
    } else {
        manager.install_package(Path::new(source))?
    };

    match outcome {
        InstallOutcome::Scheduled {
            package_id,
            version,
        } => println!("{} {} will be installed on the next apply", package_id, version),
        InstallOutcome::AlreadyInstalled {
            package_id,
            installed_version,
        } => println!(
            "{} {} is already installed; nothing to do",
            package_id, installed_version
        ),
    }
    Ok(())
}

pub fn remove(manager: PackageManager, package_id: &str, force: bool) -> Result<()> {
    let mut manager = session(manager)?;
    match manager.remove_package(package_id, force)? {
        RemoveOutcome::NotInstalled => bail!("{} is not installed", package_id),
        RemoveOutcome::BundledRejected => bail!("{} is bundled and cannot be removed", package_id),
        RemoveOutcome::RemovalScheduled => {
            println!("{} will be removed on the next apply", package_id)
        }
        RemoveOutcome::InstallCancelled => println!("pending install of {} cancelled", package_id),
    }
    Ok(())
}

fn status(info: &InstalledPackageInfo) -> &'static str {
    match (info.is_installed, info.is_bundled) {
        (false, _) => "pending",
        (true, true) => "bundled",
        (true, false) => "installed",
    }
}

pub fn list(manager: PackageManager, json: bool) -> Result<()> {
    let manager = session(manager)?;
    let grouped = manager.get_all_installed_packages_info();

    if json {
        println!("{}", serde_json::to_string_pretty(&grouped)?);
        return Ok(());
    }

    for (package_type, packages) in &grouped {
        println!("{}:", package_type);
        for info in packages {
            println!(
                "  {:<32} {:<12} {}",
                info.package_id(),
                info.info.package_version,
                status(info)
            );
        }
    }
    let removing = manager.to_remove_package_ids();
    if !removing.is_empty() {
        println!("scheduled for removal:");
        for id in removing {
            println!("  {}", id);
        }
    }
    Ok(())
}

pub fn info(manager: PackageManager, package_id: &str) -> Result<()> {
    let manager = session(manager)?;
    let info = manager
        .get_installed_package_info(package_id)
        .with_context(|| format!("{} is not installed", package_id))?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

pub fn inspect(archive: &Path) -> Result<()> {
    let mut archive = PackageArchive::open(archive)?;
    let info = archive.package_info()?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    if let Some(license) = archive.license()? {
        println!("\n{}", license);
    }
    Ok(())
}

pub fn files(manager: PackageManager, package_id: &str) -> Result<()> {
    let manager = session(manager)?;
    for (dir, names) in manager.package_files(package_id) {
        println!("{}", dir.display());
        for name in names {
            println!("  {}", name);
        }
    }
    Ok(())
}
