use anyhow::{bail, Result};
use plugpack_core::PackageManager;

/// Run the startup sequence and print what happened.
pub fn run(mut manager: PackageManager) -> Result<()> {
    let report = manager.initialize()?;

    for id in &report.removed {
        println!("removed    {}", id);
    }
    for id in &report.installed {
        println!("installed  {}", id);
    }
    for id in &report.failed_removals {
        println!("pending    {} (removal failed, retried next start)", id);
    }
    for (id, reason) in &report.failed_installs {
        println!("abandoned  {}: {}", id, reason);
    }
    for notice in &report.notices {
        eprintln!("{}: {}", notice.title, notice.text);
    }

    manager.shutdown()?;

    if !report.is_clean() {
        bail!("some packages could not be applied");
    }
    Ok(())
}
