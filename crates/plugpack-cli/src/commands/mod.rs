//! Command handlers.

mod apply;
mod packages;

use crate::Command;
use anyhow::Result;
use plugpack_core::{PackageManager, StaticPluginRegistry, StorageLayout};
use std::sync::Arc;

pub fn dispatch(command: Command, layout: StorageLayout, required: Vec<String>) -> Result<()> {
    let registry = StaticPluginRegistry::new().with_required(required);
    let manager = PackageManager::new(layout, Arc::new(registry));

    match command {
        Command::Apply => apply::run(manager),
        Command::Install { source } => packages::install(manager, &source),
        Command::Remove { package_id, force } => packages::remove(manager, &package_id, force),
        Command::List { json } => packages::list(manager, json),
        Command::Info { package_id } => packages::info(manager, &package_id),
        Command::Inspect { archive } => packages::inspect(&archive),
        Command::Files { package_id } => packages::files(manager, &package_id),
    }
}
