//! Plugin registry seam.
//!
//! The host application knows which plugins are loaded and which ones it
//! cannot run without. The package manager only asks.

use std::collections::HashSet;

/// What the package manager needs to know about loaded plugins.
pub trait PluginRegistry: Send + Sync {
    /// Ids the application requires; these are hidden from listings.
    fn required_plugins(&self) -> HashSet<String>;

    /// Whether the plugin is currently loaded.
    fn is_active_plugin(&self, plugin_id: &str) -> bool;
}

/// Fixed registry for hosts without a live plugin system (and for tests).
#[derive(Debug, Clone, Default)]
pub struct StaticPluginRegistry {
    required: HashSet<String>,
    /// `None` means every plugin counts as active.
    active: Option<HashSet<String>>,
}

impl StaticPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Restrict the active set to `ids`.
    pub fn with_active<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active
            .get_or_insert_with(HashSet::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }
}

impl PluginRegistry for StaticPluginRegistry {
    fn required_plugins(&self) -> HashSet<String> {
        self.required.clone()
    }

    fn is_active_plugin(&self, plugin_id: &str) -> bool {
        self.active
            .as_ref()
            .map(|active| active.contains(plugin_id))
            .unwrap_or(true)
    }
}
