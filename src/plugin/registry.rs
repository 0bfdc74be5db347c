use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use super::builtin;
use super::{FunctionPlugin, Plugin, PluginFn};
use crate::error::HarnessError;

/// Builds a fresh plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Maps a plugin name to an executable plugin instance.
pub trait PluginResolver {
    /// Return a new instance for `plugin_name`, or `HarnessError::PluginNotFound`.
    fn resolve(&self, plugin_name: &str) -> Result<Box<dyn Plugin>, HarnessError>;
}

/// In-process plugin registry keyed by plugin name.
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the example plugins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            warn!(plugin = %name, "Plugin registered twice, replacing previous factory");
        }
        debug!(plugin = %name, "Registered plugin");
        self.factories.insert(name, Box::new(factory));
    }

    /// Register a plain function as a plugin.
    pub fn register_fn(&mut self, name: impl Into<String>, function: PluginFn) {
        let name = name.into();
        let plugin_name = name.clone();
        self.register(name, move || {
            Box::new(FunctionPlugin::new(plugin_name.clone(), function.clone()))
        });
    }

    /// Registered plugin names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl PluginResolver for PluginRegistry {
    fn resolve(&self, plugin_name: &str) -> Result<Box<dyn Plugin>, HarnessError> {
        self.factories
            .get(plugin_name)
            .map(|factory| factory())
            .ok_or_else(|| HarnessError::PluginNotFound(plugin_name.to_string()))
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
