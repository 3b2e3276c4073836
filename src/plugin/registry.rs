//! Name-keyed registries for pluggable behaviour.
//!
//! Registries are filled once at startup and then handed, by reference, to
//! the code that assembles the gateway. Nothing here is process-global.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::health::HealthCheckFn;
use crate::plugin::builtin;
use crate::plugin::{MultiBackendAdapter, Plugin};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} '{name}' is already registered")]
    Duplicate { kind: &'static str, name: String },
}

/// A map from registered name to an item of one kind.
pub struct Registry<T> {
    kind: &'static str,
    items: HashMap<String, T>,
}

impl<T: Clone> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    /// Register an item. Names are unique per registry.
    pub fn register(&mut self, name: impl Into<String>, item: T) -> Result<(), RegistryError> {
        let name = name.into();
        if self.items.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                kind: self.kind,
                name,
            });
        }
        tracing::debug!(kind = self.kind, name = %name, "Registered");
        self.items.insert(name, item);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<T> {
        self.items.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.items.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T: Clone> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            items: self.items.clone(),
        }
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.items.keys().collect();
        names.sort_unstable();
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &names)
            .finish()
    }
}

pub type PluginRegistry = Registry<Arc<dyn Plugin>>;
pub type AdapterRegistry = Registry<Arc<dyn MultiBackendAdapter>>;
/// Custom health checks keyed by server name.
pub type HealthCheckRegistry = Registry<HealthCheckFn>;

/// Every registry the gateway consults while it is being assembled.
#[derive(Debug)]
pub struct Registries {
    pub plugins: PluginRegistry,
    pub adapters: AdapterRegistry,
    pub health_checks: HealthCheckRegistry,
}

impl Registries {
    /// Empty registries.
    pub fn new() -> Self {
        Self {
            plugins: Registry::new("plugin"),
            adapters: Registry::new("multi-backend adapter"),
            health_checks: Registry::new("health check"),
        }
    }

    /// Registries pre-populated with the built-in plugins and adapters.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registries = Self::new();
        builtin::register_all(&mut registries)?;
        Ok(registries)
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
