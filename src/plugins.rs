// src/plugins.rs

//! Explicit plugin registry: name -> factory, resolved at startup.
//!
//! Components are created by string name when their section appears in the
//! root config, keeping the late-bound "create by name" ergonomic without
//! any dynamic loading.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::component::Component;
use crate::discovery::{Discovery, DISCOVERY_COMPONENT};

pub type ComponentFactory = fn() -> Arc<dyn Component>;

fn discovery_factory() -> Arc<dyn Component> {
    Discovery::new()
}

#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in components.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(DISCOVERY_COMPONENT, discovery_factory);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ComponentFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate the component registered under `name`, if any.
    pub fn create(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&String> = self.factories.keys().collect();
        f.debug_struct("PluginRegistry")
            .field("factories", &names)
            .finish()
    }
}
