// src/bus/registry.rs

//! Component registry and dependency-graph validation.
//!
//! Components are registered by name (unique within a run) so that
//! dependency-gated components can look up siblings and await their
//! activation. Before the wait phase starts, the declared dependency graph
//! is checked for cycles: two components awaiting each other's `ready()`
//! would deadlock, so we fail fast instead.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::component::Component;
use crate::errors::{ConveyorError, Result};

#[derive(Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under its name.
    pub fn insert(&self, component: Arc<dyn Component>) -> Result<()> {
        let name = component.name().to_string();
        let mut components = self.components.write().unwrap();
        if components.contains_key(&name) {
            return Err(ConveyorError::DuplicateComponent(name));
        }
        components.insert(name, component);
        Ok(())
    }

    /// Look up a component by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.read().unwrap().get(name).cloned()
    }

    /// All registered components, sorted by name for deterministic
    /// iteration order.
    pub fn all(&self) -> Vec<Arc<dyn Component>> {
        let components = self.components.read().unwrap();
        let mut all: Vec<_> = components.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Validate that the declared dependency graph is acyclic.
    ///
    /// Edge direction: dependency -> dependent. Dependencies on unregistered
    /// names are not edges at all; the gate later treats them as inactive.
    pub fn validate_acyclic(&self) -> Result<()> {
        let components = self.components.read().unwrap();

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in components.keys() {
            graph.add_node(name.as_str());
        }
        for (name, component) in components.iter() {
            for dep in component.dependencies() {
                if components.contains_key(dep) {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let node = cycle.node_id();
                Err(ConveyorError::DependencyCycle(format!(
                    "component '{node}' participates in a dependency cycle"
                )))
            }
        }
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let components = self.components.read().unwrap();
        let names: Vec<&String> = components.keys().collect();
        f.debug_struct("ComponentRegistry")
            .field("components", &names)
            .finish()
    }
}
