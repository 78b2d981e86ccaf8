// src/component/dependency_gated.rs

//! Dependency gating: condition a component's activation on siblings.
//!
//! After its own config binding resolves, a gated component asks the gate to
//! resolve its declared dependencies. A dependency counts as unmet when it
//! is not registered at all, when its `ready()` resolves inactive, or when
//! its `ready()` errors (the error is logged, not propagated, so one broken
//! plugin deactivates dependents instead of crashing the run). If anything
//! is unmet the component deactivates itself and resolves `ready()` with
//! `None`, and the host skips its `run`.

use crate::bus::EventBus;
use crate::errors::Result;
use crate::logging::ComponentLogger;

#[derive(Debug, Default)]
pub struct DependencyGate {
    deps: Vec<String>,
}

impl DependencyGate {
    pub fn new(deps: Vec<String>) -> Self {
        Self { deps }
    }

    pub fn dependencies(&self) -> &[String] {
        &self.deps
    }

    /// Await every declared dependency and collect the names of those that
    /// resolved unmet. An empty result means the component may stay active.
    pub async fn resolve(&self, bus: &EventBus, logger: &ComponentLogger) -> Result<Vec<String>> {
        let mut unmet = Vec::new();

        for dep in &self.deps {
            let Some(sibling) = bus.component(dep) else {
                unmet.push(dep.clone());
                continue;
            };

            match sibling.ready().await {
                Ok(_) if sibling.is_active() => {}
                Ok(_) => unmet.push(dep.clone()),
                Err(err) => {
                    logger.warn(&format!("dependency '{dep}' failed to resolve: {err}"));
                    unmet.push(dep.clone());
                }
            }
        }

        if !unmet.is_empty() {
            logger.warn(&format!("unmet dependencies: {}", unmet.join(", ")));
        }

        Ok(unmet)
    }
}
