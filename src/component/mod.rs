// src/component/mod.rs

//! The component capability contract and its layered helpers.
//!
//! Every plugin implements [`Component`] directly; there is no inheritance
//! hierarchy. The two orthogonal activation concerns are packaged as plain
//! structs a component embeds:
//!
//! - [`config_bound::ConfigBinding`] resolves the component's config subtree
//!   from the `config.load` event and backs `ready()`.
//! - [`dependency_gated::DependencyGate`] awaits sibling components'
//!   `ready()` and reports unmet dependencies so the component can
//!   deactivate itself instead of failing the run.

pub mod config_bound;
pub mod dependency_gated;

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::bus::EventBus;
use crate::config::Container;
use crate::errors::Result;
use crate::logging::ComponentLogger;

pub use config_bound::ConfigBinding;
pub use dependency_gated::DependencyGate;

/// Minimal capability set every plugin implements.
///
/// The host drives registered components through:
/// `subscribe` -> `config.load` emission -> `ready` -> `run` (active only)
/// -> `teardown` (always).
#[async_trait]
pub trait Component: Send + Sync {
    /// Unique name within a run; also the default config section key.
    fn name(&self) -> &str;

    /// Names of sibling components this one's activation depends on.
    fn dependencies(&self) -> &[String] {
        &[]
    }

    fn is_active(&self) -> bool;

    fn set_active(&self, active: bool);

    fn set_logger(&self, logger: ComponentLogger);

    /// Register listeners on the bus. Must not block on I/O.
    async fn subscribe(self: Arc<Self>, bus: Arc<EventBus>) -> Result<()>;

    /// Resolves once this component's activation decision is final.
    ///
    /// `Some(container)` means active with the given bound configuration;
    /// `None` means the component stays inactive and is skipped during the
    /// run phase. Must be safe to await from multiple callers (the host and
    /// any dependents).
    async fn ready(&self) -> Result<Option<Container>>;

    /// Perform the component's actual work. Only invoked for components
    /// that are active after `ready()`.
    async fn run(&self, bus: Arc<EventBus>) -> Result<()>;

    /// Optional cleanup, invoked by the host regardless of active state.
    async fn teardown(&self, _bus: Arc<EventBus>) -> Result<()> {
        Ok(())
    }
}

/// Identity, activity flag and logger binding shared by concrete components.
#[derive(Debug)]
pub struct ComponentCore {
    name: String,
    active: AtomicBool,
    logger: RwLock<ComponentLogger>,
}

impl ComponentCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: AtomicBool::new(false),
            logger: RwLock::new(ComponentLogger::unbound()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn set_logger(&self, logger: ComponentLogger) {
        *self.logger.write().unwrap() = logger;
    }

    pub fn logger(&self) -> ComponentLogger {
        self.logger.read().unwrap().clone()
    }
}
