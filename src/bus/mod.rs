// src/bus/mod.rs

//! The event bus: the crate's coordination kernel.
//!
//! - [`event`] defines the enumerated event vocabulary and payloads.
//! - [`emitter`] implements the two dispatch primitives (priority-ordered
//!   blocking chains and plain fan-out) plus per-event admission control.
//! - [`registry`] holds the component registry and validates the declared
//!   dependency graph before the activation wait phase.
//!
//! [`EventBus`] is the facade every component is handed: dispatch and
//! sibling lookup through one handle.

pub mod emitter;
pub mod event;
pub mod registry;

use std::sync::Arc;

use crate::component::Component;
use crate::errors::Result;

pub use emitter::Emitter;
pub use event::{Event, EventPayload};
pub use registry::ComponentRegistry;

#[derive(Debug, Default)]
pub struct EventBus {
    emitter: Emitter,
    components: ComponentRegistry,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            emitter: Emitter::new(),
            components: ComponentRegistry::new(),
        }
    }

    // --- dispatch ---

    pub fn on<F>(&self, event: Event, callback: F)
    where
        F: Fn(EventPayload) + Send + Sync + 'static,
    {
        self.emitter.on(event, callback);
    }

    pub fn on_blocking<F, Fut>(&self, event: Event, priority: i32, callback: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.emitter.on_blocking(event, priority, callback);
    }

    pub fn once_blocking<F, Fut>(&self, event: Event, priority: i32, callback: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.emitter.once_blocking(event, priority, callback);
    }

    pub async fn emit_blocking(&self, event: Event, payload: EventPayload) -> Result<()> {
        self.emitter.emit_blocking(event, payload).await
    }

    pub fn emit_plain(&self, event: Event, payload: EventPayload) {
        self.emitter.emit_plain(event, payload);
    }

    pub fn set_max_parallel(&self, event: Event, limit: usize) {
        self.emitter.set_max_parallel(event, limit);
    }

    // --- component registry ---

    pub fn register_component(&self, component: Arc<dyn Component>) -> Result<()> {
        self.components.insert(component)
    }

    pub fn component(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.get(name)
    }

    pub fn components(&self) -> Vec<Arc<dyn Component>> {
        self.components.all()
    }

    pub fn validate_dependencies(&self) -> Result<()> {
        self.components.validate_acyclic()
    }
}
