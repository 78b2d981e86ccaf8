// src/host.rs

//! The host process driving registered components through the lifecycle.
//!
//! Phases, in order:
//!
//! 1. `subscribe` every component (listener registration only, no I/O).
//! 2. Validate the declared dependency graph is acyclic; a cycle would
//!    deadlock the mutual `ready()` waits, so fail fast instead.
//! 3. Emit `config.load` with the root container; config-bound components
//!    resolve their sections through their one-shot listeners.
//! 4. Await every `ready()`; as each activation decision lands, a
//!    `component.ready` plain event is raised.
//! 5. `run` every active component concurrently. The aggregate wait fails
//!    on the first rejection; there is no continue-on-error across
//!    components.
//! 6. `teardown` every component regardless of active state, and regardless
//!    of which phase failed, if any.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::bus::{Event, EventBus, EventPayload};
use crate::component::Component;
use crate::config::Container;
use crate::errors::Result;
use crate::logging::ComponentLogger;

#[derive(Debug, Default)]
pub struct Host {
    bus: Arc<EventBus>,
}

impl Host {
    pub fn new() -> Self {
        Self {
            bus: Arc::new(EventBus::new()),
        }
    }

    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Register a component and hand it its logger.
    pub fn register(&self, component: Arc<dyn Component>) -> Result<()> {
        component.set_logger(ComponentLogger::new(component.name()));
        self.bus.register_component(component)
    }

    /// Drive the full lifecycle with an already-loaded root container.
    pub async fn run(&self, root: Container, config_path: PathBuf) -> Result<()> {
        let components = self.bus.components();
        info!(count = components.len(), "host starting lifecycle");

        let run_result = self.drive(&components, root, config_path).await;

        // Teardown happens whichever phase the lifecycle failed in, if any.
        for component in &components {
            if let Err(err) = component.teardown(self.bus()).await {
                tracing::warn!(
                    component = component.name(),
                    error = %err,
                    "teardown failed"
                );
            }
        }

        run_result
    }

    async fn drive(
        &self,
        components: &[Arc<dyn Component>],
        root: Container,
        config_path: PathBuf,
    ) -> Result<()> {
        for component in components {
            debug!(component = component.name(), "subscribing");
            Arc::clone(component).subscribe(self.bus()).await?;
        }

        self.bus.validate_dependencies()?;

        self.bus
            .emit_blocking(
                Event::ConfigLoad,
                EventPayload::ConfigLoaded {
                    root,
                    path: config_path,
                },
            )
            .await?;

        let bus = self.bus();
        try_join_all(components.iter().map(|component| {
            let bus = Arc::clone(&bus);
            async move {
                let resolved = component.ready().await?;
                let active = component.is_active();
                debug!(component = component.name(), active, "activation resolved");
                bus.emit_plain(
                    Event::ComponentReady,
                    EventPayload::ComponentReady {
                        name: component.name().to_string(),
                        active,
                    },
                );
                Ok::<_, crate::errors::ConveyorError>(resolved)
            }
        }))
        .await?;

        let active: Vec<_> = components
            .iter()
            .filter(|c| c.is_active())
            .cloned()
            .collect();
        info!(
            active = active.len(),
            total = components.len(),
            "running active components"
        );

        try_join_all(
            active
                .iter()
                .map(|component| component.run(self.bus())),
        )
        .await
        .map(|_| ())
    }

    /// Convenience: load the config file then drive the lifecycle.
    pub async fn run_from_path(&self, config_path: &Path) -> Result<()> {
        let root = crate::config::loader::load_from_path(config_path)?;
        self.run(root, config_path.to_path_buf()).await
    }
}
