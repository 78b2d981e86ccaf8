#![allow(dead_code)]

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;

use conveyor::bus::EventBus;
use conveyor::component::{Component, ComponentCore, ConfigBinding, DependencyGate};
use conveyor::config::Container;
use conveyor::errors::{ConveyorError, Result};
use conveyor::logging::ComponentLogger;

/// A config-bound, dependency-gated component that:
/// - records lifecycle calls (`subscribe`, `run`, `teardown`) in order
/// - optionally fails its `run` to exercise error propagation.
///
/// The shared `calls` log lets tests assert cross-component ordering.
pub struct FakeComponent {
    core: ComponentCore,
    binding: ConfigBinding,
    gate: DependencyGate,
    bus: OnceLock<Arc<EventBus>>,
    ready: tokio::sync::OnceCell<Option<Container>>,
    calls: Arc<Mutex<Vec<String>>>,
    fail_run: bool,
}

impl FakeComponent {
    pub fn new(name: &str, calls: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Self::build(name, Vec::new(), calls, false)
    }

    pub fn with_dependencies(
        name: &str,
        deps: Vec<String>,
        calls: Arc<Mutex<Vec<String>>>,
    ) -> Arc<Self> {
        Self::build(name, deps, calls, false)
    }

    pub fn failing(name: &str, calls: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Self::build(name, Vec::new(), calls, true)
    }

    fn build(
        name: &str,
        deps: Vec<String>,
        calls: Arc<Mutex<Vec<String>>>,
        fail_run: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: ComponentCore::new(name),
            binding: ConfigBinding::for_component(name),
            gate: DependencyGate::new(deps),
            bus: OnceLock::new(),
            ready: tokio::sync::OnceCell::new(),
            calls,
            fail_run,
        })
    }

    fn record(&self, call: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{call}", self.core.name()));
    }
}

#[async_trait]
impl Component for FakeComponent {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn dependencies(&self) -> &[String] {
        self.gate.dependencies()
    }

    fn is_active(&self) -> bool {
        self.core.is_active()
    }

    fn set_active(&self, active: bool) {
        self.core.set_active(active);
    }

    fn set_logger(&self, logger: ComponentLogger) {
        self.core.set_logger(logger);
    }

    async fn subscribe(self: Arc<Self>, bus: Arc<EventBus>) -> Result<()> {
        self.record("subscribe");
        self.binding.register(&bus);
        let _ = self.bus.set(bus);
        Ok(())
    }

    async fn ready(&self) -> Result<Option<Container>> {
        let resolved = self
            .ready
            .get_or_try_init(|| async {
                let Some(container) = self.binding.wait().await? else {
                    return Ok::<_, ConveyorError>(None);
                };
                self.core.set_active(true);

                let bus = self.bus.get().ok_or_else(|| {
                    ConveyorError::ConfigError(
                        "ready() called before subscribe()".to_string(),
                    )
                })?;
                let unmet = self.gate.resolve(bus, &self.core.logger()).await?;
                if !unmet.is_empty() {
                    self.core.set_active(false);
                    return Ok(None);
                }

                Ok(Some(container))
            })
            .await?;
        Ok(resolved.clone())
    }

    async fn run(&self, _bus: Arc<EventBus>) -> Result<()> {
        self.record("run");
        if self.fail_run {
            return Err(ConveyorError::Other(anyhow::anyhow!(
                "fake component '{}' was told to fail",
                self.core.name()
            )));
        }
        Ok(())
    }

    async fn teardown(&self, _bus: Arc<EventBus>) -> Result<()> {
        self.record("teardown");
        Ok(())
    }
}
