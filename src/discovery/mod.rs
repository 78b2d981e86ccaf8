// src/discovery/mod.rs

//! Module & asset discovery.
//!
//! The discovery component rides the same contract as every other plugin:
//! it binds to the `modules` config section, optionally gates on sibling
//! components, then walks each configured module sequentially and delivers
//! qualifying files as `module.emit.asset` occurrences under the admission
//! cap (fully sequential delivery by default).

pub mod module;
pub mod rules;
pub mod walker;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;

use crate::bus::{Event, EventBus, EventPayload};
use crate::component::{Component, ComponentCore, ConfigBinding, DependencyGate};
use crate::config::Container;
use crate::errors::{ConveyorError, Result};
use crate::logging::ComponentLogger;

pub use module::{Asset, ModuleSpec, ModuleStats};

/// Component name and config section key.
pub const DISCOVERY_COMPONENT: &str = "modules";

/// Keys of the `modules` section that are settings, not module entries.
const RESERVED_KEYS: [&str; 3] = ["max_parallel", "__file", "__dir"];

/// Default asset-delivery ceiling: one in-flight dispatch at a time, so
/// consumers finish one file before the next is delivered.
const DEFAULT_MAX_PARALLEL: usize = 1;

pub struct Discovery {
    core: ComponentCore,
    binding: ConfigBinding,
    gate: DependencyGate,
    bus: OnceLock<Arc<EventBus>>,
    ready: tokio::sync::OnceCell<Option<Container>>,
    stats: Mutex<HashMap<String, ModuleStats>>,
}

impl Discovery {
    pub fn new() -> Arc<Self> {
        Self::with_dependencies(Vec::new())
    }

    /// Discovery gated on the given sibling components.
    pub fn with_dependencies(deps: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            core: ComponentCore::new(DISCOVERY_COMPONENT),
            binding: ConfigBinding::for_component(DISCOVERY_COMPONENT),
            gate: DependencyGate::new(deps),
            bus: OnceLock::new(),
            ready: tokio::sync::OnceCell::new(),
            stats: Mutex::new(HashMap::new()),
        })
    }

    /// Frozen counters per module, populated as each walk's terminal event
    /// fires. Empty until `run` has processed at least one module.
    pub fn stats(&self) -> HashMap<String, ModuleStats> {
        self.stats.lock().unwrap().clone()
    }

    /// Build module specs from the bound container, skipping setting keys.
    fn build_specs(&self, container: &Container) -> Result<Vec<ModuleSpec>> {
        let base_dir = container
            .get_str("__dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut specs = Vec::new();
        for name in container.keys() {
            if RESERVED_KEYS.contains(&name.as_str()) {
                continue;
            }
            let Some(value) = container.get(&name) else {
                continue;
            };
            let section = Container::from_value(value.clone());
            specs.push(ModuleSpec::from_container(&name, section, &base_dir)?);
        }

        if specs.is_empty() {
            return Err(ConveyorError::ConfigError(
                "modules section contains no module entries".to_string(),
            ));
        }
        Ok(specs)
    }

    fn logger(&self) -> ComponentLogger {
        self.core.logger()
    }
}

#[async_trait]
impl Component for Discovery {
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
                let unmet = self.gate.resolve(bus, &self.logger()).await?;
                if !unmet.is_empty() {
                    self.core.set_active(false);
                    return Ok(None);
                }

                Ok(Some(container))
            })
            .await?;
        Ok(resolved.clone())
    }

    async fn run(&self, bus: Arc<EventBus>) -> Result<()> {
        let Some(container) = self.ready().await? else {
            return Ok(());
        };

        // A ceiling of zero would admit no asset dispatch at all and the
        // first emission would wait forever, so reject it up front.
        let ceiling = match container.get_u64("max_parallel") {
            Some(0) => {
                return Err(ConveyorError::ConfigError(
                    "modules.max_parallel must be at least 1".to_string(),
                ));
            }
            Some(n) => n as usize,
            None => DEFAULT_MAX_PARALLEL,
        };
        bus.set_max_parallel(Event::AssetEmit, ceiling);

        let specs = self.build_specs(&container)?;
        let logger = self.logger();

        // Modules are strictly sequential: one module's walk fully settles
        // before the next begins. Asset delivery within a module is bounded
        // by the admission ceiling.
        for spec in &specs {
            walker::check(spec).await?;
            logger.info(&format!(
                "processing module '{}' at {}",
                spec.name(),
                spec.root().display()
            ));

            let stats = walker::process(spec, Arc::clone(&bus)).await?;

            bus.emit_blocking(
                Event::ModuleProcessed,
                EventPayload::ModuleDone {
                    module: spec.name().to_string(),
                    stats,
                },
            )
            .await?;

            self.stats
                .lock()
                .unwrap()
                .insert(spec.name().to_string(), stats);
            logger.info(&format!(
                "module '{}' done: {} emitted / {} files, {} ignored, {} dirs",
                spec.name(),
                stats.emitted,
                stats.total,
                stats.ignored,
                stats.dirs
            ));
        }

        Ok(())
    }

    async fn teardown(&self, _bus: Arc<EventBus>) -> Result<()> {
        self.logger().debug("discovery teardown");
        Ok(())
    }
}

/// Pretty-print module specs for `--dry-run`.
pub fn describe_modules(container: &Container, base_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for name in container.keys() {
        if RESERVED_KEYS.contains(&name.as_str()) {
            continue;
        }
        if let Some(value) = container.get(&name) {
            let section = Container::from_value(value.clone());
            match ModuleSpec::from_container(&name, section, base_dir) {
                Ok(spec) => lines.push(format!("{} -> {}", name, spec.root().display())),
                Err(err) => lines.push(format!("{name} -> invalid: {err}")),
            }
        }
    }
    lines
}
