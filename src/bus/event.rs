// src/bus/event.rs

//! Event identifiers and payloads.
//!
//! Event names form a closed, enumerated vocabulary rather than free-form
//! strings; `as_str` yields the canonical dot-style name used in logs.

use std::fmt;
use std::path::PathBuf;

use crate::config::Container;
use crate::discovery::module::{Asset, ModuleStats};

/// Canonical event identifiers understood by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The root configuration has been loaded and is ready for binding.
    ConfigLoad,
    /// A component's activation decision became final.
    ComponentReady,
    /// One discovered asset, delivered under the admission cap.
    AssetEmit,
    /// A module's walk finished; its stats are frozen.
    ModuleProcessed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoad => "config.load",
            Event::ComponentReady => "component.ready",
            Event::AssetEmit => "module.emit.asset",
            Event::ModuleProcessed => "module.processed",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments carried by an event occurrence.
///
/// Payloads are cloned per listener, so they stay cheap: containers share
/// nothing mutable and assets are a couple of paths.
#[derive(Debug, Clone)]
pub enum EventPayload {
    Empty,
    /// Fully-loaded root container plus the file it came from.
    ConfigLoaded { root: Container, path: PathBuf },
    /// A component resolved its activation decision.
    ComponentReady { name: String, active: bool },
    /// One qualifying file from a module walk.
    Asset(Asset),
    /// Terminal per-module event with the frozen counters.
    ModuleDone { module: String, stats: ModuleStats },
}
