// src/discovery/module.rs

//! Module specifications, walk counters and the asset payload.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::Container;
use crate::errors::{ConveyorError, Result};

use super::rules::RuleSet;

/// Serde model for one module section under the discovery component's
/// config, e.g.:
///
/// ```yaml
/// modules:
///   app:
///     root: src
///     patterns: [".rs", "/\\.toml$/"]
///     ignore: ["target"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawModuleSpec {
    pub root: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// One configured source subtree to walk.
#[derive(Debug)]
pub struct ModuleSpec {
    name: String,
    root: PathBuf,
    patterns: RuleSet,
    ignores: RuleSet,
    container: Container,
}

impl ModuleSpec {
    /// Build a spec from one entry of the module section. A relative `root`
    /// is resolved against `base_dir` (the config file's directory).
    pub fn from_container(name: &str, container: Container, base_dir: &Path) -> Result<Self> {
        let raw: RawModuleSpec = serde_yaml::from_value(container.as_value().clone())
            .map_err(|e| {
                ConveyorError::ConfigError(format!("invalid module section '{name}': {e}"))
            })?;

        let root = PathBuf::from(&raw.root);
        let root = if root.is_absolute() {
            root
        } else {
            base_dir.join(root)
        };

        Ok(Self {
            name: name.to_string(),
            root,
            patterns: RuleSet::parse(&raw.patterns)?,
            ignores: RuleSet::parse(&raw.ignore)?,
            container,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patterns(&self) -> &RuleSet {
        &self.patterns
    }

    pub fn ignores(&self) -> &RuleSet {
        &self.ignores
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

/// Monotonic walk counters, reset at the start of a walk and frozen once
/// the module's terminal event fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleStats {
    /// Files examined.
    pub total: u64,
    /// Assets dispatched.
    pub emitted: u64,
    /// Entries (files or pruned directories) skipped by ignore rules.
    pub ignored: u64,
    /// Directories examined.
    pub dirs: u64,
}

/// Transient payload for one qualifying file, constructed per occurrence
/// and discarded after all blocking consumers have processed it.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Path relative to the module root, forward-slashed.
    pub file: String,
    /// Absolute path on disk.
    pub file_abs: PathBuf,
    /// Owning module name.
    pub module: String,
}
