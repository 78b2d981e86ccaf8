// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::container::Container;
use crate::errors::{ConveyorError, Result};

/// Load a YAML configuration file into a root [`Container`].
///
/// This only performs deserialization; it does **not** decide which
/// components the sections belong to. That happens when the host emits
/// `config.load` and each component binds its own subtree.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Container> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
    if !value.is_mapping() {
        return Err(ConveyorError::ConfigError(format!(
            "config file {} must contain a top-level mapping",
            path.display()
        )));
    }

    Ok(Container::from_value(value))
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `Conveyor.yml` in the current working
/// directory, but this function exists so you can later:
///
/// - Respect an env var (e.g. `CONVEYOR_CONFIG`).
/// - Look for multiple default locations.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Conveyor.yml")
}
