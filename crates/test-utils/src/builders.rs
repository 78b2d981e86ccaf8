#![allow(dead_code)]

use std::path::PathBuf;

use conveyor::config::Container;

/// Parse inline YAML into a root [`Container`] for tests.
///
/// Panics on malformed YAML; tests own their fixtures.
pub fn container_from_yaml(yaml: &str) -> Container {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).expect("test fixture must be valid YAML");
    Container::from_value(value)
}

/// Conventional fake config-file path handed to `Host::run` in tests.
pub fn fixture_config_path() -> PathBuf {
    PathBuf::from("/tmp/conveyor-test/Conveyor.yml")
}
