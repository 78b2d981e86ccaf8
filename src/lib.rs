// src/lib.rs

pub mod bus;
pub mod cli;
pub mod component;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod host;
pub mod logging;
pub mod plugins;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_from_path;
use crate::config::Container;
use crate::host::Host;
use crate::plugins::PluginRegistry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the plugin registry (components instantiated for present sections)
/// - the host lifecycle (subscribe, config binding, gating, run, teardown)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let root = load_from_path(&config_path)?;

    let registry = PluginRegistry::builtin();

    if args.dry_run {
        print_dry_run(&root, &config_path, &registry);
        return Ok(());
    }

    let host = Host::new();
    let mut registered = 0usize;
    for key in root.keys() {
        if let Some(component) = registry.create(&key) {
            debug!(component = %key, "instantiating plugin for config section");
            host.register(component)?;
            registered += 1;
        }
    }
    info!(registered, "components registered from config");

    host.run(root, config_path).await?;
    Ok(())
}

/// Simple dry-run output: print known plugins, present sections and the
/// module specs discovery would walk.
fn print_dry_run(root: &Container, config_path: &Path, registry: &PluginRegistry) {
    println!("conveyor dry-run");
    println!("  config: {}", config_path.display());
    println!();

    println!("known plugins:");
    for name in registry.names() {
        let present = root.has(name);
        println!("  - {name} (section present: {present})");
    }
    println!();

    if let Some(section) = root.get(discovery::DISCOVERY_COMPONENT) {
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let container = Container::from_value(section.clone());
        println!("modules:");
        for line in discovery::describe_modules(&container, base_dir) {
            println!("  - {line}");
        }
    }

    debug!("dry-run complete (no execution)");
}
