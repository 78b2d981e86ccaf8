// src/discovery/walker.rs

//! The recursive module walk.
//!
//! Two independent predicates control traversal: a directory whose relative
//! path matches an ignore rule is pruned (nothing beneath it is visited),
//! and a file is emitted only when it matches a pattern rule and no ignore
//! rule. Every qualifying file is dispatched through the bus's blocking
//! mechanism; the per-event admission ceiling bounds how many dispatches are
//! mid-flight while the walk itself streams ahead.
//!
//! `process` resolves only once the walk is complete and every dispatched
//! asset has settled; the first rejected dispatch aborts the remainder of
//! the pass without rolling back prior dispatches.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::bus::{Event, EventBus, EventPayload};
use crate::errors::{ConveyorError, Result};

use super::module::{Asset, ModuleSpec, ModuleStats};

/// Validate that the module's configured root exists and is a directory.
/// This failure is fatal to the module and is not retried.
pub async fn check(spec: &ModuleSpec) -> Result<()> {
    match tokio::fs::metadata(spec.root()).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ConveyorError::ConfigError(format!(
            "module '{}': root {} is not a directory",
            spec.name(),
            spec.root().display()
        ))),
        Err(err) => Err(ConveyorError::ConfigError(format!(
            "module '{}': root {} is not accessible: {err}",
            spec.name(),
            spec.root().display()
        ))),
    }
}

/// Walk the module root and dispatch one `module.emit.asset` occurrence per
/// qualifying file. Returns the frozen counters for the pass.
pub async fn process(spec: &ModuleSpec, bus: Arc<EventBus>) -> Result<ModuleStats> {
    let mut stats = ModuleStats::default();
    let mut inflight: JoinSet<Result<()>> = JoinSet::new();
    let mut stack = vec![spec.root().to_path_buf()];

    let walk_result = 'walk: loop {
        let Some(dir) = stack.pop() else {
            break Ok(());
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) => break Err(ConveyorError::IoError(err)),
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => break 'walk Err(ConveyorError::IoError(err)),
            };

            let path = entry.path();
            let rel = rel_path(spec.root(), &path);

            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(err) => break 'walk Err(ConveyorError::IoError(err)),
            };

            if file_type.is_dir() {
                stats.dirs += 1;
                if spec.ignores().matches(&rel) {
                    stats.ignored += 1;
                    debug!(module = spec.name(), dir = %rel, "pruning ignored directory");
                } else {
                    stack.push(path);
                }
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            stats.total += 1;
            if spec.ignores().matches(&rel) {
                stats.ignored += 1;
                continue;
            }
            if !spec.patterns().matches(&rel) {
                continue;
            }

            stats.emitted += 1;
            let asset = Asset {
                file: rel,
                file_abs: path,
                module: spec.name().to_string(),
            };
            let bus = Arc::clone(&bus);
            inflight.spawn(async move {
                bus.emit_blocking(Event::AssetEmit, EventPayload::Asset(asset))
                    .await
            });

            // Surface dispatch failures early so the walk stops streaming.
            while let Some(done) = inflight.try_join_next() {
                if let Err(err) = flatten(done) {
                    break 'walk Err(err);
                }
            }
        }
    };

    if let Err(err) = walk_result {
        inflight.abort_all();
        while inflight.join_next().await.is_some() {}
        return Err(err);
    }

    // Walk complete; wait for every in-flight dispatch to settle.
    while let Some(done) = inflight.join_next().await {
        if let Err(err) = flatten(done) {
            inflight.abort_all();
            while inflight.join_next().await.is_some() {}
            return Err(err);
        }
    }

    debug!(
        module = spec.name(),
        total = stats.total,
        emitted = stats.emitted,
        ignored = stats.ignored,
        dirs = stats.dirs,
        "module walk finished"
    );

    Ok(stats)
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match joined {
        Ok(result) => result,
        Err(join_err) => Err(ConveyorError::Other(anyhow::Error::from(join_err))),
    }
}

/// Relative path of `path` under `root`, forward-slashed for rule matching.
fn rel_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
