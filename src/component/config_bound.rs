// src/component/config_bound.rs

//! Config binding: the asynchronous link between a component and its
//! configuration subtree.
//!
//! On `subscribe`, the component registers a one-shot blocking listener for
//! `config.load`. When the host emits that event with the fully-loaded root
//! container and the originating file path, the binding resolves:
//!
//! - section present: the subtree becomes the component's own [`Container`],
//!   augmented with `__file`/`__dir` metadata derived from the config path;
//! - section absent: the binding resolves unbound and the component stays
//!   inactive.
//!
//! This is the component's only config entry point; nothing else may poke
//! configuration into a component after construction.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;

use crate::bus::{Event, EventBus, EventPayload};
use crate::config::Container;
use crate::errors::Result;

#[derive(Debug, Clone)]
enum Binding {
    Pending,
    Bound(Container),
    Unbound,
}

/// Watch-channel backed binding state. Embed one per component.
#[derive(Debug)]
pub struct ConfigBinding {
    /// Config path of this component's section, `$.<name>` by convention.
    path: String,
    tx: Arc<watch::Sender<Binding>>,
    rx: watch::Receiver<Binding>,
}

impl ConfigBinding {
    /// Binding for the conventional section `$.<component-name>`.
    pub fn for_component(name: &str) -> Self {
        Self::with_path(format!("$.{name}"))
    }

    /// Binding for an explicit config path (`$` addresses the whole root).
    pub fn with_path(path: impl Into<String>) -> Self {
        let (tx, rx) = watch::channel(Binding::Pending);
        Self {
            path: path.into(),
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Register the one-shot `config.load` listener on the bus.
    pub fn register(&self, bus: &EventBus) {
        let tx = Arc::clone(&self.tx);
        let path = self.path.clone();
        bus.once_blocking(Event::ConfigLoad, 0, move |payload| {
            let tx = Arc::clone(&tx);
            let path = path.clone();
            async move {
                if let EventPayload::ConfigLoaded { root, path: file } = payload {
                    let _ = tx.send(resolve_section(&root, &path, &file));
                }
                Ok(())
            }
        });
    }

    /// Await the binding decision. `Some(container)` iff the section was
    /// present in the root config. Safe to await repeatedly.
    pub async fn wait(&self) -> Result<Option<Container>> {
        let mut rx = self.rx.clone();
        let resolved = rx
            .wait_for(|b| !matches!(b, Binding::Pending))
            .await
            .map_err(anyhow::Error::from)?;
        match &*resolved {
            Binding::Bound(container) => Ok(Some(container.clone())),
            Binding::Unbound => Ok(None),
            Binding::Pending => unreachable!("wait_for guarantees a resolved state"),
        }
    }
}

/// Resolve a `$`-rooted config path against the root container.
fn resolve_section(root: &Container, path: &str, file: &Path) -> Binding {
    let value = if path == "$" {
        Some(root.as_value().clone())
    } else {
        let key = path.strip_prefix("$.").unwrap_or(path);
        root.get(key).cloned()
    };

    match value {
        Some(value) => {
            let mut container = Container::from_value(value);
            container.set("__file", file.to_string_lossy().as_ref());
            let dir = file.parent().unwrap_or_else(|| Path::new("."));
            container.set("__dir", dir.to_string_lossy().as_ref());
            Binding::Bound(container)
        }
        None => Binding::Unbound,
    }
}
