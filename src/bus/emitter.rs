// src/bus/emitter.rs

//! Listener registry and the two dispatch primitives.
//!
//! Blocking listeners for one event form a priority-ordered chain: each
//! listener's future is awaited before the next is invoked, and the first
//! rejection aborts the remainder of the chain with no compensation. Once
//! the chain succeeds, the same occurrence is fanned out to the plain
//! (unordered, fire-and-forget) listeners, so all blocking work for an
//! occurrence completes strictly before any plain listener observes it.
//!
//! Admission control is a per-event semaphore bounding how many occurrences
//! of the same event may be mid-dispatch at once. Tokio's semaphore queues
//! waiters FIFO, which gives the required queueing behaviour for free.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::trace;

use crate::errors::Result;

use super::event::{Event, EventPayload};

type BlockingFn = Arc<dyn Fn(EventPayload) -> BoxFuture<'static, Result<()>> + Send + Sync>;
type PlainFn = Arc<dyn Fn(EventPayload) + Send + Sync>;

struct BlockingListener {
    /// Monotonic registration id; tiebreaker that makes equal-priority
    /// ordering stable regardless of sort-algorithm guarantees.
    id: u64,
    priority: i32,
    once: bool,
    callback: BlockingFn,
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    /// Kept sorted by (priority desc, id asc) at insertion time.
    blocking: HashMap<Event, Vec<BlockingListener>>,
    plain: HashMap<Event, Vec<PlainFn>>,
}

impl ListenerRegistry {
    fn insert_blocking(&mut self, event: Event, priority: i32, once: bool, callback: BlockingFn) {
        let id = self.next_id;
        self.next_id += 1;

        let listeners = self.blocking.entry(event).or_default();
        let listener = BlockingListener {
            id,
            priority,
            once,
            callback,
        };
        let pos = listeners
            .iter()
            .position(|l| l.priority < priority)
            .unwrap_or(listeners.len());
        listeners.insert(pos, listener);
    }
}

/// The listener registry plus dispatch machinery. Wrapped by
/// [`super::EventBus`], which adds the component registry on top.
pub struct Emitter {
    registry: Mutex<ListenerRegistry>,
    limits: Mutex<HashMap<Event, Arc<Semaphore>>>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(ListenerRegistry::default()),
            limits: Mutex::new(HashMap::new()),
        }
    }

    /// Register a plain listener: unordered, fire-and-forget, invoked after
    /// the blocking chain of an occurrence succeeds (or on a direct
    /// [`emit_plain`](Self::emit_plain)).
    pub fn on<F>(&self, event: Event, callback: F)
    where
        F: Fn(EventPayload) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap();
        registry
            .plain
            .entry(event)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Register a blocking listener at the given priority (higher runs
    /// earlier; equal priorities run in registration order).
    pub fn on_blocking<F, Fut>(&self, event: Event, priority: i32, callback: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.register_blocking(event, priority, false, callback);
    }

    /// Like [`on_blocking`](Self::on_blocking), but the listener is purged
    /// after the first successfully completed dispatch that invoked it.
    pub fn once_blocking<F, Fut>(&self, event: Event, priority: i32, callback: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.register_blocking(event, priority, true, callback);
    }

    fn register_blocking<F, Fut>(&self, event: Event, priority: i32, once: bool, callback: F)
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let boxed: BlockingFn = Arc::new(move |payload| callback(payload).boxed());
        let mut registry = self.registry.lock().unwrap();
        registry.insert_blocking(event, priority, once, boxed);
    }

    /// Bound the number of concurrently in-flight `emit_blocking` occurrences
    /// for this event. Additional emissions queue FIFO until a slot frees.
    /// Without a configured ceiling the event is unbounded.
    ///
    /// The ceiling only governs emissions admitted after the call: replacing
    /// an existing ceiling installs a fresh permit pool, so occurrences still
    /// holding a permit from the old pool do not count against the new one.
    /// Set the ceiling before the event's first emission, or while the event
    /// is quiescent.
    pub fn set_max_parallel(&self, event: Event, limit: usize) {
        let mut limits = self.limits.lock().unwrap();
        limits.insert(event, Arc::new(Semaphore::new(limit)));
    }

    /// Run the blocking listener chain for one occurrence of `event`.
    ///
    /// Listener registration during the pass only affects future emissions:
    /// the chain iterates over a snapshot taken before the first listener
    /// runs, and the plain fan-out snapshots again after the chain succeeds.
    pub async fn emit_blocking(&self, event: Event, payload: EventPayload) -> Result<()> {
        let semaphore = {
            let limits = self.limits.lock().unwrap();
            limits.get(&event).cloned()
        };
        let _permit = match semaphore {
            Some(sem) => Some(
                sem.acquire_owned()
                    .await
                    .map_err(anyhow::Error::from)?,
            ),
            None => None,
        };

        let snapshot: Vec<(u64, bool, BlockingFn)> = {
            let registry = self.registry.lock().unwrap();
            registry
                .blocking
                .get(&event)
                .map(|listeners| {
                    listeners
                        .iter()
                        .map(|l| (l.id, l.once, Arc::clone(&l.callback)))
                        .collect()
                })
                .unwrap_or_default()
        };

        trace!(event = %event, listeners = snapshot.len(), "blocking dispatch start");

        let mut invoked_once: Vec<u64> = Vec::new();
        for (id, once, callback) in &snapshot {
            (**callback)(payload.clone()).await?;
            if *once {
                invoked_once.push(*id);
            }
        }

        if !invoked_once.is_empty() {
            let mut registry = self.registry.lock().unwrap();
            if let Some(listeners) = registry.blocking.get_mut(&event) {
                listeners.retain(|l| !invoked_once.contains(&l.id));
            }
        }

        self.emit_plain(event, payload);
        Ok(())
    }

    /// Fire-and-forget fan-out to the plain listeners of `event`.
    pub fn emit_plain(&self, event: Event, payload: EventPayload) {
        let snapshot: Vec<PlainFn> = {
            let registry = self.registry.lock().unwrap();
            registry
                .plain
                .get(&event)
                .map(|listeners| listeners.iter().map(Arc::clone).collect())
                .unwrap_or_default()
        };

        for callback in snapshot {
            (*callback)(payload.clone());
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock().unwrap();
        f.debug_struct("Emitter")
            .field("blocking_events", &registry.blocking.len())
            .field("plain_events", &registry.plain.len())
            .finish_non_exhaustive()
    }
}
