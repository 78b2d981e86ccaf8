use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use conveyor::bus::{Event, EventBus, EventPayload};
use conveyor_test_utils::{init_tracing, with_timeout};

/// Tracks concurrent listener executions and the high-water mark.
struct Gauge {
    inflight: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inflight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn enter(&self) {
        let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.inflight.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn instrument(bus: &EventBus, gauge: &Arc<Gauge>) {
    let gauge = Arc::clone(gauge);
    bus.on_blocking(Event::AssetEmit, 0, move |_payload| {
        let gauge = Arc::clone(&gauge);
        async move {
            gauge.enter();
            tokio::time::sleep(Duration::from_millis(30)).await;
            gauge.exit();
            Ok(())
        }
    });
}

#[tokio::test]
async fn ceiling_of_one_serialises_occurrences_of_the_same_event() {
    init_tracing();
    with_timeout(async {
        let bus = Arc::new(EventBus::new());
        bus.set_max_parallel(Event::AssetEmit, 1);

        let gauge = Gauge::new();
        instrument(&bus, &gauge);

        let emits: Vec<_> = (0..3)
            .map(|_| {
                let bus = Arc::clone(&bus);
                tokio::spawn(async move {
                    bus.emit_blocking(Event::AssetEmit, EventPayload::Empty).await
                })
            })
            .collect();

        for handle in emits {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(gauge.peak(), 1, "at most one occurrence may be in flight");
    })
    .await;
}

#[tokio::test]
async fn unbounded_event_overlaps_occurrences() {
    init_tracing();
    with_timeout(async {
        let bus = Arc::new(EventBus::new());

        let gauge = Gauge::new();
        instrument(&bus, &gauge);

        let emits: Vec<_> = (0..3)
            .map(|_| {
                let bus = Arc::clone(&bus);
                tokio::spawn(async move {
                    bus.emit_blocking(Event::AssetEmit, EventPayload::Empty).await
                })
            })
            .collect();

        for handle in emits {
            handle.await.unwrap().unwrap();
        }

        assert!(
            gauge.peak() > 1,
            "without a ceiling the occurrences should overlap (peak {})",
            gauge.peak()
        );
    })
    .await;
}

#[tokio::test]
async fn ceiling_applies_per_event_name() {
    init_tracing();
    with_timeout(async {
        let bus = Arc::new(EventBus::new());
        bus.set_max_parallel(Event::AssetEmit, 1);

        // A different event is not throttled by AssetEmit's ceiling.
        let entered = Arc::new(AtomicUsize::new(0));
        {
            let entered = Arc::clone(&entered);
            bus.on_blocking(Event::ModuleProcessed, 0, move |_payload| {
                let entered = Arc::clone(&entered);
                async move {
                    entered.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        // Hold the AssetEmit slot, then confirm ModuleProcessed still runs.
        let gauge = Gauge::new();
        instrument(&bus, &gauge);

        let blocker = {
            let bus = Arc::clone(&bus);
            tokio::spawn(async move {
                bus.emit_blocking(Event::AssetEmit, EventPayload::Empty).await
            })
        };

        bus.emit_blocking(
            Event::ModuleProcessed,
            EventPayload::ModuleDone {
                module: "m".to_string(),
                stats: Default::default(),
            },
        )
        .await
        .unwrap();

        assert_eq!(entered.load(Ordering::SeqCst), 1);
        blocker.await.unwrap().unwrap();
    })
    .await;
}

#[tokio::test]
async fn ceiling_can_be_replaced_while_the_event_is_quiescent() {
    init_tracing();
    with_timeout(async {
        let bus = Arc::new(EventBus::new());
        bus.set_max_parallel(Event::AssetEmit, 1);

        let gauge = Gauge::new();
        instrument(&bus, &gauge);

        let emits: Vec<_> = (0..3)
            .map(|_| {
                let bus = Arc::clone(&bus);
                tokio::spawn(async move {
                    bus.emit_blocking(Event::AssetEmit, EventPayload::Empty).await
                })
            })
            .collect();
        for handle in emits {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(gauge.peak(), 1);

        // With nothing in flight the new ceiling fully replaces the old one.
        bus.set_max_parallel(Event::AssetEmit, 3);

        let emits: Vec<_> = (0..3)
            .map(|_| {
                let bus = Arc::clone(&bus);
                tokio::spawn(async move {
                    bus.emit_blocking(Event::AssetEmit, EventPayload::Empty).await
                })
            })
            .collect();
        for handle in emits {
            handle.await.unwrap().unwrap();
        }

        assert!(
            gauge.peak() > 1,
            "raised ceiling should let occurrences overlap (peak {})",
            gauge.peak()
        );
    })
    .await;
}
