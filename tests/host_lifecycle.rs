use std::sync::{Arc, Mutex};

use conveyor::bus::{Event, EventPayload};
use conveyor::component::Component;
use conveyor::host::Host;
use conveyor_test_utils::builders::{container_from_yaml, fixture_config_path};
use conveyor_test_utils::fake_component::FakeComponent;
use conveyor_test_utils::{init_tracing, with_timeout};

fn calls() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn lifecycle_phases_run_in_order() {
    init_tracing();
    with_timeout(async {
        let log = calls();
        let component = FakeComponent::new("worker", Arc::clone(&log));

        let host = Host::new();
        host.register(component.clone()).unwrap();

        let root = container_from_yaml("worker:\n  setting: 1\n");
        host.run(root, fixture_config_path()).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["worker:subscribe", "worker:run", "worker:teardown"]
        );
        assert!(component.is_active());
    })
    .await;
}

#[tokio::test]
async fn bound_container_carries_file_metadata() {
    init_tracing();
    with_timeout(async {
        let log = calls();
        let component = FakeComponent::new("worker", Arc::clone(&log));

        let host = Host::new();
        host.register(component.clone()).unwrap();

        let root = container_from_yaml("worker:\n  setting: 1\n");
        host.run(root, fixture_config_path()).await.unwrap();

        let container = component.ready().await.unwrap().expect("bound");
        assert_eq!(container.get_u64("setting"), Some(1));
        assert_eq!(
            container.get_str("__file"),
            Some("/tmp/conveyor-test/Conveyor.yml")
        );
        assert_eq!(container.get_str("__dir"), Some("/tmp/conveyor-test"));
    })
    .await;
}

#[tokio::test]
async fn component_without_a_section_is_skipped_but_torn_down() {
    init_tracing();
    with_timeout(async {
        let log = calls();
        let component = FakeComponent::new("worker", Arc::clone(&log));

        let host = Host::new();
        host.register(component.clone()).unwrap();

        let root = container_from_yaml("unrelated: {}\n");
        host.run(root, fixture_config_path()).await.unwrap();

        assert!(!component.is_active());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["worker:subscribe", "worker:teardown"]
        );
    })
    .await;
}

#[tokio::test]
async fn component_ready_events_fire_for_every_component() {
    init_tracing();
    with_timeout(async {
        let log = calls();
        let bound = FakeComponent::new("bound", Arc::clone(&log));
        let unbound = FakeComponent::new("unbound", Arc::clone(&log));

        let host = Host::new();
        host.register(bound).unwrap();
        host.register(unbound).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            host.bus().on(Event::ComponentReady, move |payload| {
                if let EventPayload::ComponentReady { name, active } = payload {
                    seen.lock().unwrap().push((name, active));
                }
            });
        }

        let root = container_from_yaml("bound: {}\n");
        host.run(root, fixture_config_path()).await.unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("bound".to_string(), true),
                ("unbound".to_string(), false)
            ]
        );
    })
    .await;
}

#[tokio::test]
async fn a_failing_run_fails_the_host_but_teardown_still_happens() {
    init_tracing();
    with_timeout(async {
        let log = calls();
        let good = FakeComponent::new("good", Arc::clone(&log));
        let bad = FakeComponent::failing("bad", Arc::clone(&log));

        let host = Host::new();
        host.register(good).unwrap();
        host.register(bad).unwrap();

        let root = container_from_yaml("good: {}\nbad: {}\n");
        let result = host.run(root, fixture_config_path()).await;

        assert!(result.is_err());
        let log = log.lock().unwrap();
        assert!(log.contains(&"good:teardown".to_string()));
        assert!(log.contains(&"bad:teardown".to_string()));
    })
    .await;
}

#[tokio::test]
async fn a_rejected_config_load_still_tears_every_component_down() {
    init_tracing();
    with_timeout(async {
        let log = calls();
        let worker = FakeComponent::new("worker", Arc::clone(&log));
        let helper = FakeComponent::new("helper", Arc::clone(&log));

        let host = Host::new();
        host.register(worker).unwrap();
        host.register(helper).unwrap();

        // Outranks the components' config listeners, so neither ever binds.
        host.bus().on_blocking(Event::ConfigLoad, 100, |_payload| async {
            Err(anyhow::anyhow!("config veto").into())
        });

        let root = container_from_yaml("worker:\n  setting: 1\nhelper:\n  setting: 2\n");
        let err = host.run(root, fixture_config_path()).await.unwrap_err();
        assert!(err.to_string().contains("config veto"));

        let log = log.lock().unwrap().clone();
        assert!(log.contains(&"worker:teardown".to_string()), "{log:?}");
        assert!(log.contains(&"helper:teardown".to_string()), "{log:?}");
        assert!(!log.iter().any(|entry| entry.ends_with(":run")), "{log:?}");
    })
    .await;
}
