use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use conveyor::bus::{Event, EventBus, EventPayload};
use conveyor::config::Container;
use conveyor::discovery::module::ModuleSpec;
use conveyor::discovery::walker;
use conveyor_test_utils::{builders::container_from_yaml, init_tracing, with_timeout};
use tempfile::TempDir;

/// Standard fixture tree: `a.txt`, `b.log`, `sub/c.txt`.
fn fixture_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::write(dir.path().join("b.log"), "b").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/c.txt"), "c").unwrap();
    dir
}

fn spec_for(root: &Path, patterns: &[&str], ignore: &[&str]) -> ModuleSpec {
    let yaml = format!(
        "root: {}\npatterns: [{}]\nignore: [{}]\n",
        root.display(),
        patterns
            .iter()
            .map(|p| format!("{p:?}"))
            .collect::<Vec<_>>()
            .join(", "),
        ignore
            .iter()
            .map(|p| format!("{p:?}"))
            .collect::<Vec<_>>()
            .join(", "),
    );
    let section: Container = container_from_yaml(&yaml);
    ModuleSpec::from_container("fixture", section, Path::new(".")).unwrap()
}

fn collect_assets(bus: &EventBus) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_handle = Arc::clone(&seen);
    bus.on_blocking(Event::AssetEmit, 0, move |payload| {
        let seen = Arc::clone(&seen_handle);
        async move {
            if let EventPayload::Asset(asset) = payload {
                seen.lock().unwrap().push(asset.file);
            }
            Ok(())
        }
    });
    seen
}

#[tokio::test]
async fn pattern_matching_files_are_emitted_recursively() {
    init_tracing();
    with_timeout(async {
        let dir = fixture_tree();
        let spec = spec_for(dir.path(), &[".txt"], &[]);
        let bus = Arc::new(EventBus::new());
        let seen = collect_assets(&bus);

        let stats = walker::process(&spec, Arc::clone(&bus)).await.unwrap();

        let mut files = seen.lock().unwrap().clone();
        files.sort();
        assert_eq!(files, vec!["a.txt", "sub/c.txt"]);
        assert_eq!(stats.emitted, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.dirs, 1);
    })
    .await;
}

#[tokio::test]
async fn ignored_directories_are_pruned_not_just_filtered() {
    init_tracing();
    with_timeout(async {
        let dir = fixture_tree();
        let spec = spec_for(dir.path(), &[".txt"], &["sub"]);
        let bus = Arc::new(EventBus::new());
        let seen = collect_assets(&bus);

        let stats = walker::process(&spec, Arc::clone(&bus)).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["a.txt"]);
        assert_eq!(stats.ignored, 1);
        // Nothing beneath `sub` was ever visited.
        assert_eq!(stats.total, 2);
    })
    .await;
}

#[tokio::test]
async fn regex_rules_compile_and_match() {
    init_tracing();
    with_timeout(async {
        let dir = fixture_tree();
        let spec = spec_for(dir.path(), &["/\\.TXT$/i"], &[]);
        let bus = Arc::new(EventBus::new());
        let seen = collect_assets(&bus);

        walker::process(&spec, Arc::clone(&bus)).await.unwrap();

        let mut files = seen.lock().unwrap().clone();
        files.sort();
        assert_eq!(files, vec!["a.txt", "sub/c.txt"]);
    })
    .await;
}

#[tokio::test]
async fn malformed_regex_rule_is_a_config_error() {
    let dir = fixture_tree();
    let yaml = format!("root: {}\npatterns: [\"/[unclosed/\"]\n", dir.path().display());
    let section = container_from_yaml(&yaml);
    let result = ModuleSpec::from_container("broken", section, Path::new("."));

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Configuration error"));
}

#[tokio::test]
async fn missing_module_root_fails_check() {
    init_tracing();
    let spec = spec_for(Path::new("/definitely/not/here"), &[".txt"], &[]);
    let err = walker::check(&spec).await.unwrap_err();
    assert!(err.to_string().contains("not accessible"));
}

#[tokio::test]
async fn asset_delivery_respects_a_ceiling_of_one() {
    init_tracing();
    with_timeout(async {
        let dir = fixture_tree();
        fs::write(dir.path().join("d.txt"), "d").unwrap();
        let spec = spec_for(dir.path(), &[".txt"], &[]);

        let bus = Arc::new(EventBus::new());
        bus.set_max_parallel(Event::AssetEmit, 1);

        let inflight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        {
            let inflight = Arc::clone(&inflight);
            let peak = Arc::clone(&peak);
            bus.on_blocking(Event::AssetEmit, 0, move |_payload| {
                let inflight = Arc::clone(&inflight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = inflight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(15)).await;
                    inflight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        let stats = walker::process(&spec, Arc::clone(&bus)).await.unwrap();

        assert_eq!(stats.emitted, 3);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    })
    .await;
}

#[tokio::test]
async fn a_rejected_dispatch_fails_the_pass() {
    init_tracing();
    with_timeout(async {
        let dir = fixture_tree();
        let spec = spec_for(dir.path(), &[".txt"], &[]);

        let bus = Arc::new(EventBus::new());
        bus.set_max_parallel(Event::AssetEmit, 1);
        bus.on_blocking(Event::AssetEmit, 0, |payload| async move {
            match payload {
                EventPayload::Asset(asset) if asset.file.ends_with("c.txt") => {
                    Err(anyhow::anyhow!("consumer refused {}", asset.file).into())
                }
                _ => Ok(()),
            }
        });

        let result = walker::process(&spec, Arc::clone(&bus)).await;
        assert!(result.is_err());
    })
    .await;
}
