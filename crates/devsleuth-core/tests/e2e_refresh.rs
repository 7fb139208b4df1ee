/// End-to-end refresh tests.
///
/// A real `JsonDumpEnumerator` reads dump files from a temporary directory
/// and a real `RefreshWorker` thread builds snapshots from them. The tests
/// drain the result channel the way the UI does, with a deadline so a stuck
/// worker fails the test instead of hanging the suite.
use devsleuth_core::enumerator::{DeviceEnumerator, JsonDumpEnumerator};
use devsleuth_core::model::instance_id_hash;
use devsleuth_core::refresh::{RefreshMessage, RefreshRequest, RefreshWorker};
use devsleuth_core::settings::TreeConfig;
use devsleuth_core::snapshot::Snapshot;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn dump(children: &[(&str, &str, bool)]) -> String {
    let items: Vec<String> = children
        .iter()
        .map(|(id, name, present)| {
            format!(
                r#"{{ "instance_id": {id:?}, "properties": {{
                    "Name": {{ "String": {name:?} }},
                    "IsPresent": {{ "Boolean": {present} }} }} }}"#
            )
        })
        .collect();
    format!(
        r#"{{ "instance_id": "HTREE\\ROOT\\0",
             "properties": {{ "Name": {{ "String": "Computer" }} }},
             "children": [{}] }}"#,
        items.join(",")
    )
}

fn write(path: &Path, text: &str) {
    std::fs::write(path, text).unwrap();
}

fn request(force: bool, config: &Arc<TreeConfig>, active: Option<&Snapshot>) -> RefreshRequest {
    RefreshRequest {
        seq: 0,
        force,
        config: Arc::clone(config),
        active: active.map(|s| Arc::clone(s.raw_tree())),
    }
}

/// Wait for the next result, panicking after a generous timeout.
fn next_message(worker: &RefreshWorker) -> RefreshMessage {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        assert!(Instant::now() < deadline, "worker did not answer within 30 seconds");
        match worker.result_rx.try_recv() {
            Ok(msg) => return msg,
            Err(crossbeam_channel::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                panic!("worker channel disconnected");
            }
        }
    }
}

fn expect_snapshot(msg: RefreshMessage) -> Arc<Snapshot> {
    match msg {
        RefreshMessage::Built { snapshot, .. } => snapshot,
        RefreshMessage::Unchanged { .. } => panic!("expected a new snapshot"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn e2e_dump_snapshot_respects_show_disconnected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devices.json");
    write(&path, &dump(&[("A", "Alpha", true), ("B", "Beta", false)]));

    let worker = RefreshWorker::start(Arc::new(JsonDumpEnumerator::new(&path))).unwrap();

    let hidden = Arc::new(TreeConfig {
        show_root: false,
        ..TreeConfig::default()
    });
    worker.request(request(true, &hidden, None));
    let snapshot = expect_snapshot(next_message(&worker));
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.roots().len(), 1);
    assert!(snapshot.lookup(instance_id_hash("A")).is_some());
    assert!(snapshot.lookup(instance_id_hash("B")).is_none());

    let shown = Arc::new(TreeConfig {
        show_root: false,
        show_disconnected: true,
        ..TreeConfig::default()
    });
    worker.request(request(true, &shown, Some(&snapshot)));
    let snapshot = expect_snapshot(next_message(&worker));
    assert_eq!(snapshot.len(), 2);
    let hashes: Vec<u32> = snapshot.nodes().iter().map(|n| n.instance_id_hash).collect();
    let mut sorted = hashes.clone();
    sorted.sort_unstable();
    assert_eq!(hashes, sorted, "flat node list must be ordered by hash");
}

#[test]
fn e2e_unchanged_dump_is_not_rebuilt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devices.json");
    write(&path, &dump(&[("A", "Alpha", true)]));

    let worker = RefreshWorker::start(Arc::new(JsonDumpEnumerator::new(&path))).unwrap();
    let config = Arc::new(TreeConfig::default());

    worker.request(request(false, &config, None));
    let snapshot = expect_snapshot(next_message(&worker));

    worker.request(request(false, &config, Some(&snapshot)));
    assert!(matches!(next_message(&worker), RefreshMessage::Unchanged { .. }));
}

#[test]
fn e2e_forced_refresh_picks_up_new_devices() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devices.json");
    write(&path, &dump(&[("A", "Alpha", true)]));

    let enumerator = Arc::new(JsonDumpEnumerator::new(&path));
    let worker = RefreshWorker::start(enumerator.clone()).unwrap();
    let config = Arc::new(TreeConfig::default());

    worker.request(request(true, &config, None));
    let first = expect_snapshot(next_message(&worker));
    assert!(first.lookup(instance_id_hash("C")).is_none());

    write(&path, &dump(&[("A", "Alpha", true), ("C", "Gamma", true)]));
    worker.request(request(true, &config, Some(&first)));
    let second = expect_snapshot(next_message(&worker));
    assert!(second.lookup(instance_id_hash("C")).is_some());
    assert!(Arc::ptr_eq(second.raw_tree(), &enumerator.reference_current_tree(false)));
}

#[test]
fn e2e_broken_dump_yields_empty_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devices.json");
    write(&path, "{ truncated");

    let worker = RefreshWorker::start(Arc::new(JsonDumpEnumerator::new(&path))).unwrap();
    worker.request(request(true, &Arc::new(TreeConfig::default()), None));
    let snapshot = expect_snapshot(next_message(&worker));
    assert!(snapshot.is_empty());
    assert!(snapshot.roots().is_empty());
}
