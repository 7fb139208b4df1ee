/// Refresh worker: builds snapshots off the UI thread.
///
/// One named background thread owns the enumerator. The UI thread sends
/// [`RefreshRequest`]s; requests that pile up while a build runs are
/// coalesced into one. Finished snapshots come back as
/// [`RefreshMessage`]s on a bounded channel that the UI drains once per
/// frame and publishes. In-flight builds are never cancelled; whichever
/// result is published last wins.
pub mod progress;

pub use progress::{RefreshMessage, RefreshRequest};

use crate::enumerator::DeviceEnumerator;
use crate::error::{DevSleuthError, Result};
use crate::snapshot;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Maximum number of results that may queue up in the channel.
///
/// Each result holds a whole snapshot, so the queue is kept short; a worker
/// that gets this far ahead of the UI waits for it.
pub const RESULT_CHANNEL_CAPACITY: usize = 64;

/// Handle to the running refresh worker.
pub struct RefreshWorker {
    request_tx: Option<Sender<RefreshRequest>>,
    /// Receiver for results from the worker thread.
    pub result_rx: Receiver<RefreshMessage>,
    busy: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RefreshWorker {
    /// Start the worker thread over `enumerator`.
    pub fn start(enumerator: Arc<dyn DeviceEnumerator>) -> Result<Self> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<RefreshRequest>();
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<RefreshMessage>(RESULT_CHANNEL_CAPACITY);
        let busy = Arc::new(AtomicBool::new(false));
        let busy_clone = Arc::clone(&busy);

        let thread = thread::Builder::new()
            .name("devsleuth-refresh".into())
            .spawn(move || run(enumerator, request_rx, result_tx, busy_clone))
            .map_err(DevSleuthError::WorkerSpawn)?;

        info!("Refresh worker started");
        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            busy,
            thread: Some(thread),
        })
    }

    /// Queue a refresh. Never blocks.
    pub fn request(&self, request: RefreshRequest) {
        if let Some(tx) = &self.request_tx {
            // Only fails if the worker exited, which it does only on drop.
            let _ = tx.send(request);
        }
    }

    /// `true` while a build is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }
}

impl Drop for RefreshWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.request_tx.take();
        if let Some(thread) = self.thread.take() {
            // Keep draining so a worker blocked on a full result channel
            // can observe the closed request channel.
            while !thread.is_finished() {
                let _ = self.result_rx.recv_timeout(Duration::from_millis(10));
            }
            let _ = thread.join();
        }
        info!("Refresh worker stopped");
    }
}

fn run(
    enumerator: Arc<dyn DeviceEnumerator>,
    request_rx: Receiver<RefreshRequest>,
    result_tx: Sender<RefreshMessage>,
    busy: Arc<AtomicBool>,
) {
    while let Ok(mut request) = request_rx.recv() {
        let mut coalesced = 0usize;
        while let Ok(next) = request_rx.try_recv() {
            request = request.merge(next);
            coalesced += 1;
        }

        busy.store(true, Ordering::Relaxed);
        let start = Instant::now();
        let built = snapshot::create_if_stale(
            enumerator.as_ref(),
            request.active.as_ref(),
            request.force,
            &request.config,
        );
        busy.store(false, Ordering::Relaxed);

        let message = match built {
            Some(snapshot) => {
                let duration = start.elapsed();
                debug!(
                    nodes = snapshot.len(),
                    forced = request.force,
                    coalesced,
                    ms = duration.as_millis() as u64,
                    "Refresh built snapshot"
                );
                RefreshMessage::Built {
                    seq: request.seq,
                    snapshot: Arc::new(snapshot),
                    forced: request.force,
                    duration,
                }
            }
            None => RefreshMessage::Unchanged { seq: request.seq },
        };

        // Drop the stale-check reference before blocking on the UI.
        drop(request);
        if result_tx.send(message).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::StaticEnumerator;
    use crate::model::{DeviceItem, RawTree};
    use crate::settings::TreeConfig;

    fn enumerator() -> Arc<StaticEnumerator> {
        let mut raw = RawTree::with_capacity(1);
        raw.add_root(DeviceItem::new("ROOT", false));
        Arc::new(StaticEnumerator::new(raw))
    }

    fn request(force: bool, active: Option<Arc<RawTree>>) -> RefreshRequest {
        sequenced(1, force, active)
    }

    fn sequenced(seq: u64, force: bool, active: Option<Arc<RawTree>>) -> RefreshRequest {
        RefreshRequest {
            seq,
            force,
            config: Arc::new(TreeConfig::default()),
            active,
        }
    }

    #[test]
    fn test_first_request_builds() {
        let worker = RefreshWorker::start(enumerator()).unwrap();
        worker.request(request(false, None));
        let msg = worker.result_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        match msg {
            RefreshMessage::Built { snapshot, forced, .. } => {
                assert!(!forced);
                assert_eq!(snapshot.len(), 1);
            }
            RefreshMessage::Unchanged { .. } => panic!("expected a snapshot"),
        }
    }

    #[test]
    fn test_unchanged_tree_is_not_rebuilt() {
        let source = enumerator();
        let active = source.reference_current_tree(false);
        let worker = RefreshWorker::start(source).unwrap();

        worker.request(request(false, Some(active)));
        let msg = worker.result_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(msg, RefreshMessage::Unchanged { seq: 1 }));
    }

    #[test]
    fn test_coalesced_requests_answer_latest_seq() {
        let worker = RefreshWorker::start(enumerator()).unwrap();
        for seq in 1..=5 {
            worker.request(sequenced(seq, true, None));
        }

        let mut seen = Vec::new();
        while seen.last() != Some(&5) {
            let msg = worker.result_rx.recv_timeout(Duration::from_secs(10)).unwrap();
            seen.push(msg.seq());
        }
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "out of order: {seen:?}");
    }

    #[test]
    fn test_drop_joins_worker() {
        let worker = RefreshWorker::start(enumerator()).unwrap();
        for _ in 0..10 {
            worker.request(request(true, None));
        }
        drop(worker);
    }
}
