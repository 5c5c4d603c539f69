//! Background persistence for the cart actor.
//!
//! One task owns every write to the store. The actor hands it versioned
//! snapshots over a `watch` channel; snapshots submitted while a write is in
//! flight collapse into the newest one. Writes are sequential, so the stored
//! copy always converges on the last submitted snapshot.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cart::snapshot;
use crate::model::CartLine;
use crate::storage::KeyValueStore;

type Snapshot = (u64, Vec<CartLine>);

pub(crate) struct SnapshotWriter {
    version: u64,
    latest: watch::Sender<Snapshot>,
    written: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Spawns the writer task. Must be called inside a Tokio runtime.
    pub(crate) fn spawn(store: Arc<dyn KeyValueStore>) -> Self {
        let (latest, snapshots) = watch::channel((0, Vec::new()));
        let (written_tx, written) = watch::channel(0);
        let task = tokio::spawn(write_loop(store, snapshots, written_tx));
        Self {
            version: 0,
            latest,
            written,
            task,
        }
    }

    /// Queues `lines` for writing, replacing any snapshot not yet picked up.
    pub(crate) fn submit(&mut self, lines: Vec<CartLine>) {
        self.version += 1;
        self.latest.send_replace((self.version, lines));
    }

    /// Waits until the last submitted snapshot has been written (or has failed).
    pub(crate) async fn flush(&mut self) {
        let target = self.version;
        if self.written.wait_for(|&v| v >= target).await.is_err() {
            warn!(target, "Cart writer stopped before flush completed");
        }
    }

    /// Writes whatever is still pending, then stops the task.
    pub(crate) async fn shutdown(self) {
        drop(self.latest);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Cart writer task failed");
        }
    }
}

async fn write_loop(
    store: Arc<dyn KeyValueStore>,
    mut snapshots: watch::Receiver<Snapshot>,
    written: watch::Sender<u64>,
) {
    while snapshots.changed().await.is_ok() {
        let (version, lines) = snapshots.borrow_and_update().clone();
        match snapshot::encode(&lines) {
            Ok(raw) => match store.set(snapshot::CART_KEY, &raw).await {
                Ok(()) => debug!(version, lines = lines.len(), "Cart persisted"),
                Err(e) => warn!(version, error = %e, "Could not persist cart"),
            },
            Err(e) => warn!(version, error = %e, "Could not encode cart"),
        }
        written.send_replace(version);
    }
}
