//! Cancellable background operations with estimated progress.
//!
//! Each long request runs on its own tokio task. The task's `AbortHandle`
//! stays in the active set until the operation is cancelled or removed, so
//! the UI can poll [`Operations::snapshots`] (or drive a [`ProgressTicker`])
//! while the request is in flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ncp_core::progress::{OperationKind, OperationStatus, ProgressSnapshot};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ClientError;

/// How often a [`ProgressTicker`] fires.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

struct Entry {
    kind: OperationKind,
    started: Instant,
    status: OperationStatus,
    /// Frozen once the operation stops.
    finished_after: Option<Duration>,
    abort: AbortHandle,
}

impl Entry {
    fn snapshot(&self, id: Uuid, now: Instant) -> ProgressSnapshot {
        let elapsed = self
            .finished_after
            .unwrap_or_else(|| now.saturating_duration_since(self.started));
        ProgressSnapshot::new(id, self.kind, self.status, elapsed)
    }
}

/// The active set of background operations. Cheap to clone.
#[derive(Clone, Default)]
pub struct Operations {
    entries: Arc<Mutex<HashMap<Uuid, Entry>>>,
}

/// Result side of a spawned operation.
pub struct PendingOperation<T> {
    id: Uuid,
    result: oneshot::Receiver<Result<T, ClientError>>,
}

impl<T> PendingOperation<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the request to finish. A cancelled operation yields
    /// [`ClientError::Cancelled`].
    pub async fn wait(self) -> Result<T, ClientError> {
        self.result.await.unwrap_or(Err(ClientError::Cancelled))
    }
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn `request` as a tracked operation.
    pub fn start<T, F>(&self, kind: OperationKind, request: F) -> PendingOperation<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        let entries = self.entries.clone();

        // Hold the lock across spawn so the task cannot finish before its
        // entry exists.
        let mut guard = self.lock();
        let task = tokio::spawn(async move {
            let result = request.await;
            let status = if result.is_ok() {
                OperationStatus::Completed
            } else {
                OperationStatus::Failed
            };
            if let Some(entry) = entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .get_mut(&id)
            {
                entry.status = status;
                entry.finished_after = Some(entry.started.elapsed());
            }
            debug!(%id, ?status, "operation finished");
            let _ = tx.send(result);
        });
        guard.insert(
            id,
            Entry {
                kind,
                started: Instant::now(),
                status: OperationStatus::Pending,
                finished_after: None,
                abort: task.abort_handle(),
            },
        );
        drop(guard);

        info!(%id, operation = kind.label(), "operation started");
        PendingOperation { id, result: rx }
    }

    /// Abort the in-flight request and drop it from the active set.
    /// Returns `false` when `id` is unknown.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.lock().remove(&id) {
            Some(entry) => {
                entry.abort.abort();
                info!(%id, operation = entry.kind.label(), "operation cancelled");
                true
            }
            None => false,
        }
    }

    /// Abort everything still pending.
    pub fn cancel_all(&self) {
        let mut entries = self.lock();
        for (id, entry) in entries.drain() {
            if !entry.status.is_finished() {
                entry.abort.abort();
                debug!(%id, "operation cancelled");
            }
        }
    }

    /// Forget a finished operation.
    pub fn remove(&self, id: Uuid) {
        self.lock().remove(&id);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<ProgressSnapshot> {
        self.lock().get(&id).map(|e| e.snapshot(id, Instant::now()))
    }

    /// Every tracked operation, oldest first.
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        let now = Instant::now();
        let entries = self.lock();
        let mut items: Vec<_> = entries.iter().collect();
        items.sort_by_key(|(_, e)| e.started);
        items.into_iter().map(|(id, e)| e.snapshot(*id, now)).collect()
    }

    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|e| !e.status.is_finished()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn ticker(&self) -> ProgressTicker {
        ProgressTicker::new(self.clone(), TICK_INTERVAL)
    }
}

/// Once-per-second progress source. Dropping it stops the ticks.
pub struct ProgressTicker {
    operations: Operations,
    interval: Interval,
}

impl ProgressTicker {
    pub fn new(operations: Operations, period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { operations, interval }
    }

    /// Wait for the next tick and return fresh snapshots.
    pub async fn tick(&mut self) -> Vec<ProgressSnapshot> {
        self.interval.tick().await;
        self.operations.snapshots()
    }
}
