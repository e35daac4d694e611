//! Deletion scheduler: a registry of cancellable "delete this message later" timers.
//!
//! Per message: `Idle -> Scheduled -> {Fired | Cancelled}`.
//! - At most one live timer exists per [`MessageRef`]; scheduling again cancels and
//!   replaces the previous one.
//! - Each timer is its own tokio task, so updates are never blocked by a pending delete.
//! - A fired timer removes its registry entry *before* calling the delete action. That
//!   removal is the commit point: a `cancel()` arriving after it is lost (known race,
//!   accepted). A `cancel()` arriving before it always wins.
//! - Delete failures are reported and dropped, never retried.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::MessageRef,
    events::{EventSink, OpsEvent},
    policy::MAX_DELAY_SECONDS,
    Result,
};

/// Port: the platform's "delete message" call.
///
/// Implementations should report an already-deleted message as `Ok`.
#[async_trait]
pub trait DeleteAction: Send + Sync {
    async fn delete_message(&self, target: MessageRef) -> Result<()>;
}

/// Cancellable handle to one scheduled deletion.
#[derive(Clone, Debug)]
pub struct DeletionHandle {
    target: MessageRef,
    token: CancellationToken,
}

impl DeletionHandle {
    pub fn target(&self) -> MessageRef {
        self.target
    }

    /// Stop this timer. A no-op if it already fired or was replaced.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Clone)]
pub struct DeletionScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    action: Arc<dyn DeleteAction>,
    sink: Arc<dyn EventSink>,
    pending: Mutex<HashMap<MessageRef, PendingDeletion>>,
    next_generation: AtomicU64,
    shutdown: CancellationToken,
}

struct PendingDeletion {
    generation: u64,
    delay_seconds: u32,
    fire_at: Instant,
    handle: DeletionHandle,
}

impl DeletionScheduler {
    pub fn new(action: Arc<dyn DeleteAction>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                action,
                sink,
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Delete `target` after `delay_seconds` (clamped to a day), replacing any
    /// deletion already pending for it.
    pub async fn schedule(&self, target: MessageRef, delay_seconds: u32) -> DeletionHandle {
        let delay_seconds = delay_seconds.min(MAX_DELAY_SECONDS);
        let delay = Duration::from_secs(u64::from(delay_seconds));
        let handle = DeletionHandle {
            target,
            token: self.inner.shutdown.child_token(),
        };

        if self.inner.shutdown.is_cancelled() {
            return handle;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let replaced = {
            let mut map = self.inner.pending.lock().await;
            let prev = map.insert(
                target,
                PendingDeletion {
                    generation,
                    delay_seconds,
                    fire_at: Instant::now() + delay,
                    handle: handle.clone(),
                },
            );
            match prev {
                Some(prev) => {
                    prev.handle.cancel();
                    true
                }
                None => false,
            }
        };

        if replaced {
            self.inner.sink.record(OpsEvent::DeletionReplaced { target });
        }
        self.inner.sink.record(OpsEvent::DeletionScheduled {
            target,
            delay_seconds,
        });

        self.spawn_timer(handle.clone(), generation, delay);
        handle
    }

    /// Cancel the pending deletion for `target`. Returns `false` if nothing was pending.
    pub async fn cancel(&self, target: MessageRef) -> bool {
        let entry = self.inner.pending.lock().await.remove(&target);
        let Some(entry) = entry else {
            return false;
        };
        entry.handle.cancel();
        self.inner.sink.record(OpsEvent::DeletionCancelled { target });
        true
    }

    pub async fn is_pending(&self, target: MessageRef) -> bool {
        self.inner.pending.lock().await.contains_key(&target)
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.pending.lock().await.len()
    }

    pub async fn fire_at(&self, target: MessageRef) -> Option<Instant> {
        self.inner
            .pending
            .lock()
            .await
            .get(&target)
            .map(|e| e.fire_at)
    }

    /// Abandon every in-flight timer (no drain). Returns how many were dropped.
    ///
    /// Later `schedule()` calls return already-cancelled handles.
    pub async fn shutdown(&self) -> usize {
        self.inner.shutdown.cancel();
        let mut map = self.inner.pending.lock().await;
        let abandoned = map.len();
        map.clear();
        abandoned
    }

    fn spawn_timer(&self, handle: DeletionHandle, generation: u64, delay: Duration) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = handle.token.cancelled() => {
                    scheduler.discard(handle.target, generation).await;
                }
                _ = sleep(delay) => {
                    scheduler.fire(handle.target, generation).await;
                }
            }
        });
    }

    /// Drop the entry of a timer cancelled through its handle. Replaced or
    /// explicitly cancelled entries are already gone (or belong to a newer generation).
    async fn discard(&self, target: MessageRef, generation: u64) {
        let removed = {
            let mut map = self.inner.pending.lock().await;
            match map.get(&target) {
                Some(e) if e.generation == generation => map.remove(&target).is_some(),
                _ => false,
            }
        };
        if removed {
            self.inner.sink.record(OpsEvent::DeletionCancelled { target });
        }
    }

    async fn fire(&self, target: MessageRef, generation: u64) {
        let entry = {
            let mut map = self.inner.pending.lock().await;
            match map.get(&target) {
                Some(e) if e.generation == generation && !e.handle.is_cancelled() => {
                    map.remove(&target)
                }
                _ => None,
            }
        };
        let Some(entry) = entry else {
            return;
        };

        // Committed: the entry is gone whatever the delete outcome.
        match self.inner.action.delete_message(target).await {
            Ok(()) => self.inner.sink.record(OpsEvent::DeletionFired {
                target,
                delay_seconds: entry.delay_seconds,
            }),
            Err(e) => self.inner.sink.record(OpsEvent::DeleteFailed {
                target,
                error: e.to_string(),
            }),
        }
    }
}
