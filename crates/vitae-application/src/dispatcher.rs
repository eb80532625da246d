//! Debounced persistence of section edits.
//!
//! Edits are buffered per document id. Each buffer owns one quiet-period
//! timer; a new edit restarts it. When the timer fires the buffer is sent as
//! a single `PATCH`, and later edits start a fresh buffer right away without
//! waiting for that request to finish.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use vitae_core::document::{DocumentId, DocumentPatch, DocumentRepository, DocumentStore, SectionUpdate};
use vitae_core::error::{Result, VitaeError};

const EVENT_CAPACITY: usize = 64;

/// Outcome notifications for dispatched writes.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Saved {
        document_id: DocumentId,
        fields: usize,
    },
    SaveFailed {
        document_id: DocumentId,
        error: VitaeError,
    },
    /// The credential was rejected while saving; the session is over.
    SessionExpired { document_id: DocumentId },
}

struct PendingWrite {
    patch: DocumentPatch,
    generation: u64,
    timer: JoinHandle<()>,
}

struct Inner {
    repository: Arc<dyn DocumentRepository>,
    store: Arc<DocumentStore>,
    quiet_period: Duration,
    pending: Mutex<HashMap<DocumentId, PendingWrite>>,
    generation: AtomicU64,
    in_flight: watch::Sender<usize>,
    events: broadcast::Sender<SyncEvent>,
}

/// Coalesces section edits into throttled remote writes.
///
/// Scheduling spawns timer tasks, so it must be called from within a tokio
/// runtime. Failed writes are reported and never retried; the in-memory
/// document is never rolled back.
#[derive(Clone)]
pub struct PersistenceDispatcher {
    inner: Arc<Inner>,
}

impl PersistenceDispatcher {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        store: Arc<DocumentStore>,
        quiet_period: Duration,
    ) -> Self {
        let (in_flight, _) = watch::channel(0);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                repository,
                store,
                quiet_period,
                pending: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                in_flight,
                events,
            }),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Buffers an applied section update for its document.
    ///
    /// Updates for a document without an id have nowhere to go and are
    /// dropped with a warning.
    pub fn schedule(&self, update: &SectionUpdate) {
        let Some(document_id) = update.document_id.as_deref() else {
            tracing::warn!(
                "[PersistenceDispatcher] Dropping '{}' update for an unsaved document",
                update.key
            );
            return;
        };
        let mut patch = DocumentPatch::new();
        patch.set_section(update.key, update.value.clone());
        self.schedule_patch(document_id, patch);
    }

    /// Merges `patch` into the document's buffer and restarts its timer.
    pub fn schedule_patch(&self, document_id: &str, patch: DocumentPatch) {
        if patch.is_empty() {
            return;
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pending = self.inner.lock_pending();

        let merged = match pending.remove(document_id) {
            Some(previous) => {
                previous.timer.abort();
                let mut merged = previous.patch;
                merged.merge(patch);
                merged
            }
            None => patch,
        };

        let timer = tokio::spawn(Inner::timer(
            self.inner.clone(),
            document_id.to_string(),
            generation,
        ));
        tracing::trace!(
            "[PersistenceDispatcher] Buffered {} field(s) for {}",
            merged.len(),
            document_id
        );
        pending.insert(
            document_id.to_string(),
            PendingWrite {
                patch: merged,
                generation,
                timer,
            },
        );
    }

    /// Sends the document's buffer now instead of waiting for its timer.
    ///
    /// Returns `Ok(false)` when nothing was pending.
    pub async fn flush(&self, document_id: &str) -> Result<bool> {
        let Some(write) = self.inner.take(document_id, None) else {
            return Ok(false);
        };
        self.inner.dispatch(document_id, write).await?;
        Ok(true)
    }

    /// Flushes every buffered document. The first failure is returned after
    /// all buffers have been attempted.
    pub async fn flush_all(&self) -> Result<()> {
        let ids: Vec<DocumentId> = self.inner.lock_pending().keys().cloned().collect();
        let mut first_error = None;
        for id in ids {
            if let Err(e) = self.flush(&id).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Discards the document's buffer without writing it.
    pub fn cancel(&self, document_id: &str) -> bool {
        match self.inner.take(document_id, None) {
            Some(write) => {
                tracing::debug!(
                    "[PersistenceDispatcher] Discarded {} buffered field(s) for {}",
                    write.len(),
                    document_id
                );
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self, document_id: &str) -> bool {
        self.inner.lock_pending().contains_key(document_id)
    }

    /// A copy of the document's buffered, not yet dispatched, fields.
    pub fn pending_patch(&self, document_id: &str) -> Option<DocumentPatch> {
        self.inner
            .lock_pending()
            .get(document_id)
            .map(|write| write.patch.clone())
    }

    /// Number of writes currently awaiting a response, across all documents.
    pub fn in_flight(&self) -> usize {
        *self.inner.in_flight.borrow()
    }

    /// Waits until no dispatched write is awaiting a response.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.in_flight.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<DocumentId, PendingWrite>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Removes a buffer, optionally only if it still belongs to `generation`.
    fn take(&self, document_id: &str, generation: Option<u64>) -> Option<DocumentPatch> {
        let mut pending = self.lock_pending();
        if let Some(expected) = generation {
            if pending.get(document_id).map(|w| w.generation) != Some(expected) {
                return None;
            }
        }
        let write = pending.remove(document_id)?;
        if generation.is_none() {
            write.timer.abort();
        }
        Some(write.patch)
    }

    async fn timer(self: Arc<Self>, document_id: DocumentId, generation: u64) {
        tokio::time::sleep(self.quiet_period).await;
        // A newer edit may have replaced this buffer while we slept.
        let Some(patch) = self.take(&document_id, Some(generation)) else {
            return;
        };
        let _ = self.dispatch(&document_id, patch).await;
    }

    async fn dispatch(&self, document_id: &str, patch: DocumentPatch) -> Result<()> {
        let fields = patch.len();
        let ticket = self.store.begin_save(document_id);
        self.in_flight.send_modify(|count| *count += 1);
        tracing::debug!(
            "[PersistenceDispatcher] Writing {} field(s) to {}",
            fields,
            document_id
        );

        let result = self.repository.patch(document_id, &patch).await;

        if let Some(ticket) = ticket {
            self.store.finish_save(ticket);
        }
        self.in_flight.send_modify(|count| *count = count.saturating_sub(1));

        let document_id = document_id.to_string();
        match result {
            Ok(_) => {
                tracing::debug!("[PersistenceDispatcher] Saved {}", document_id);
                let _ = self.events.send(SyncEvent::Saved {
                    document_id,
                    fields,
                });
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(
                    "[PersistenceDispatcher] Session expired while saving {}",
                    document_id
                );
                let _ = self.events.send(SyncEvent::SessionExpired { document_id });
                Err(e)
            }
            Err(e) => {
                tracing::error!(
                    "[PersistenceDispatcher] Failed to save {}: {}",
                    document_id,
                    e
                );
                let _ = self.events.send(SyncEvent::SaveFailed {
                    document_id,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }
}
