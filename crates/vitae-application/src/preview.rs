//! Debounced live preview of the resident document.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use vitae_core::document::{Document, DocumentSnapshot, DocumentStore};
use vitae_core::error::{Result, VitaeError};
use vitae_core::render::{Artifact, RenderService};

struct Inner {
    renderer: Arc<dyn RenderService>,
    artifact: watch::Sender<Option<Arc<Artifact>>>,
    loading: watch::Sender<usize>,
    next_seq: AtomicU64,
    /// Sequence number of the displayed artifact. Responses at or below it
    /// are stale.
    displayed_seq: Mutex<u64>,
}

/// Re-renders the document after a quiet period and keeps the latest
/// artifact on display.
///
/// Every render request gets an increasing sequence number and a response is
/// only displayed if it is newer than what is already shown, so a slow
/// response can never overwrite a fresher preview. A failed render keeps the
/// last good artifact.
pub struct PreviewTrigger {
    inner: Arc<Inner>,
    store: Arc<DocumentStore>,
    task: JoinHandle<()>,
}

impl PreviewTrigger {
    /// Starts observing `store`. A document that is already loaded is
    /// rendered after the first quiet period.
    pub fn start(
        store: Arc<DocumentStore>,
        renderer: Arc<dyn RenderService>,
        quiet_period: Duration,
    ) -> Self {
        let (artifact, _) = watch::channel(None);
        let (loading, _) = watch::channel(0);
        let inner = Arc::new(Inner {
            renderer,
            artifact,
            loading,
            next_seq: AtomicU64::new(0),
            displayed_seq: Mutex::new(0),
        });
        let task = tokio::spawn(Inner::observe(
            inner.clone(),
            store.subscribe(),
            quiet_period,
        ));
        Self { inner, store, task }
    }

    pub fn artifact(&self) -> Option<Arc<Artifact>> {
        self.inner.artifact.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Artifact>>> {
        self.inner.artifact.subscribe()
    }

    /// True while at least one render request is outstanding.
    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow() > 0
    }

    /// Renders the current document immediately, bypassing the quiet period.
    ///
    /// The result goes through the same sequencing as debounced renders, and
    /// is returned even if a newer render has already been displayed.
    pub async fn render_now(&self) -> Result<Arc<Artifact>> {
        let document = self.store.document().ok_or(VitaeError::NoDocument)?;
        let seq = self.inner.next_seq();
        self.inner.render(seq, document).await
    }

    /// Stops observing the store. Outstanding renders still complete.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for PreviewTrigger {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Inner {
    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn observe(
        self: Arc<Self>,
        mut rx: watch::Receiver<DocumentSnapshot>,
        quiet_period: Duration,
    ) {
        let mut last_rendered: Option<Arc<Document>> = None;
        let mut dirty = rx.borrow_and_update().document.is_some();

        loop {
            if !dirty && rx.changed().await.is_err() {
                return;
            }
            dirty = false;

            // Quiet period: every further change restarts the wait.
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    _ = tokio::time::sleep(quiet_period) => break,
                }
            }

            let Some(document) = rx.borrow_and_update().document.clone() else {
                self.clear();
                last_rendered = None;
                continue;
            };
            let unchanged = last_rendered
                .as_ref()
                .is_some_and(|last| Arc::ptr_eq(last, &document) || **last == *document);
            if unchanged {
                tracing::trace!("[PreviewTrigger] Document unchanged since last render");
                continue;
            }
            last_rendered = Some(document.clone());

            let seq = self.next_seq();
            let inner = self.clone();
            tokio::spawn(async move {
                let _ = inner.render(seq, document).await;
            });
        }
    }

    async fn render(&self, seq: u64, document: Arc<Document>) -> Result<Arc<Artifact>> {
        self.loading.send_modify(|count| *count += 1);
        tracing::debug!("[PreviewTrigger] Render #{} for '{}'", seq, document.title);
        let result = self.renderer.render(&document).await;
        self.loading
            .send_modify(|count| *count = count.saturating_sub(1));

        match result {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                self.display(seq, artifact.clone());
                Ok(artifact)
            }
            Err(e) => {
                tracing::warn!(
                    "[PreviewTrigger] Render #{} failed, keeping last preview: {}",
                    seq,
                    e
                );
                Err(e)
            }
        }
    }

    fn display(&self, seq: u64, artifact: Arc<Artifact>) {
        let mut displayed = self
            .displayed_seq
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if seq <= *displayed {
            tracing::debug!(
                "[PreviewTrigger] Discarding stale render #{} (showing #{})",
                seq,
                *displayed
            );
            return;
        }
        *displayed = seq;
        self.artifact.send_replace(Some(artifact));
    }

    /// Drops the displayed artifact and invalidates every outstanding request.
    fn clear(&self) {
        let mut displayed = self
            .displayed_seq
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *displayed = self.next_seq.load(Ordering::Relaxed);
        self.artifact.send_replace(None);
    }
}
