//! The user's document collection and per-item action state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use vitae_core::collection::{ActionKind, ActionTarget, DocumentSummary};
use vitae_core::document::{Basics, Document, DocumentRepository};
use vitae_core::error::{Result, VitaeError};

/// Title given to documents created without one.
pub const DEFAULT_TITLE: &str = "Untitled Resume";

/// Lists, creates, deletes and duplicates documents.
///
/// Independent of any open document: summaries are refreshed from the remote
/// store and never track edits made in an editing session.
pub struct CollectionManager {
    repository: Arc<dyn DocumentRepository>,
    summaries: RwLock<Vec<DocumentSummary>>,
    actions: Mutex<HashMap<ActionTarget, ActionKind>>,
}

/// Holds an action marker; dropping it clears the marker.
struct ActionGuard<'a> {
    actions: &'a Mutex<HashMap<ActionTarget, ActionKind>>,
    target: ActionTarget,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        lock(self.actions).remove(&self.target);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CollectionManager {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            repository,
            summaries: RwLock::new(Vec::new()),
            actions: Mutex::new(HashMap::new()),
        }
    }

    /// The last fetched summaries, without a network call.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.summaries
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Refreshes the summaries from the remote store.
    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let summaries = self.repository.list().await?;
        tracing::debug!("[CollectionManager] Refreshed {} documents", summaries.len());
        self.replace(summaries.clone());
        Ok(summaries)
    }

    /// Creates a document with placeholder basics.
    pub async fn create(&self, title: Option<&str>) -> Result<DocumentSummary> {
        let _guard = self.begin(ActionTarget::Create, ActionKind::Create)?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);

        let created = self
            .repository
            .create(&Document::new(title, Basics::placeholder()))
            .await?;
        let summary = self.append(&created)?;
        tracing::info!("[CollectionManager] Created '{}' ({})", summary.title, summary.id);
        Ok(summary)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.begin(ActionTarget::Item(id.to_string()), ActionKind::Delete)?;
        self.repository.delete(id).await?;
        self.write_summaries().retain(|s| s.id != id);
        tracing::info!("[CollectionManager] Deleted {}", id);
        Ok(())
    }

    /// Copies a document under the title "<title> (Copy)".
    ///
    /// Reads the full document and creates the copy in two separate requests;
    /// if the second fails nothing is created and nothing is cleaned up.
    pub async fn duplicate(&self, id: &str) -> Result<DocumentSummary> {
        let _guard = self.begin(ActionTarget::Item(id.to_string()), ActionKind::Duplicate)?;
        let original = self.repository.get(id).await?;
        let created = self.repository.create(&original.to_copy()).await?;
        let summary = self.append(&created)?;
        tracing::info!(
            "[CollectionManager] Duplicated {} as '{}' ({})",
            id,
            summary.title,
            summary.id
        );
        Ok(summary)
    }

    /// The action currently running against `target`, if any.
    pub fn action_in_flight(&self, target: &ActionTarget) -> Option<ActionKind> {
        lock(&self.actions).get(target).copied()
    }

    pub fn is_busy(&self) -> bool {
        !lock(&self.actions).is_empty()
    }

    fn begin(&self, target: ActionTarget, kind: ActionKind) -> Result<ActionGuard<'_>> {
        let mut actions = lock(&self.actions);
        if let Some(running) = actions.get(&target) {
            tracing::debug!(
                "[CollectionManager] Rejecting {:?} on {}: {:?} in flight",
                kind,
                target,
                running
            );
            return Err(VitaeError::ActionInFlight {
                target: target.to_string(),
            });
        }
        actions.insert(target.clone(), kind);
        Ok(ActionGuard {
            actions: &self.actions,
            target,
        })
    }

    fn append(&self, created: &Document) -> Result<DocumentSummary> {
        let summary = DocumentSummary::from_document(created)
            .ok_or_else(|| VitaeError::internal("remote store returned a document without an id"))?;
        self.write_summaries().push(summary.clone());
        Ok(summary)
    }

    fn replace(&self, summaries: Vec<DocumentSummary>) {
        *self.write_summaries() = summaries;
    }

    fn write_summaries(&self) -> std::sync::RwLockWriteGuard<'_, Vec<DocumentSummary>> {
        self.summaries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
