//! The authoritative in-memory document for an editing session.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::model::{Document, DocumentId};
use super::section::{SectionKey, SectionValue};
use crate::error::{Result, VitaeError};

/// A versioned view of the resident document.
///
/// `version` increases on every load, unload and mutation, so observers can
/// tell whether what they last saw is still current.
#[derive(Debug, Clone, Default)]
pub struct DocumentSnapshot {
    pub version: u64,
    pub document: Option<Arc<Document>>,
}

/// Saving indicator state.
///
/// `epoch` changes whenever a new document is loaded so that completions of
/// writes dispatched for a previous session cannot touch the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveState {
    pub epoch: u64,
    pub in_flight: usize,
}

impl SaveState {
    pub fn is_saving(&self) -> bool {
        self.in_flight > 0
    }
}

/// Proof that a write was dispatched; hand it back to `finish_save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a save ticket must be returned through DocumentStore::finish_save"]
pub struct SaveTicket {
    epoch: u64,
}

/// Result of an applied section update.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionUpdate {
    pub document_id: Option<DocumentId>,
    pub key: SectionKey,
    /// Full post-merge section value in wire form.
    pub value: Value,
    pub version: u64,
}

/// Holds at most one document per session and applies section updates
/// optimistically.
///
/// Every mutation is applied synchronously and becomes visible to readers
/// and subscribers before the call returns. Nothing here talks to the
/// network, and nothing is ever rolled back.
pub struct DocumentStore {
    snapshot: watch::Sender<DocumentSnapshot>,
    saving: watch::Sender<SaveState>,
}

impl DocumentStore {
    /// Creates an empty store with no resident document.
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(DocumentSnapshot::default());
        let (saving, _) = watch::channel(SaveState::default());
        Self { snapshot, saving }
    }

    /// Replaces the resident document and clears the saving indicator.
    pub fn load(&self, document: Document) {
        tracing::debug!(
            "[DocumentStore] Loading document id={:?} title={}",
            document.id,
            document.title
        );
        self.snapshot.send_modify(|snap| {
            snap.version += 1;
            snap.document = Some(Arc::new(document));
        });
        self.reset_saving();
    }

    /// Drops the resident document (session end or navigation away).
    pub fn unload(&self) {
        self.snapshot.send_if_modified(|snap| {
            if snap.document.is_none() {
                return false;
            }
            snap.version += 1;
            snap.document = None;
            true
        });
        self.reset_saving();
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.borrow().document.is_some()
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.snapshot
            .borrow()
            .document
            .as_ref()
            .and_then(|doc| doc.id.clone())
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.snapshot.borrow().document.clone()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.borrow().version
    }

    /// Subscribes to document changes.
    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.snapshot.subscribe()
    }

    /// Returns a copy of one section of the resident document.
    pub fn read_section(&self, key: SectionKey) -> Result<SectionValue> {
        self.snapshot
            .borrow()
            .document
            .as_ref()
            .map(|doc| doc.section(key))
            .ok_or(VitaeError::NoDocument)
    }

    /// Applies a raw section update.
    ///
    /// Basics is shallow-merged over the existing record; sequence sections
    /// and the metadata record are replaced. Input that does not fit the
    /// section's schema is rejected without mutating anything.
    pub fn update_section(&self, key: SectionKey, value: Value) -> Result<SectionUpdate> {
        let mut outcome = Err(VitaeError::NoDocument);
        self.snapshot.send_if_modified(|snap| {
            let Some(current) = snap.document.as_mut() else {
                return false;
            };
            let applied = current
                .resolve_section(key, value)
                .and_then(|resolved| resolved.to_json().map(|wire| (resolved, wire)));
            let (resolved, wire) = match applied {
                Ok(pair) => pair,
                Err(e) => {
                    outcome = Err(e);
                    return false;
                }
            };
            let document = Arc::make_mut(current);
            document.set_section(resolved);
            snap.version += 1;
            outcome = Ok(SectionUpdate {
                document_id: document.id.clone(),
                key,
                value: wire,
                version: snap.version,
            });
            true
        });
        if let Err(e) = &outcome {
            tracing::debug!("[DocumentStore] Rejected update of '{}': {}", key, e);
        }
        outcome
    }

    /// Applies an already typed section value (no merge).
    pub fn replace_section(&self, value: SectionValue) -> Result<SectionUpdate> {
        let key = value.key();
        let wire = value.to_json()?;
        let mut outcome = Err(VitaeError::NoDocument);
        self.snapshot.send_if_modified(|snap| {
            let Some(current) = snap.document.as_mut() else {
                return false;
            };
            let document = Arc::make_mut(current);
            document.set_section(value);
            snap.version += 1;
            outcome = Ok(SectionUpdate {
                document_id: document.id.clone(),
                key,
                value: wire,
                version: snap.version,
            });
            true
        });
        outcome
    }

    /// Renames the resident document. Returns its id, if it has one.
    pub fn set_title(&self, title: impl Into<String>) -> Result<Option<DocumentId>> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(VitaeError::invalid_input("title must not be empty"));
        }
        let mut outcome = Err(VitaeError::NoDocument);
        self.snapshot.send_if_modified(|snap| {
            let Some(current) = snap.document.as_mut() else {
                return false;
            };
            let document = Arc::make_mut(current);
            document.title = title;
            snap.version += 1;
            outcome = Ok(document.id.clone());
            true
        });
        outcome
    }

    // ============================================================================
    // Saving indicator
    // ============================================================================

    /// True while at least one write for the resident document is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.borrow().is_saving()
    }

    pub fn subscribe_saving(&self) -> watch::Receiver<SaveState> {
        self.saving.subscribe()
    }

    /// Marks a write for `document_id` as dispatched.
    ///
    /// Returns `None` when `document_id` is not the resident document; such
    /// writes do not affect the indicator.
    pub fn begin_save(&self, document_id: &str) -> Option<SaveTicket> {
        if self.document_id().as_deref() != Some(document_id) {
            return None;
        }
        let mut ticket = None;
        self.saving.send_modify(|state| {
            state.in_flight += 1;
            ticket = Some(SaveTicket { epoch: state.epoch });
        });
        ticket
    }

    /// Marks a dispatched write as completed, successfully or not.
    pub fn finish_save(&self, ticket: SaveTicket) {
        self.saving.send_if_modified(|state| {
            if state.epoch != ticket.epoch || state.in_flight == 0 {
                return false;
            }
            state.in_flight -= 1;
            true
        });
    }

    fn reset_saving(&self) {
        self.saving.send_modify(|state| {
            state.epoch += 1;
            state.in_flight = 0;
        });
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
