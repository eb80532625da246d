use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentId};

/// List projection of a document.
///
/// Built from the remote listing and never updated by edits to an open
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    /// Last-modified timestamp as reported by the remote store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl DocumentSummary {
    /// Projects a stored document. Returns `None` for unsaved documents.
    pub fn from_document(document: &Document) -> Option<Self> {
        Some(Self {
            id: document.id.clone()?,
            title: document.title.clone(),
            updated_at: document.updated_at.clone(),
        })
    }

    /// Parses `updated_at`, accepting RFC 3339 and offset-less ISO 8601.
    pub fn last_modified(&self) -> Option<NaiveDateTime> {
        let raw = self.updated_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

/// What a collection action is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionTarget {
    /// Sentinel for document creation, which has no id yet.
    Create,
    Item(DocumentId),
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTarget::Create => f.write_str("create"),
            ActionTarget::Item(id) => write!(f, "document '{}'", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Delete,
    Duplicate,
}
