//! Remote document store trait.

use async_trait::async_trait;

use super::model::Document;
use super::patch::DocumentPatch;
use crate::collection::DocumentSummary;
use crate::error::Result;

/// Remote persistence for résumé documents.
///
/// Implementations route every request through the identity gate, so an
/// unauthenticated caller gets `VitaeError::Unauthorized` without any network
/// traffic.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Lists the caller's documents as summaries.
    async fn list(&self) -> Result<Vec<DocumentSummary>>;

    /// Creates a document. The returned document carries the assigned id.
    async fn create(&self, document: &Document) -> Result<Document>;

    /// Fetches the full document.
    async fn get(&self, id: &str) -> Result<Document>;

    /// Applies a partial update and returns the updated document.
    async fn patch(&self, id: &str, patch: &DocumentPatch) -> Result<Document>;

    async fn delete(&self, id: &str) -> Result<()>;
}
