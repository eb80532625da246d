//! Remote document store over HTTP.

use std::sync::Arc;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use vitae_core::auth::{CredentialPolicy, IdentityGate};
use vitae_core::collection::DocumentSummary;
use vitae_core::document::{Document, DocumentPatch, DocumentRepository};
use vitae_core::error::Result;

use super::endpoint;

/// `DocumentRepository` backed by the `/documents` REST resource.
///
/// Every call requires a credential from the gate; without one it fails
/// before any request is sent.
#[derive(Clone)]
pub struct HttpDocumentRepository {
    client: Client,
    base_url: String,
    gate: Arc<IdentityGate>,
}

impl HttpDocumentRepository {
    pub fn new(client: Client, base_url: impl Into<String>, gate: Arc<IdentityGate>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            gate,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, endpoint(&self.base_url, path))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        self.gate.send(request, CredentialPolicy::Required).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl DocumentRepository for HttpDocumentRepository {
    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let request = self.request(Method::GET, "/documents");
        let summaries: Vec<DocumentSummary> = self.send_json(request).await?;
        tracing::debug!("[HttpDocumentRepository] Listed {} documents", summaries.len());
        Ok(summaries)
    }

    async fn create(&self, document: &Document) -> Result<Document> {
        let request = self.request(Method::POST, "/documents").json(document);
        let created: Document = self.send_json(request).await?;
        tracing::info!(
            "[HttpDocumentRepository] Created document {:?} '{}'",
            created.id,
            created.title
        );
        Ok(created)
    }

    async fn get(&self, id: &str) -> Result<Document> {
        let request = self.request(Method::GET, &format!("/documents/{}", id));
        self.send_json(request).await
    }

    async fn patch(&self, id: &str, patch: &DocumentPatch) -> Result<Document> {
        tracing::debug!(
            "[HttpDocumentRepository] PATCH {} with {} field(s)",
            id,
            patch.len()
        );
        let request = self
            .request(Method::PATCH, &format!("/documents/{}", id))
            .json(patch);
        self.send_json(request).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &format!("/documents/{}", id));
        self.send(request).await?;
        tracing::info!("[HttpDocumentRepository] Deleted document {}", id);
        Ok(())
    }
}
