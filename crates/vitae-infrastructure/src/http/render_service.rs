//! Rendering service over HTTP.

use std::sync::Arc;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use vitae_core::auth::{CredentialPolicy, IdentityGate};
use vitae_core::document::Document;
use vitae_core::error::{Result, VitaeError};
use vitae_core::render::{Artifact, PDF_CONTENT_TYPE, RenderService};

use super::endpoint;

/// Posts a full document to `/render` and returns the binary artifact.
///
/// The credential is attached when present but not required.
#[derive(Clone)]
pub struct HttpRenderService {
    client: Client,
    base_url: String,
    gate: Arc<IdentityGate>,
}

impl HttpRenderService {
    pub fn new(client: Client, base_url: impl Into<String>, gate: Arc<IdentityGate>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            gate,
        }
    }
}

#[async_trait::async_trait]
impl RenderService for HttpRenderService {
    async fn render(&self, document: &Document) -> Result<Artifact> {
        let request = self
            .client
            .post(endpoint(&self.base_url, "/render"))
            .json(document);

        let response = self
            .gate
            .send(request, CredentialPolicy::Optional)
            .await
            .map_err(|e| match e {
                VitaeError::Remote { status, message } => {
                    VitaeError::Render(format!("renderer returned {}: {}", status, message))
                }
                other => other,
            })?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(PDF_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        tracing::debug!(
            "[HttpRenderService] Rendered '{}' ({} bytes, {})",
            document.title,
            bytes.len(),
            content_type
        );
        Ok(Artifact {
            bytes,
            content_type,
        })
    }
}
