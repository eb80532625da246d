use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use vitae_core::auth::{CredentialPolicy, IdentityGate};
use vitae_core::document::Document;
use vitae_core::error::Result;
use vitae_core::tailor::{TailorService, TailoredResume};

use super::endpoint;

#[derive(Serialize)]
struct TailorRequest<'a> {
    resume: &'a Document,
    job_description: &'a str,
}

/// Calls `POST /tailor`.
#[derive(Clone)]
pub struct HttpTailorService {
    client: Client,
    base_url: String,
    gate: Arc<IdentityGate>,
}

impl HttpTailorService {
    pub fn new(client: Client, base_url: impl Into<String>, gate: Arc<IdentityGate>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            gate,
        }
    }
}

#[async_trait::async_trait]
impl TailorService for HttpTailorService {
    async fn tailor(&self, document: &Document, job_description: &str) -> Result<TailoredResume> {
        tracing::info!(
            "[HttpTailorService] Tailoring '{}' for a {}-char job description",
            document.title,
            job_description.len()
        );
        let request = self
            .client
            .post(endpoint(&self.base_url, "/tailor"))
            .json(&TailorRequest {
                resume: document,
                job_description,
            });
        let response = self
            .gate
            .send(request, CredentialPolicy::Optional)
            .await?;
        Ok(response.json().await?)
    }
}
