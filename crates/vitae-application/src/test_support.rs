//! In-memory test doubles for the remote document store and renderer.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use vitae_core::collection::DocumentSummary;
use vitae_core::document::{Basics, Document, DocumentPatch, DocumentRepository};
use vitae_core::error::{Result, VitaeError};
use vitae_core::render::{Artifact, RenderService};

/// Records every call. Optional latency and a one-shot failure.
#[derive(Default)]
pub struct MockDocumentRepository {
    pub documents: Mutex<HashMap<String, Document>>,
    pub patches: Mutex<Vec<(String, DocumentPatch)>>,
    pub calls: AtomicUsize,
    pub latency: Mutex<Duration>,
    pub fail_next: Mutex<Option<VitaeError>>,
    next_id: AtomicUsize,
}

impl MockDocumentRepository {
    pub fn with_document(id: &str, title: &str) -> Self {
        let repo = Self::default();
        let mut doc = Document::new(
            title,
            Basics {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..Basics::default()
            },
        );
        doc.id = Some(id.to_string());
        repo.documents.lock().unwrap().insert(id.to_string(), doc);
        repo
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn fail_next(&self, error: VitaeError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    pub fn patches(&self) -> Vec<(String, DocumentPatch)> {
        self.patches.lock().unwrap().clone()
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentRepository for MockDocumentRepository {
    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        self.enter().await?;
        let mut summaries: Vec<DocumentSummary> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter_map(DocumentSummary::from_document)
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    async fn create(&self, document: &Document) -> Result<Document> {
        self.enter().await?;
        let mut created = document.clone();
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        created.id = Some(id.clone());
        self.documents.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: &str) -> Result<Document> {
        self.enter().await?;
        self.documents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| VitaeError::not_found("Document", id))
    }

    async fn patch(&self, id: &str, patch: &DocumentPatch) -> Result<Document> {
        self.patches
            .lock()
            .unwrap()
            .push((id.to_string(), patch.clone()));
        self.enter().await?;
        self.documents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| VitaeError::not_found("Document", id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.enter().await?;
        self.documents.lock().unwrap().remove(id);
        Ok(())
    }
}

/// Renders the basics name into the artifact bytes.
///
/// Per-call latencies are consumed front to back; names starting with
/// "Broken" fail.
#[derive(Default)]
pub struct MockRenderService {
    pub rendered: Mutex<Vec<String>>,
    pub latencies: Mutex<Vec<Duration>>,
}

impl MockRenderService {
    pub fn with_latencies(latencies: Vec<Duration>) -> Self {
        Self {
            rendered: Mutex::new(Vec::new()),
            latencies: Mutex::new(latencies),
        }
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }
}

#[async_trait]
impl RenderService for MockRenderService {
    async fn render(&self, document: &Document) -> Result<Artifact> {
        let name = document.basics.name.clone();
        self.rendered.lock().unwrap().push(name.clone());
        let latency = {
            let mut latencies = self.latencies.lock().unwrap();
            if latencies.is_empty() {
                Duration::ZERO
            } else {
                latencies.remove(0)
            }
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if name.starts_with("Broken") {
            return Err(VitaeError::Render("pdflatex failed".to_string()));
        }
        Ok(Artifact::pdf(name.into_bytes()))
    }
}
