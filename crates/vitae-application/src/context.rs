//! Session-wide wiring and the editing-session use case.
//!
//! # Lifecycle
//!
//! 1. Build an [`EditingContext`] once at start-up ([`EditingContext::connect`]
//!    for the real services, [`EditingContext::new`] for injected ones).
//! 2. [`EditingContext::open`] loads a document and starts the live preview.
//! 3. Section edits go through [`EditingContext::update_section`]: applied to
//!    the store at once, persisted after the quiet period.
//! 4. [`EditingContext::close`] flushes buffered edits, stops the preview and
//!    unloads the document. [`EditingContext::logout`] also ends the session.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast;
use vitae_core::auth::IdentityGate;
use vitae_core::config::VitaeConfig;
use vitae_core::document::{
    Document, DocumentPatch, DocumentRepository, DocumentStore, SectionKey, SectionUpdate,
    SectionValue,
};
use vitae_core::error::{Result, VitaeError};
use vitae_core::render::{Artifact, RenderService};
use vitae_core::tailor::{TailorService, TailoredResume};
use vitae_infrastructure::http::{
    HttpAuthClient, HttpDocumentRepository, HttpRenderService, HttpTailorService, build_client,
};
use vitae_infrastructure::{ConfigService, FileCredentialRepository, VitaePaths};

use crate::collection::CollectionManager;
use crate::dispatcher::{PersistenceDispatcher, SyncEvent};
use crate::preview::PreviewTrigger;

/// Everything an editing session needs, built once.
pub struct EditingContext {
    config: VitaeConfig,
    gate: Arc<IdentityGate>,
    store: Arc<DocumentStore>,
    repository: Arc<dyn DocumentRepository>,
    renderer: Arc<dyn RenderService>,
    tailor: Arc<dyn TailorService>,
    dispatcher: PersistenceDispatcher,
    collection: CollectionManager,
    preview: Mutex<Option<Arc<PreviewTrigger>>>,
}

impl EditingContext {
    pub fn new(
        config: VitaeConfig,
        gate: Arc<IdentityGate>,
        repository: Arc<dyn DocumentRepository>,
        renderer: Arc<dyn RenderService>,
        tailor: Arc<dyn TailorService>,
    ) -> Self {
        let store = Arc::new(DocumentStore::new());
        let dispatcher =
            PersistenceDispatcher::new(repository.clone(), store.clone(), config.persist_debounce());
        let collection = CollectionManager::new(repository.clone());
        Self {
            config,
            gate,
            store,
            repository,
            renderer,
            tailor,
            dispatcher,
            collection,
            preview: Mutex::new(None),
        }
    }

    /// Loads configuration and the persisted identity from `paths` and wires
    /// the HTTP services. Also returns the auth client for sign-in flows.
    pub async fn connect(paths: &VitaePaths) -> Result<(Self, HttpAuthClient)> {
        let config = ConfigService::new(paths).get_config()?;
        let credentials = Arc::new(FileCredentialRepository::from_paths(paths));
        let gate = Arc::new(IdentityGate::restore(credentials).await?);
        let client = build_client(config.request_timeout())?;

        tracing::info!(
            "[EditingContext] API at {}, authenticated={}",
            config.api_base_url,
            gate.is_authenticated()
        );

        let repository = Arc::new(HttpDocumentRepository::new(
            client.clone(),
            config.api_base_url.clone(),
            gate.clone(),
        ));
        let renderer = Arc::new(HttpRenderService::new(
            client.clone(),
            config.render_base_url().to_string(),
            gate.clone(),
        ));
        let tailor = Arc::new(HttpTailorService::new(
            client.clone(),
            config.api_base_url.clone(),
            gate.clone(),
        ));
        let auth = HttpAuthClient::new(client, config.api_base_url.clone());

        Ok((Self::new(config, gate, repository, renderer, tailor), auth))
    }

    pub fn config(&self) -> &VitaeConfig {
        &self.config
    }

    pub fn gate(&self) -> &Arc<IdentityGate> {
        &self.gate
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &PersistenceDispatcher {
        &self.dispatcher
    }

    pub fn collection(&self) -> &CollectionManager {
        &self.collection
    }

    pub fn sync_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.dispatcher.subscribe()
    }

    /// The currently displayed preview, if any.
    pub fn preview(&self) -> Option<Arc<PreviewTrigger>> {
        self.preview
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // ============================================================================
    // Session lifecycle
    // ============================================================================

    /// Fetches a document, makes it the resident document and starts its
    /// preview. Any previously open document is closed first; a failed final
    /// save of that document is logged (and already published as
    /// `SyncEvent::SaveFailed`) but does not stop the switch.
    pub async fn open(&self, id: &str) -> Result<Arc<Document>> {
        if self.store.is_loaded() {
            if let Err(e) = self.close().await {
                tracing::warn!(
                    "[EditingContext] Final save of previous document failed: {}",
                    e
                );
            }
        }
        let document = self.repository.get(id).await?;
        self.store.load(document);

        let preview = PreviewTrigger::start(
            self.store.clone(),
            self.renderer.clone(),
            self.config.preview_debounce(),
        );
        self.set_preview(Some(Arc::new(preview)));

        tracing::info!("[EditingContext] Opened {}", id);
        self.store.document().ok_or(VitaeError::NoDocument)
    }

    /// Flushes buffered edits, then unloads the document.
    ///
    /// The document is unloaded even if the final write fails; that error is
    /// returned afterwards.
    pub async fn close(&self) -> Result<()> {
        let flushed = match self.store.document_id() {
            Some(id) => self.dispatcher.flush(&id).await.map(|_| ()),
            None => Ok(()),
        };
        self.dispatcher.wait_idle().await;

        if let Some(preview) = self.take_preview() {
            preview.stop();
        }
        self.store.unload();
        tracing::debug!("[EditingContext] Closed session");
        flushed
    }

    /// Ends the session: closes the document and drops the credential.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.close().await {
            tracing::warn!("[EditingContext] Unsaved edits lost on logout: {}", e);
        }
        self.gate.logout().await
    }

    // ============================================================================
    // Editing
    // ============================================================================

    pub fn read_section(&self, key: SectionKey) -> Result<SectionValue> {
        self.store.read_section(key)
    }

    /// Applies a section edit now and schedules it for persistence.
    pub fn update_section(&self, key: SectionKey, value: Value) -> Result<SectionUpdate> {
        let update = self.store.update_section(key, value)?;
        self.dispatcher.schedule(&update);
        Ok(update)
    }

    /// Parses raw JSON from a section editor and applies it.
    ///
    /// Malformed JSON is rejected before anything is mutated or sent.
    pub fn apply_raw_section(&self, key: SectionKey, raw: &str) -> Result<SectionUpdate> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| VitaeError::invalid_input(format!("invalid JSON for '{}': {}", key, e)))?;
        self.update_section(key, value)
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        let id = self.store.set_title(title)?;
        if let Some(id) = id {
            let mut patch = DocumentPatch::new();
            patch.set_title(title);
            self.dispatcher.schedule_patch(&id, patch);
        }
        Ok(())
    }

    // ============================================================================
    // Rendering and tailoring
    // ============================================================================

    /// Renders the current document immediately through the preview.
    pub async fn render(&self) -> Result<Arc<Artifact>> {
        let preview = self.preview().ok_or(VitaeError::NoDocument)?;
        preview.render_now().await
    }

    /// Asks the tailoring service to rewrite the open document.
    pub async fn tailor(&self, job_description: &str) -> Result<TailoredResume> {
        if job_description.trim().is_empty() {
            return Err(VitaeError::invalid_input("job description must not be empty"));
        }
        let document = self.store.document().ok_or(VitaeError::NoDocument)?;
        self.tailor.tailor(&document, job_description).await
    }

    /// Applies each section of a tailored résumé as a regular edit.
    pub fn apply_tailored(&self, tailored: TailoredResume) -> Result<Vec<SectionUpdate>> {
        tailored
            .into_sections()
            .into_iter()
            .map(|section| {
                let update = self.store.replace_section(section)?;
                self.dispatcher.schedule(&update);
                Ok(update)
            })
            .collect()
    }

    fn set_preview(&self, preview: Option<Arc<PreviewTrigger>>) {
        let previous = std::mem::replace(
            &mut *self
                .preview
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            preview,
        );
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    fn take_preview(&self) -> Option<Arc<PreviewTrigger>> {
        self.preview
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockDocumentRepository, MockRenderService};
    use serde_json::json;
    use std::time::Duration;
    use vitae_core::auth::{CredentialRepository, SessionIdentity};
    use vitae_core::document::Basics;

    #[derive(Default)]
    struct NullCredentials;

    #[async_trait::async_trait]
    impl CredentialRepository for NullCredentials {
        async fn load(&self) -> Result<SessionIdentity> {
            Ok(SessionIdentity::anonymous())
        }
        async fn save(&self, _identity: &SessionIdentity) -> Result<()> {
            Ok(())
        }
        async fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    struct EchoTailor;

    #[async_trait::async_trait]
    impl TailorService for EchoTailor {
        async fn tailor(&self, document: &Document, job: &str) -> Result<TailoredResume> {
            Ok(TailoredResume {
                basics: Basics {
                    label: Some(format!("Candidate for {}", job)),
                    ..document.basics.clone()
                },
                work: document.work.clone(),
                education: document.education.clone(),
                skills: document.skills.clone(),
                projects: document.projects.clone(),
                job_description: Some(job.to_string()),
            })
        }
    }

    fn context(repo: Arc<MockDocumentRepository>) -> (EditingContext, Arc<MockRenderService>) {
        let gate = Arc::new(IdentityGate::new(Arc::new(NullCredentials)));
        let renderer = Arc::new(MockRenderService::default());
        let context = EditingContext::new(
            VitaeConfig::default(),
            gate,
            repo,
            renderer.clone(),
            Arc::new(EchoTailor),
        );
        (context, renderer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_quick_edits_make_one_patch() {
        let repo = Arc::new(MockDocumentRepository::default());
        let (ctx, _renderer) = context(repo.clone());
        let created = ctx.collection().create(None).await.unwrap();
        ctx.open(&created.id).await.unwrap();

        ctx.update_section(SectionKey::Basics, json!({ "name": "Ada Lovelace" }))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        ctx.update_section(SectionKey::Basics, json!({ "name": "Ada Lovelace" }))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let patches = repo.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(
            patches[0].1.section(SectionKey::Basics).unwrap()["name"],
            "Ada Lovelace"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_json_is_rejected_locally() {
        let repo = Arc::new(MockDocumentRepository::with_document("r1", "CV"));
        let (ctx, _renderer) = context(repo.clone());
        ctx.open("r1").await.unwrap();
        let version = ctx.store().version();

        let err = ctx.apply_raw_section(SectionKey::Work, "[{ nope").unwrap_err();

        assert!(err.is_invalid_input());
        assert_eq!(ctx.store().version(), version);
        assert!(!ctx.dispatcher().has_pending("r1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_edits() {
        let repo = Arc::new(MockDocumentRepository::with_document("r1", "CV"));
        let (ctx, _renderer) = context(repo.clone());
        ctx.open("r1").await.unwrap();

        ctx.set_title("CV 2024").unwrap();
        ctx.apply_raw_section(SectionKey::Skills, r#"[{"name":"Rust"}]"#)
            .unwrap();
        ctx.close().await.unwrap();

        let patches = repo.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1.title.as_deref(), Some("CV 2024"));
        assert!(patches[0].1.section(SectionKey::Skills).is_some());
        assert!(!ctx.store().is_loaded());
        assert!(ctx.preview().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_uses_in_memory_document() {
        let repo = Arc::new(MockDocumentRepository::with_document("r1", "CV"));
        let (ctx, renderer) = context(repo.clone());
        assert_eq!(ctx.render().await.unwrap_err(), VitaeError::NoDocument);

        ctx.open("r1").await.unwrap();
        ctx.update_section(SectionKey::Basics, json!({ "name": "Grace" }))
            .unwrap();

        let artifact = ctx.render().await.unwrap();
        assert_eq!(artifact.bytes, b"Grace".to_vec());
        assert_eq!(renderer.render_count(), 1);
        assert!(repo.patches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_tailored_goes_through_persistence() {
        let repo = Arc::new(MockDocumentRepository::with_document("r1", "CV"));
        let (ctx, _renderer) = context(repo.clone());
        ctx.open("r1").await.unwrap();

        let tailored = ctx.tailor("Analyst").await.unwrap();
        let updates = ctx.apply_tailored(tailored).unwrap();

        assert_eq!(updates.len(), 5);
        assert_eq!(
            ctx.store().document().unwrap().basics.label.as_deref(),
            Some("Candidate for Analyst")
        );
        let pending = ctx.dispatcher().pending_patch("r1").unwrap();
        assert_eq!(pending.len(), 5);
        assert!(pending.section(SectionKey::Metadata).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_switches_documents() {
        let repo = Arc::new(MockDocumentRepository::with_document("r1", "CV"));
        let (ctx, _renderer) = context(repo.clone());
        let other = ctx.collection().create(Some("Other")).await.unwrap();

        ctx.open("r1").await.unwrap();
        ctx.update_section(SectionKey::Projects, json!([])).unwrap();
        let opened = ctx.open(&other.id).await.unwrap();

        assert_eq!(opened.title, "Other");
        assert_eq!(repo.patches()[0].0, "r1");
        assert_eq!(ctx.store().document_id(), Some(other.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_final_save_does_not_block_open() {
        let repo = Arc::new(MockDocumentRepository::with_document("r1", "CV"));
        let (ctx, _renderer) = context(repo.clone());
        let other = ctx.collection().create(Some("Other")).await.unwrap();
        let mut events = ctx.sync_events();

        ctx.open("r1").await.unwrap();
        ctx.update_section(SectionKey::Projects, json!([])).unwrap();
        repo.fail_next(VitaeError::remote(503, "store unavailable"));

        let opened = ctx.open(&other.id).await.unwrap();

        assert_eq!(opened.title, "Other");
        assert_eq!(ctx.store().document_id(), Some(other.id));
        assert!(ctx.preview().is_some());
        assert!(matches!(
            events.try_recv().unwrap(),
            SyncEvent::SaveFailed { document_id, .. } if document_id == "r1"
        ));
    }
}
