//! File-backed session identity storage.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use vitae_core::auth::{CredentialRepository, SessionIdentity};
use vitae_core::error::{Result, VitaeError};

use crate::paths::VitaePaths;
use crate::storage::AtomicTomlFile;

/// Persists the session identity to `auth-storage.toml`.
///
/// The last loaded or saved identity is cached so repeated loads do not touch
/// the file system. File I/O runs on the blocking pool.
#[derive(Clone)]
pub struct FileCredentialRepository {
    file: Arc<AtomicTomlFile<SessionIdentity>>,
    cache: Arc<Mutex<Option<SessionIdentity>>>,
}

impl FileCredentialRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_paths(paths: &VitaePaths) -> Self {
        Self::new(paths.auth_storage_file())
    }

    async fn run_blocking<R, F>(&self, op: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicTomlFile<SessionIdentity>) -> Result<R> + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || op(&file))
            .await
            .map_err(|e| VitaeError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[async_trait::async_trait]
impl CredentialRepository for FileCredentialRepository {
    async fn load(&self) -> Result<SessionIdentity> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }

        let loaded = self
            .run_blocking(|file| Ok(file.load()?))
            .await?
            .unwrap_or_default()
            .normalized();
        tracing::debug!(
            "[CredentialRepository] Loaded identity from {:?}, authenticated={}",
            self.file.path(),
            loaded.is_authenticated
        );
        *cache = Some(loaded.clone());
        Ok(loaded)
    }

    async fn save(&self, identity: &SessionIdentity) -> Result<()> {
        let mut cache = self.cache.lock().await;
        let to_save = identity.clone().normalized();
        let written = to_save.clone();
        self.run_blocking(move |file| Ok(file.save(&written)?))
            .await?;
        *cache = Some(to_save);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut cache = self.cache.lock().await;
        *cache = Some(SessionIdentity::anonymous());
        self.run_blocking(|file| Ok(file.remove()?)).await
    }
}
