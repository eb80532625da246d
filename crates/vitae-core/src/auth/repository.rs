//! Credential repository trait.

use async_trait::async_trait;

use super::model::SessionIdentity;
use crate::error::Result;

/// Durable storage for the session identity.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Loads the persisted identity, or the anonymous identity if none exists.
    async fn load(&self) -> Result<SessionIdentity>;

    /// Persists the identity, replacing whatever was stored.
    async fn save(&self, identity: &SessionIdentity) -> Result<()>;

    /// Removes any persisted identity.
    async fn clear(&self) -> Result<()>;
}
