//! Request gating on the current session identity.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::sync::watch;

use super::model::{Credential, SessionIdentity, UserDescriptor};
use super::repository::CredentialRepository;
use crate::error::{Result, VitaeError};

/// Whether a request may go out without a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPolicy {
    /// Fail fast with `Unauthorized` when signed out.
    Required,
    /// Attach the credential when present.
    Optional,
}

/// Holds the session credential and routes outbound requests through it.
///
/// An authorization failure on any response is a hard cutover: the credential
/// is dropped immediately, and every later authenticated call fails in
/// [`IdentityGate::require_credential`] without reaching the network. There is
/// no retry and no token refresh.
pub struct IdentityGate {
    identity: watch::Sender<SessionIdentity>,
    repository: Arc<dyn CredentialRepository>,
}

impl IdentityGate {
    /// Creates a gate that starts signed out.
    pub fn new(repository: Arc<dyn CredentialRepository>) -> Self {
        let (identity, _) = watch::channel(SessionIdentity::anonymous());
        Self {
            identity,
            repository,
        }
    }

    /// Creates a gate initialised from the persisted identity.
    pub async fn restore(repository: Arc<dyn CredentialRepository>) -> Result<Self> {
        let persisted = repository.load().await?.normalized();
        tracing::debug!(
            "[IdentityGate] Restored identity, authenticated={}",
            persisted.is_authenticated
        );
        let (identity, _) = watch::channel(persisted);
        Ok(Self {
            identity,
            repository,
        })
    }

    pub fn current_credential(&self) -> Option<Credential> {
        self.identity.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.borrow().is_authenticated
    }

    pub fn user(&self) -> Option<UserDescriptor> {
        self.identity.borrow().user.clone()
    }

    pub fn identity(&self) -> SessionIdentity {
        self.identity.borrow().clone()
    }

    /// Subscribes to sign-in / sign-out transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionIdentity> {
        self.identity.subscribe()
    }

    /// Returns the credential or fails fast with `Unauthorized`.
    pub fn require_credential(&self) -> Result<Credential> {
        self.current_credential()
            .ok_or_else(|| VitaeError::unauthorized("not signed in"))
    }

    /// Adds the bearer credential to `request` when one is present.
    pub fn attach(&self, request: RequestBuilder) -> RequestBuilder {
        with_bearer(request, self.current_credential().as_ref())
    }

    /// Attaches the credential per `policy`, sends `request` and checks the
    /// response.
    ///
    /// A 401 ends the session only if it still holds the credential the
    /// request was sent with. Any other non-success status becomes a
    /// `Remote` error carrying the server's detail message.
    pub async fn send(&self, request: RequestBuilder, policy: CredentialPolicy) -> Result<Response> {
        let credential = match policy {
            CredentialPolicy::Required => Some(self.require_credential()?),
            CredentialPolicy::Optional => self.current_credential(),
        };
        let response = with_bearer(request, credential.as_ref()).send().await?;
        self.check(response, credential.as_ref()).await
    }

    async fn check(&self, response: Response, sent_with: Option<&Credential>) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                "[IdentityGate] {} rejected the credential",
                response.url().path()
            );
            if let Some(credential) = sent_with {
                self.invalidate(credential).await;
            }
            return Err(VitaeError::unauthorized("server rejected the credential"));
        }
        if !status.is_success() {
            return Err(remote_error(response).await);
        }
        Ok(response)
    }

    /// Establishes a signed-in session and persists it.
    pub async fn login(&self, token: impl Into<String>, email: impl Into<String>) -> Result<()> {
        let user = UserDescriptor {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
        };
        let identity = SessionIdentity::authenticated(Credential::new(token), user);
        self.repository.save(&identity).await?;
        tracing::info!(
            "[IdentityGate] Signed in as {}",
            identity.user.as_ref().map(|u| u.email.as_str()).unwrap_or("")
        );
        self.identity.send_replace(identity);
        Ok(())
    }

    /// Ends the session and removes the persisted credential.
    pub async fn logout(&self) -> Result<()> {
        self.identity.send_replace(SessionIdentity::anonymous());
        self.repository.clear().await?;
        tracing::info!("[IdentityGate] Signed out");
        Ok(())
    }

    /// Drops the credential after an authorization failure.
    ///
    /// The in-memory identity is cleared before the durable copy, so callers
    /// observe the signed-out state even if persisting it fails.
    pub async fn on_unauthorized(&self) {
        self.identity.send_if_modified(|identity| {
            if identity.token.is_none() {
                return false;
            }
            *identity = SessionIdentity::anonymous();
            true
        });
        self.clear_persisted().await;
    }

    /// Ends the session if it still holds `credential`. Returns whether it
    /// did; a rejection of an older token leaves a newer sign-in alone.
    pub async fn invalidate(&self, credential: &Credential) -> bool {
        let cleared = self.identity.send_if_modified(|identity| {
            if identity.token.as_ref() != Some(credential) {
                return false;
            }
            *identity = SessionIdentity::anonymous();
            true
        });
        if cleared {
            tracing::warn!("[IdentityGate] Credential rejected, session ended");
            self.clear_persisted().await;
        } else {
            tracing::debug!("[IdentityGate] Ignoring rejection of a superseded credential");
        }
        cleared
    }

    async fn clear_persisted(&self) {
        if let Err(e) = self.repository.clear().await {
            tracing::error!("[IdentityGate] Failed to clear persisted credential: {}", e);
        }
    }
}

fn with_bearer(request: RequestBuilder, credential: Option<&Credential>) -> RequestBuilder {
    match credential {
        Some(credential) => request.bearer_auth(credential.expose()),
        None => request,
    }
}

/// Converts a non-success response into a `Remote` error.
///
/// Uses the `detail` field of a JSON error body when present, the raw body
/// otherwise, and the status reason for empty bodies.
pub async fn remote_error(response: Response) -> VitaeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    VitaeError::remote(status.as_u16(), error_detail(status, &body))
}

fn error_detail(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());
    match detail {
        Some(serde_json::Value::String(s)) => return s,
        Some(other) => return other.to_string(),
        None => {}
    }
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}
