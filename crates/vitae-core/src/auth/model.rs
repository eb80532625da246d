//! Session identity domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed storage key the session identity is persisted under.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// An opaque bearer token.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(***{} chars)", self.0.len())
    }
}

/// Minimal description of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescriptor {
    pub id: String,
    pub email: String,
}

/// Session identity that persists across restarts.
///
/// # File Location
///
/// - Linux: `~/.config/vitae/auth-storage.toml`
/// - macOS: `~/Library/Application Support/vitae/auth-storage.toml`
/// - Windows: `%APPDATA%\vitae\auth-storage.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Credential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDescriptor>,
    /// Persisted for compatibility; always derived from `token` in memory.
    #[serde(default)]
    pub is_authenticated: bool,
}

impl SessionIdentity {
    /// The signed-out identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: Credential, user: UserDescriptor) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
            is_authenticated: true,
        }
    }

    /// Re-derives the authenticated flag from credential presence.
    pub fn normalized(mut self) -> Self {
        self.is_authenticated = self.token.is_some();
        if self.token.is_none() {
            self.user = None;
        }
        self
    }
}
