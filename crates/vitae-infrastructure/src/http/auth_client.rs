//! Token acquisition and account registration.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use vitae_core::auth::remote_error;
use vitae_core::error::{Result, VitaeError};

use super::endpoint;

/// Body of a successful `POST /auth/token`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Talks to the unauthenticated `/auth` endpoints.
///
/// These calls do not go through the identity gate: a 401 here means bad
/// credentials, not an expired session.
#[derive(Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Exchanges a username and password for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(VitaeError::invalid_input("username and password are required"));
        }
        let response = self
            .client
            .post(endpoint(&self.base_url, "/auth/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let token: TokenResponse = response.json().await?;
        if !token.token_type.eq_ignore_ascii_case("bearer") {
            tracing::warn!(
                "[HttpAuthClient] Unexpected token type '{}', using it as bearer",
                token.token_type
            );
        }
        Ok(token)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(VitaeError::invalid_input("email and password are required"));
        }
        let response = self
            .client
            .post(endpoint(&self.base_url, "/auth/register"))
            .json(&RegisterRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        tracing::info!("[HttpAuthClient] Registered {}", email);
        Ok(())
    }
}
