//! reqwest clients for the remote document store, renderer, auth and
//! tailoring endpoints.

mod auth_client;
mod document_repository;
mod render_service;
mod tailor_service;

pub use auth_client::{HttpAuthClient, TokenResponse};
pub use document_repository::HttpDocumentRepository;
pub use render_service::HttpRenderService;
pub use tailor_service::HttpTailorService;

use std::time::Duration;

use reqwest::Client;
use vitae_core::error::{Result, VitaeError};

/// Builds the shared HTTP client with the configured request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vitae/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| VitaeError::config(format!("Failed to build HTTP client: {}", e)))
}

/// Joins a base URL and an absolute path without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
