//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_persist_debounce_ms() -> u64 {
    1000
}

fn default_preview_debounce_ms() -> u64 {
    1500
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Root configuration loaded from `config.toml`.
///
/// Every field has a default, so an empty or partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitaeConfig {
    /// Base URL of the document, auth and tailoring API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Base URL of the rendering service; falls back to `api_base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_base_url: Option<String>,
    /// Quiet period before buffered section edits are written.
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,
    /// Quiet period before the preview is re-rendered.
    #[serde(default = "default_preview_debounce_ms")]
    pub preview_debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for VitaeConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            render_base_url: None,
            persist_debounce_ms: default_persist_debounce_ms(),
            preview_debounce_ms: default_preview_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl VitaeConfig {
    pub fn render_base_url(&self) -> &str {
        self.render_base_url
            .as_deref()
            .unwrap_or(&self.api_base_url)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
