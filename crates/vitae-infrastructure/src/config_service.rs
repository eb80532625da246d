//! Configuration service implementation.
//!
//! Loads [`VitaeConfig`] from `config.toml` under the config directory and
//! applies `VITAE_*` environment overrides on top.

use std::sync::{Arc, RwLock};

use vitae_core::config::VitaeConfig;
use vitae_core::error::{Result, VitaeError};

use crate::paths::VitaePaths;
use crate::storage::AtomicTomlFile;

pub const API_URL_ENV: &str = "VITAE_API_URL";
pub const RENDER_URL_ENV: &str = "VITAE_RENDER_URL";
pub const PERSIST_DEBOUNCE_ENV: &str = "VITAE_PERSIST_DEBOUNCE_MS";
pub const PREVIEW_DEBOUNCE_ENV: &str = "VITAE_PREVIEW_DEBOUNCE_MS";
pub const REQUEST_TIMEOUT_ENV: &str = "VITAE_REQUEST_TIMEOUT_SECS";

/// Loads and caches the client configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    file: Arc<AtomicTomlFile<VitaeConfig>>,
    config: Arc<RwLock<Option<VitaeConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &VitaePaths) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(paths.config_file())),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the configuration, loading it on first access.
    ///
    /// A missing file yields the defaults. A malformed file or override is an
    /// error rather than a silent fallback.
    pub fn get_config(&self) -> Result<VitaeConfig> {
        if let Some(cached) = self
            .config
            .read()
            .map_err(|_| VitaeError::internal("config cache poisoned"))?
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let mut config = self.file.load()?.unwrap_or_default();
        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        tracing::debug!(
            "[ConfigService] Loaded config from {:?}: api={}",
            self.file.path(),
            config.api_base_url
        );

        *self
            .config
            .write()
            .map_err(|_| VitaeError::internal("config cache poisoned"))? = Some(config.clone());
        Ok(config)
    }

    /// Writes `config` to `config.toml` and refreshes the cache.
    pub fn save_config(&self, config: &VitaeConfig) -> Result<()> {
        self.file.save(config)?;
        self.invalidate_cache();
        Ok(())
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut guard) = self.config.write() {
            *guard = None;
        }
    }
}

/// Applies `VITAE_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut VitaeConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(API_URL_ENV) {
        config.api_base_url = url;
    }
    if let Some(url) = lookup(RENDER_URL_ENV) {
        config.render_base_url = Some(url);
    }
    if let Some(ms) = lookup(PERSIST_DEBOUNCE_ENV) {
        config.persist_debounce_ms = parse_number(PERSIST_DEBOUNCE_ENV, &ms)?;
    }
    if let Some(ms) = lookup(PREVIEW_DEBOUNCE_ENV) {
        config.preview_debounce_ms = parse_number(PREVIEW_DEBOUNCE_ENV, &ms)?;
    }
    if let Some(secs) = lookup(REQUEST_TIMEOUT_ENV) {
        config.request_timeout_secs = parse_number(REQUEST_TIMEOUT_ENV, &secs)?;
    }
    Ok(())
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| VitaeError::config(format!("{} must be a whole number, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(&VitaePaths::at(temp_dir.path()));
        let mut expected = VitaeConfig::default();
        apply_env_overrides(&mut expected, |key| std::env::var(key).ok()).unwrap();
        assert_eq!(service.get_config().unwrap(), expected);
    }

    #[test]
    fn test_save_then_reload() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(&VitaePaths::at(temp_dir.path()));
        let config = VitaeConfig {
            persist_debounce_ms: 250,
            ..VitaeConfig::default()
        };

        service.save_config(&config).unwrap();

        let reopened = ConfigService::new(&VitaePaths::at(temp_dir.path()));
        let file = reopened.file.load().unwrap().unwrap();
        assert_eq!(file.persist_debounce_ms, 250);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (API_URL_ENV, "https://cv.example.com/api"),
            (PREVIEW_DEBOUNCE_ENV, "300"),
            (REQUEST_TIMEOUT_ENV, ""),
        ]);
        let mut config = VitaeConfig::default();

        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_base_url, "https://cv.example.com/api");
        assert_eq!(config.preview_debounce_ms, 300);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let mut config = VitaeConfig::default();
        let err = apply_env_overrides(&mut config, |key| {
            (key == PERSIST_DEBOUNCE_ENV).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, VitaeError::Config(_)));
    }
}
