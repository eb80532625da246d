//! Path management for Vitae configuration and session files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/vitae/             # Config directory (platform config dir + "vitae")
//! ├── config.toml              # Client configuration
//! ├── auth-storage.toml        # Persisted session identity
//! └── logs/                    # CLI logs
//!     └── vitae.log.YYYY-MM-DD
//! ```
//!
//! `VITAE_CONFIG_DIR` replaces the whole directory, which is what tests and
//! multi-profile setups use.

use std::path::{Path, PathBuf};

use vitae_core::auth::AUTH_STORAGE_KEY;
use vitae_core::error::VitaeError;

const APP_DIR_NAME: &str = "vitae";

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "VITAE_CONFIG_DIR";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find the platform config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for VitaeError {
    fn from(err: PathError) -> Self {
        VitaeError::config(err.to_string())
    }
}

/// Resolves every file location from one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitaePaths {
    root: PathBuf,
}

impl VitaePaths {
    /// Resolves the root from `base`, then `VITAE_CONFIG_DIR`, then the
    /// platform config directory.
    pub fn new(base: Option<&Path>) -> Result<Self, PathError> {
        if let Some(base) = base {
            return Ok(Self::at(base));
        }
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(dir));
        }
        let root = dirs::config_dir()
            .ok_or(PathError::ConfigDirNotFound)?
            .join(APP_DIR_NAME);
        Ok(Self { root })
    }

    /// Uses `root` as the config directory as-is.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// The session identity file, named after the fixed storage key.
    pub fn auth_storage_file(&self) -> PathBuf {
        self.root.join(format!("{}.toml", AUTH_STORAGE_KEY))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
