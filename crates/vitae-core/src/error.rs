//! Error types for the Vitae editing engine.

use thiserror::Error;

/// A shared error type for the entire Vitae workspace.
///
/// Variants follow the error taxonomy of the editing session: transport and
/// validation failures from the remote store, authorization failures that end
/// the session, malformed user input caught locally, and rendering failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VitaeError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// The remote service answered with a non-success status
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The request never produced a response (connect, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No credential, or the server rejected the credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User-supplied input that cannot be applied (rejected before any request)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another action on the same collection item is still running
    #[error("Action already in flight for {target}")]
    ActionInFlight { target: String },

    /// No document is resident in the document store
    #[error("No document loaded")]
    NoDocument,

    /// Rendering service failure
    #[error("Render error: {0}")]
    Render(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VitaeError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Remote error from an HTTP status and body text
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a JSON serialization error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error (local or a remote 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Remote { status: 404, .. })
    }

    /// Check if this error ends the authenticated session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Remote { status: 401, .. })
    }

    /// Check if this error was raised before any network call on bad input
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a transport or remote-status failure
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::Transport(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for VitaeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for VitaeError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

impl From<toml::de::Error> for VitaeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for VitaeError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for VitaeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::json(err.to_string());
        }
        match err.status() {
            Some(status) => Self::remote(status.as_u16(), err.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}

/// A type alias for `Result<T, VitaeError>`.
pub type Result<T> = std::result::Result<T, VitaeError>;
