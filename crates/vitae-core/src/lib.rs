//! Domain layer of the Vitae résumé editor.
//!
//! Holds the document model, the in-memory [`document::DocumentStore`], the
//! [`auth::IdentityGate`] and the traits through which the application layer
//! reaches the remote document store, the renderer and the tailoring service.

pub mod auth;
pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod render;
pub mod tailor;

pub use error::VitaeError;
