//! Session identity and request gating.

mod gate;
mod model;
mod repository;

pub use gate::{CredentialPolicy, IdentityGate, remote_error};
pub use model::{AUTH_STORAGE_KEY, Credential, SessionIdentity, UserDescriptor};
pub use repository::CredentialRepository;
