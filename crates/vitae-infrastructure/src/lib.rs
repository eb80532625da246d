//! Infrastructure layer: HTTP clients, file-backed session storage,
//! configuration loading and path resolution.

pub mod config_service;
pub mod credential_repository;
pub mod http;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use credential_repository::FileCredentialRepository;
pub use paths::VitaePaths;
