//! Rendering service boundary.

mod service;

pub use service::{Artifact, PDF_CONTENT_TYPE, RenderService};
