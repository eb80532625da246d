//! Document domain module.
//!
//! # Module Structure
//!
//! - `model`: Résumé document and its records (`Document`, `Basics`, ...)
//! - `section`: Section keys and typed section values
//! - `patch`: Partial-update payload for the remote store
//! - `repository`: Remote document store trait
//! - `store`: The in-memory `DocumentStore` for an editing session

mod model;
mod patch;
mod repository;
mod section;
mod store;

pub use model::{
    Basics, COPY_TITLE_SUFFIX, CustomCss, Document, DocumentId, EducationEntry, Location, Profile,
    ProjectEntry, RenderMetadata, SkillEntry, Theme, WorkEntry,
};
pub use patch::DocumentPatch;
pub use repository::DocumentRepository;
pub use section::{SectionKey, SectionValue};
pub use store::{DocumentSnapshot, DocumentStore, SaveState, SaveTicket, SectionUpdate};
