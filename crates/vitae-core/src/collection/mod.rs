//! Document collection domain types.

mod model;

pub use model::{ActionKind, ActionTarget, DocumentSummary};
