//! Application layer: the editing-session engine.
//!
//! - [`dispatcher::PersistenceDispatcher`]: debounced, per-document writes
//! - [`preview::PreviewTrigger`]: debounced, sequenced rendering
//! - [`collection::CollectionManager`]: document list and per-item actions
//! - [`context::EditingContext`]: wires the above around one `DocumentStore`

pub mod collection;
pub mod context;
pub mod dispatcher;
pub mod preview;

#[cfg(test)]
mod test_support;

pub use collection::CollectionManager;
pub use context::EditingContext;
pub use dispatcher::{PersistenceDispatcher, SyncEvent};
pub use preview::PreviewTrigger;
