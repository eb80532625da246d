//! Job-description tailoring service boundary.

mod model;

pub use model::{TailorService, TailoredResume};
