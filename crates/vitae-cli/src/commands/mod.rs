pub mod account;
pub mod documents;
pub mod preview;
