//! Aggregation and summary rendering

pub mod document;
pub mod summary;

pub use document::*;
pub use summary::*;
