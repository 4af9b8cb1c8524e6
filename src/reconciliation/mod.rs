//! Reconciliation of the supplier roster against the internal references

pub mod core;
pub mod inputs;
pub mod join;

pub use self::core::*;
pub use inputs::*;
pub use join::*;
