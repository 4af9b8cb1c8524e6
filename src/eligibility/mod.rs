//! Billing eligibility: the rule engine and its versioned rule sets

pub mod engine;
pub mod ruleset;

pub use engine::*;
pub use ruleset::*;
