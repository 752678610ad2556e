//! Configuration types
//!
//! Board-agnostic device configuration. Every section has defaults that
//! match the shipped firmware, so a partial config file is enough.

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::ConfigError;
