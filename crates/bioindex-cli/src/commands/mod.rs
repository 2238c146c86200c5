//! CLI command implementations.

pub mod analysis;
pub mod convert;
