//! Shared components - common types and errors

pub mod types;
pub mod errors;
