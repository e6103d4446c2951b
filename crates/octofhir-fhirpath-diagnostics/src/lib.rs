//! FHIRPath value model diagnostics and error handling
//!
//! This crate provides the error infrastructure shared by the value model crates:
//! structured error codes, the error type and the crate-wide `Result` alias.
//!
//! Three outcomes are kept apart throughout the workspace:
//! - *no result* is a normal `Ok(None)` return,
//! - a usage error is an `Err(FhirPathError)`,
//! - a programming-contract violation is a panic.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for FHIRPath value operations
pub type Result<T> = std::result::Result<T, FhirPathError>;
