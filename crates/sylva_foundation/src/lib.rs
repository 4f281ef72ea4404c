//! Scalar values, type descriptors, and errors for Sylva.
//!
//! This crate provides:
//! - [`Value`] - The scalar carried by tree labels and leaves
//! - [`Type`] - Type descriptors shared by expressions and signatures
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, ErrorCategory, ErrorContext, ErrorKind, SemanticLimit};
pub use types::Type;
pub use value::Value;

/// Result type alias using Sylva's error type.
pub type Result<T> = std::result::Result<T, Error>;
