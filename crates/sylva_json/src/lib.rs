//! JSON support for Sylva.
//!
//! This crate provides:
//! - [`JsonSource`] - A pull tokenizer that streams JSON text as tree events
//! - [`Schema`] / [`parse_schema`] - The draft 4 JSON-Schema document model
//! - [`translate`] - Schema to tree grammar translation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod schema;
pub mod source;
pub mod translate;

pub use schema::{Additional, Dependency, Items, Schema, SimpleType, TypeSet, parse_schema};
pub use source::JsonSource;
pub use translate::translate;

use sylva_engine::Matcher;
use sylva_foundation::Result;

/// Parses and translates a schema, then prepares a matcher for it.
///
/// # Errors
/// Returns a parse error, an `Unsupported` keyword, or a preparation error.
pub fn prepare_schema(schema: &[u8]) -> Result<Matcher> {
    Matcher::new(&translate(&parse_schema(schema)?)?)
}

/// Validates the JSON document `text` with `matcher`.
///
/// # Errors
/// Returns a JSON parse error or a leaf evaluation error.
pub fn validate_json(matcher: &mut Matcher, text: &str) -> Result<bool> {
    matcher.validate(&mut JsonSource::new(text))
}
