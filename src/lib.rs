//! Sylva - Tree-grammar validation
//!
//! This crate re-exports all layers of the Sylva system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: sylva_json        JSON event source, JSON-Schema translation
//! Layer 2: sylva_engine      Derivative matcher, interpreter, recursion check
//! Layer 1: sylva_language    Grammar syntax, function registry, predicates
//! Layer 0: sylva_foundation  Core types (Value, Type, Error)
//! ```

pub use sylva_engine as engine;
pub use sylva_foundation as foundation;
pub use sylva_json as json;
pub use sylva_language as language;

pub use sylva_engine::{
    EventSource, Interpreter, Matcher, MatcherConfig, TreeEvent, VecSource, has_recursion,
    interpret, prepare, validate,
};
pub use sylva_foundation::{Error, Result, Type, Value};
pub use sylva_json::{JsonSource, Schema, parse_schema, translate};
pub use sylva_language::{Grammar, parse};
