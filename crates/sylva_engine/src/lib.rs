//! Tree matching for Sylva.
//!
//! This crate provides:
//! - [`Matcher`] / [`Walk`] - Memoized derivative matching over tree events
//! - [`Interpreter`] - An unmemoized evaluator with the same semantics
//! - [`arena`] - Hash-consed patterns shared by every derivative
//! - [`recursion`] - Refusal of productions that loop without consuming input
//! - [`EventSource`] - The pull interface for streamed trees

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod event;
pub mod interp;
pub mod matcher;
pub mod recursion;

pub use arena::{Arena, Node, PatternId, PredId};
pub use config::MatcherConfig;
pub use event::{EventSource, Traced, TreeEvent, VecSource};
pub use interp::Interpreter;
pub use matcher::{Matcher, StateId, Walk};
pub use recursion::{find_recursion, has_recursion};

use sylva_foundation::Result;
use sylva_language::Grammar;

/// Prepares a memoized matcher for `grammar` with the standard registry.
///
/// # Errors
/// Returns `Recursion`, `UnresolvedReference`, or a compose error.
pub fn prepare(grammar: &Grammar) -> Result<Matcher> {
    Matcher::new(grammar)
}

/// Runs `matcher` over every event of `source`.
///
/// # Errors
/// Returns a source error, a leaf evaluation error, or `MalformedStream`.
pub fn validate<S: EventSource + ?Sized>(matcher: &mut Matcher, source: &mut S) -> Result<bool> {
    matcher.validate(source)
}

/// Validates `source` against `grammar` without memoization.
///
/// # Errors
/// Returns a preparation error or any validation error.
pub fn interpret<S: EventSource + ?Sized>(grammar: &Grammar, source: &mut S) -> Result<bool> {
    Interpreter::new(grammar)?.validate(source)
}
