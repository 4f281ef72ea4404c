//! Integration tests for Layer 1: Language
//!
//! Tests for the lexer, parser, pretty printer, and predicate compiler.

mod lexer;
mod parser;
mod predicates;
