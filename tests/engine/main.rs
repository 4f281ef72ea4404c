//! Integration tests for Layer 2: Engine
//!
//! Tests for the matcher, the interpreter, and the recursion check.

mod laws;
mod scenarios;
mod suite;
