//! Tree-grammar language for Sylva.
//!
//! This crate provides:
//! - [`ast`] - The immutable pattern and expression data model
//! - [`Lexer`] / [`Parser`] - Grammar text to AST, with [`pretty`] printing it back
//! - [`Registry`] / [`Composer`] - Typed function signatures and expression compilation
//! - [`funcs`] - The compiled predicate library evaluated against a [`Context`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod compose;
pub mod context;
pub mod funcs;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod registry;
pub mod span;
pub mod token;

pub use ast::{
    BuiltInSymbol, DeclId, Expr, Grammar, NameExpr, Pattern, PatternDecl, Terminal,
};
pub use compose::{Composer, compose, compose_predicate};
pub use context::Context;
pub use funcs::{Func, Function};
pub use lexer::Lexer;
pub use parser::{Parser, parse, parse_expr, parse_pattern};
pub use registry::{Constructor, Param, Registry, Signature};
pub use span::Span;
pub use token::{Token, TokenKind};
