//! Integration tests for Error types
//!
//! Tests error construction, display, context, and categories.

use sylva_foundation::{Error, ErrorCategory, ErrorContext, ErrorKind, SemanticLimit, Type};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch(Type::Int, Type::String);
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("int"));
    assert!(msg.contains("string"));
}

#[test]
fn error_undefined_function() {
    let err = Error::undefined_function("frobnicate");
    assert!(matches!(err.kind, ErrorKind::UndefinedFunction(_)));
    assert!(format!("{err}").contains("frobnicate"));
}

#[test]
fn error_arity_mismatch() {
    let err = Error::arity_mismatch("eq", "2".to_string(), 3);
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("eq"));
    assert!(msg.contains('2'));
    assert!(msg.contains('3'));
}

#[test]
fn error_unresolved_reference_names_the_production() {
    let err = Error::unresolved_reference("item");
    assert_eq!(format!("{err}"), "unresolved reference: @item");
}

#[test]
fn error_recursion_names_the_production() {
    let err = Error::recursion("loop");
    assert!(matches!(err.kind, ErrorKind::Recursion { ref production } if production == "loop"));
}

#[test]
fn error_limit_exceeded() {
    let err = Error::limit_exceeded(SemanticLimit::MaxDepth { limit: 8 });
    assert_eq!(format!("{err}"), "limit exceeded: max depth (8) exceeded");
}

// =============================================================================
// Categories
// =============================================================================

#[test]
fn every_constructor_has_a_category() {
    let cases = [
        (Error::type_mismatch(Type::Bool, Type::Int), ErrorCategory::Compose),
        (Error::undefined_function("f"), ErrorCategory::Compose),
        (Error::unresolved_reference("p"), ErrorCategory::Compose),
        (Error::variable_mismatch(Type::Int, Type::String), ErrorCategory::Eval),
        (Error::eval("boom"), ErrorCategory::Eval),
        (Error::unsupported("$ref"), ErrorCategory::Unsupported),
        (Error::recursion("p"), ErrorCategory::Recursion),
        (Error::malformed_stream("exit"), ErrorCategory::Stream),
        (
            Error::limit_exceeded(SemanticLimit::MaxPatterns { limit: 1 }),
            ErrorCategory::Limit,
        ),
        (Error::internal("bug"), ErrorCategory::Internal),
    ];
    for (err, category) in cases {
        assert_eq!(err.category(), category, "{err}");
    }
}

// =============================================================================
// Context
// =============================================================================

#[test]
fn frames_accumulate_innermost_first() {
    let err = Error::eval("boom")
        .with_frame("leaf eq($int, 1)")
        .with_frame("production main");
    let context = err.context.unwrap();
    assert_eq!(context.stack, vec!["leaf eq($int, 1)", "production main"]);
}

#[test]
fn context_display_includes_position_and_frames() {
    let context = ErrorContext::new()
        .with_source("grammar")
        .with_position(3, 7)
        .with_frame("production main");
    let text = format!("{context}");
    assert!(text.starts_with("at grammar:3:7"));
    assert!(text.contains("in production main"));
}
