//! Integration tests for predicate composition and evaluation
//!
//! Tests the standard registry through composed predicates.

use sylva_foundation::{ErrorCategory, ErrorKind, Value};
use sylva_language::funcs::eval_predicate;
use sylva_language::{Context, Registry, compose_predicate, parse_expr};

fn eval(text: &str, current: impl Into<Value>) -> sylva_foundation::Result<bool> {
    let f = compose_predicate(&Registry::standard(), &parse_expr(text)?)?;
    let mut ctx = Context::new();
    ctx.set_current(current.into());
    eval_predicate(f.as_ref(), &ctx)
}

#[test]
fn comparisons() {
    assert!(eval("le($int, 3)", 3i64).unwrap());
    assert!(!eval("lt($int, 3)", 3i64).unwrap());
    assert!(eval("ge($double, 0.5)", 0.5).unwrap());
    assert!(eval("ne($string, \"a\")", "b").unwrap());
}

#[test]
fn strings() {
    assert!(eval("hasPrefix(toLower($string), \"ab\")", "ABC").unwrap());
    assert!(eval("regex(\"^[a-z]+$\", $string)", "abc").unwrap());
    assert!(!eval("regex(\"^[a-z]+$\", $string)", "ab1").unwrap());
    assert!(eval("eq(length($string), 3)", "héé").unwrap());
}

#[test]
fn schema_helpers() {
    assert!(eval("multipleOf(number(), 0.5)", 1.5).unwrap());
    assert!(eval("multipleOf(number(), 2.0)", 4i64).unwrap());
    assert!(eval("type(integer())", 4i64).unwrap());
    assert!(!eval("type(integer())", 4.0).unwrap());
    assert!(eval("maxLength($string, 2)", "ab").unwrap());
    assert!(!eval("minLength($string, 3)", "ab").unwrap());
}

#[test]
fn lists() {
    assert!(eval("contains($int, []int{1, 2, 3})", 2i64).unwrap());
    assert!(!eval("contains($int, []int{1, 2, 3})", 4i64).unwrap());
    assert!(eval("eq(elem([]string{\"a\", \"b\"}, 1), $string)", "b").unwrap());
    let err = eval("eq(elem([]int{1}, 5), $int)", 1i64).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfBounds { .. }));
}

#[test]
fn logic_short_circuits() {
    // The right side would fail on a string.
    assert!(!eval("and(type($int), eq($int, 1))", "x").unwrap());
    assert!(eval("or(not(type($int)), eq($int, 1))", "x").unwrap());
}

#[test]
fn reading_the_wrong_type_is_an_eval_error() {
    let err = eval("eq($int, 1)", "x").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Eval);
    assert!(matches!(err.kind, ErrorKind::VariableMismatch { .. }));
}

#[test]
fn compose_errors() {
    let err = eval("eq($int, \"x\")", 1i64).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Compose);
    let err = eval("regex(\"(\", $string)", "x").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Compose);
    let err = eval("multipleOf(number(), 0.0)", 1i64).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Compose);
}
