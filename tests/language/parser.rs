//! Integration tests for the parser
//!
//! Tests parsing grammar text to the AST and printing it back.

use sylva_foundation::{ErrorCategory, Type};
use sylva_language::{BuiltInSymbol, Expr, NameExpr, Pattern, parse, parse_pattern};

// =============================================================================
// Patterns
// =============================================================================

#[test]
fn parse_field_with_type_check() {
    let g = parse("name :: $string").unwrap();
    assert_eq!(
        g.top(),
        &Pattern::tree(
            NameExpr::name("name"),
            Pattern::leaf(Expr::builtin(BuiltInSymbol::Type, Expr::var(Type::String)))
        )
    );
}

#[test]
fn parse_interleave_and_optional() {
    let p = parse_pattern("{a: *; (b: *)?}").unwrap();
    let a = Pattern::tree(NameExpr::name("a"), Pattern::ZAny);
    let b = Pattern::tree(NameExpr::name("b"), Pattern::ZAny);
    assert_eq!(p, Pattern::interleave(a, Pattern::optional(b)));
}

#[test]
fn parse_numeric_names() {
    let p = parse_pattern("0: *").unwrap();
    assert_eq!(p, Pattern::tree(NameExpr::name(0i64), Pattern::ZAny));
}

#[test]
fn parse_multiple_productions() {
    let g = parse(
        "#main = (_: @item)*
         #item = {id >= 0; (label :: $string)?}",
    )
    .unwrap();
    assert_eq!(g.len(), 2);
    assert!(g.lookup("item").is_some());
    assert!(g.lookup("missing").is_none());
}

// =============================================================================
// Printing
// =============================================================================

#[test]
fn printed_grammars_parse_back() {
    for source in [
        "a :: $int",
        "[a: *, (b: * | c: *)]",
        "{a == 1; !(b: *)}",
        "(_: .x: *)*",
        "!((a|b)): -> and(type($int), gt($int, 0))",
        "#main = @x\n#x = (y: @x)?",
    ] {
        let first = parse(source).unwrap();
        let second = parse(&first.to_string()).unwrap();
        assert_eq!(first, second, "{source} printed as {first}");
    }
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn parse_errors_are_categorized() {
    for source in ["", "[a: *", "{}", "#a = *", "a: * b: *"] {
        let err = parse(source).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Parse, "{source}");
    }
}
