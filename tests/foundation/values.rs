//! Integration tests for Value and Type
//!
//! Tests type reporting, name equality, ordering, and display.

use std::cmp::Ordering;

use sylva_foundation::{Type, Value};

// =============================================================================
// Types
// =============================================================================

#[test]
fn value_types() {
    assert_eq!(Value::Null.value_type(), Type::Unknown);
    assert_eq!(Value::from(1.5).value_type(), Type::Double);
    assert_eq!(Value::from(1_i64).value_type(), Type::Int);
    assert_eq!(Value::from(1_u64).value_type(), Type::Uint);
    assert_eq!(Value::from(true).value_type(), Type::Bool);
    assert_eq!(Value::from("x").value_type(), Type::String);
    assert_eq!(Value::bytes(vec![1_u8]).value_type(), Type::Bytes);
    assert_eq!(
        Value::list(vec![Value::from("a")]).value_type(),
        Type::StringList
    );
    assert_eq!(Value::list(vec![]).value_type(), Type::Unknown);
}

#[test]
fn type_codes_round_trip() {
    for ty in Type::SINGLES {
        assert_eq!(Type::from_code(ty.code()), Some(ty));
        let list = ty.list_of().unwrap();
        assert_eq!(list.code(), ty.code() + 100);
        assert_eq!(list.element(), Some(ty));
    }
    assert_eq!(Type::from_code(999), None);
}

#[test]
fn type_keywords_round_trip() {
    for ty in Type::SINGLES {
        assert_eq!(Type::from_keyword(ty.keyword()), Some(ty));
    }
    assert_eq!(Type::from_keyword("[][]byte"), Some(Type::BytesList));
    assert_eq!(Type::from_keyword("float"), None);
}

// =============================================================================
// Equality and Ordering
// =============================================================================

#[test]
fn name_equality_bridges_signed_and_unsigned() {
    assert!(Value::Int(0).name_eq(&Value::Uint(0)));
    assert!(Value::Uint(7).name_eq(&Value::Int(7)));
    assert!(!Value::Int(-1).name_eq(&Value::Uint(u64::MAX)));
    assert_ne!(Value::Int(0), Value::Uint(0));
}

#[test]
fn nan_is_equal_to_itself() {
    let nan = Value::from(f64::NAN);
    assert_eq!(nan, nan.clone());
}

#[test]
fn total_order_groups_by_variant() {
    assert_eq!(Value::Null.total_cmp(&Value::from(0.0)), Ordering::Less);
    assert_eq!(Value::from(2_i64).total_cmp(&Value::from(10_i64)), Ordering::Less);
    assert_eq!(Value::from("b").total_cmp(&Value::from("a")), Ordering::Greater);
    let short = Value::list(vec![Value::from(1_i64)]);
    let long = Value::list(vec![Value::from(1_i64), Value::from(0_i64)]);
    assert_eq!(short.total_cmp(&long), Ordering::Less);
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn display_matches_grammar_syntax() {
    assert_eq!(Value::from(1_i64).to_string(), "1");
    assert_eq!(Value::from(1_u64).to_string(), "uint(1)");
    assert_eq!(Value::from(1.0).to_string(), "1.0");
    assert_eq!(Value::from("a\"b").to_string(), "\"a\\\"b\"");
    assert_eq!(Value::bytes(vec![1_u8, 2]).to_string(), "[]byte{1, 2}");
    assert_eq!(Value::Null.to_string(), "null");
}
