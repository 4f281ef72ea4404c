//! Integration tests for Layer 3: JSON
//!
//! Runs draft 4 fixtures in the JSON-Schema-Test-Suite layout through the
//! translator and both engines, plus the translation error surface.

use serde_json::Value as Json;
use sylva_engine::{Interpreter, Matcher};
use sylva_foundation::{ErrorCategory, ErrorKind};
use sylva_json::{JsonSource, parse_schema, prepare_schema, translate, validate_json};

const FIXTURES: &[(&str, &str)] = &[
    ("allOf", include_str!("draft4/allOf.json")),
    ("anyOf", include_str!("draft4/anyOf.json")),
    ("enum", include_str!("draft4/enum.json")),
    ("maxLength", include_str!("draft4/maxLength.json")),
    ("maximum", include_str!("draft4/maximum.json")),
    ("minLength", include_str!("draft4/minLength.json")),
    ("minimum", include_str!("draft4/minimum.json")),
    ("multipleOf", include_str!("draft4/multipleOf.json")),
    ("not", include_str!("draft4/not.json")),
    ("oneOf", include_str!("draft4/oneOf.json")),
    ("pattern", include_str!("draft4/pattern.json")),
    ("properties", include_str!("draft4/properties.json")),
    ("required", include_str!("draft4/required.json")),
    ("type", include_str!("draft4/type.json")),
];

/// Cases the translation is known to get wrong: arrays and objects both
/// stream as labelled children, so `type` cannot tell them apart.
const SKIPPED: &[&str] = &[
    "type: object type matches objects: an array is not an object",
    "type: array type matches arrays: an object is not an array",
];

fn run_fixture(file: &str, text: &str) {
    let groups: Vec<Json> = serde_json::from_str(text).unwrap();
    for group in &groups {
        let description = group["description"].as_str().unwrap_or_default();
        let schema = serde_json::to_vec(&group["schema"]).unwrap();
        let grammar = translate(&parse_schema(&schema).unwrap())
            .unwrap_or_else(|e| panic!("{file}: {description}: {e}"));
        let mut matcher = Matcher::new(&grammar).unwrap();
        let interp = Interpreter::new(&grammar).unwrap();

        for test in group["tests"].as_array().unwrap() {
            let data = serde_json::to_string(&test["data"]).unwrap();
            let valid = test["valid"].as_bool().unwrap();
            let case = format!(
                "{file}: {description}: {}",
                test["description"].as_str().unwrap_or_default()
            );
            if SKIPPED.contains(&case.as_str()) {
                continue;
            }
            let memoized = matcher.validate(&mut JsonSource::new(&data)).unwrap();
            assert_eq!(memoized, valid, "matcher, {case}\n{grammar}");
            let direct = interp.validate(&mut JsonSource::new(&data)).unwrap();
            assert_eq!(direct, valid, "interpreter, {case}\n{grammar}");
        }
    }
}

#[test]
fn draft4_fixtures() {
    for (file, text) in FIXTURES {
        run_fixture(file, text);
    }
}

#[test]
fn skipped_cases_exist() {
    for case in SKIPPED {
        let (file, rest) = case.split_once(": ").unwrap();
        let (_, text) = FIXTURES.iter().find(|(name, _)| *name == file).unwrap();
        let (group, test) = rest.split_once(": ").unwrap();
        assert!(text.contains(group) && text.contains(test), "{case}");
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn required_string_member() {
    let schema = br#"{"type":"object","properties":{"a":{"type":"string"}},"required":["a"]}"#;
    let mut matcher = prepare_schema(schema).unwrap();
    assert!(validate_json(&mut matcher, r#"{"a":"x"}"#).unwrap());
    assert!(!validate_json(&mut matcher, "{}").unwrap());
    assert!(!validate_json(&mut matcher, r#"{"a":1}"#).unwrap());
}

#[test]
fn multiple_of_two() {
    let mut matcher = prepare_schema(br#"{"type":"number","multipleOf":2}"#).unwrap();
    assert!(validate_json(&mut matcher, "4").unwrap());
    assert!(!validate_json(&mut matcher, "3").unwrap());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unsupported_keywords_are_reported() {
    for schema in [
        r##"{"$ref": "#/definitions/a"}"##,
        r#"{"items": {"type": "string"}}"#,
        r#"{"minProperties": 1}"#,
        r#"{"format": "email"}"#,
        r#"{"type": ["string", "null"], "pattern": "^a"}"#,
    ] {
        let err = prepare_schema(schema.as_bytes()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Unsupported(_)), "{schema}: {err}");
    }
}

#[test]
fn invalid_schemas_are_parse_errors() {
    let err = prepare_schema(br#"{"type": "integer",}"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
    let err = prepare_schema(br#"{"type": "float"}"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
}

#[test]
fn bad_keyword_values_fail_at_preparation() {
    let err = prepare_schema(br#"{"pattern": "("}"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Compose);
    let err = prepare_schema(br#"{"multipleOf": 0}"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Compose);
}

#[test]
fn malformed_instances_are_parse_errors() {
    let mut matcher = prepare_schema(b"{}").unwrap();
    let err = validate_json(&mut matcher, r#"{"a": [1, }"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
    assert!(err.to_string().contains("parse error at 1:"));
}
