//! End-to-end scenarios through the public API.

use std::sync::Arc;

use sylva_engine::{
    Interpreter, Matcher, MatcherConfig, Traced, TreeEvent, VecSource, has_recursion, interpret,
    prepare, validate,
};
use sylva_foundation::{Error, ErrorCategory, ErrorKind, Result, SemanticLimit, Type, Value};
use sylva_json::JsonSource;
use sylva_language::funcs::Function;
use sylva_language::{Context, Func, Registry, Signature, parse};

fn enter(name: &str) -> TreeEvent {
    TreeEvent::EnterTree(Value::from(name))
}

// =============================================================================
// Scenario A: a single typed field
// =============================================================================

#[test]
fn typed_field() {
    let grammar = parse("a::$int").unwrap();
    let mut matcher = prepare(&grammar).unwrap();

    assert!(validate(&mut matcher, &mut JsonSource::new(r#"{"a":5}"#)).unwrap());
    assert!(!validate(&mut matcher, &mut JsonSource::new(r#"{"a":"x"}"#)).unwrap());
    assert!(interpret(&grammar, &mut JsonSource::new(r#"{"a":5}"#)).unwrap());
    assert!(!interpret(&grammar, &mut JsonSource::new(r#"{"a":"x"}"#)).unwrap());
}

#[test]
fn typed_field_from_events() {
    let grammar = parse("a::$int").unwrap();
    let mut matcher = prepare(&grammar).unwrap();
    let events = vec![enter("a"), TreeEvent::Leaf(Value::Int(5)), TreeEvent::ExitTree];
    assert!(matcher.validate(&mut VecSource::new(events)).unwrap());
}

// =============================================================================
// Scenario D: unguarded recursion
// =============================================================================

#[test]
fn left_recursion_is_refused() {
    let grammar = parse("#main = @list\n#list = (@list, a: *)?").unwrap();
    assert!(has_recursion(&grammar));

    let err = prepare(&grammar).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Recursion);
    let err = interpret(&grammar, &mut VecSource::new(vec![])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Recursion { .. }));
}

#[test]
fn guarded_recursion_runs() {
    let grammar = parse("#main = @list\n#list = (<empty> | [head :: $int, tail: @list])").unwrap();
    assert!(!has_recursion(&grammar));
    let mut matcher = prepare(&grammar).unwrap();
    let doc = r#"{"head": 1, "tail": {"head": 2, "tail": {}}}"#;
    assert!(validate(&mut matcher, &mut JsonSource::new(doc)).unwrap());
    let doc = r#"{"head": 1, "tail": {"head": "two", "tail": {}}}"#;
    assert!(!validate(&mut matcher, &mut JsonSource::new(doc)).unwrap());
}

// =============================================================================
// Walks
// =============================================================================

#[test]
fn walks_report_acceptance_as_events_arrive() {
    let grammar = parse("[a: *, (b: *)?]").unwrap();
    let mut matcher = prepare(&grammar).unwrap();
    let mut walk = matcher.start();
    assert!(!walk.is_accepting());
    walk.feed(enter("a")).unwrap();
    assert_eq!(walk.depth(), 1);
    walk.feed(TreeEvent::ExitTree).unwrap();
    assert!(walk.is_accepting());
    walk.feed(enter("b")).unwrap();
    walk.feed(TreeEvent::ExitTree).unwrap();
    assert!(walk.is_accepting());
    walk.feed(TreeEvent::EndOfStream).unwrap();
    assert!(walk.finish().unwrap());
}

#[test]
fn traced_sources_forward_events() {
    let grammar = parse("(_ :: $string)*").unwrap();
    let mut matcher = prepare(&grammar).unwrap();
    let mut source = Traced::new(JsonSource::new(r#"["x", "y"]"#));
    assert!(matcher.validate(&mut source).unwrap());
}

#[test]
fn malformed_json_is_a_parse_error() {
    let grammar = parse("*").unwrap();
    let mut matcher = prepare(&grammar).unwrap();
    let err = validate(&mut matcher, &mut JsonSource::new(r#"{"a": }"#)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn depth_limits() {
    let grammar = parse("*").unwrap();
    let config = MatcherConfig::default().with_max_depth(2);
    let mut matcher = Matcher::with_config(&grammar, &Registry::standard(), config).unwrap();
    assert!(validate(&mut matcher, &mut JsonSource::new(r#"{"a": {"b": 1}}"#)).unwrap());
    let err = validate(&mut matcher, &mut JsonSource::new(r#"{"a": {"b": {"c": 1}}}"#))
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxDepth { limit: 2 })
    ));
}

#[test]
fn pattern_limits() {
    let grammar = parse("{a: *; b: *; c: *; d: *}").unwrap();
    let config = MatcherConfig::default().with_max_patterns(4);
    let err = Matcher::with_config(&grammar, &Registry::standard(), config).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Limit);
}

// =============================================================================
// Host functions and context
// =============================================================================

#[derive(Debug)]
struct Threshold;

impl Function for Threshold {
    fn name(&self) -> &str {
        "threshold"
    }

    fn output(&self) -> Type {
        Type::Int
    }

    fn params(&self) -> &[Func] {
        &[]
    }

    fn has_variable(&self) -> bool {
        true
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        ctx.external()
            .cloned()
            .ok_or_else(|| Error::eval("no threshold set"))
    }
}

#[allow(clippy::unnecessary_wraps)]
fn threshold(_: Vec<Func>) -> Result<Func> {
    Ok(Arc::new(Threshold))
}

#[test]
fn context_values_reach_host_functions() {
    let mut registry = Registry::standard();
    registry.register(Signature::new("threshold", &[], Type::Int, threshold));
    let grammar = parse("(_: -> ge($int, threshold()))*").unwrap();

    let mut matcher =
        Matcher::with_config(&grammar, &registry, MatcherConfig::default()).unwrap();
    matcher.set_context(Value::Int(3));
    assert!(validate(&mut matcher, &mut JsonSource::new("[3, 4]")).unwrap());
    assert!(!validate(&mut matcher, &mut JsonSource::new("[2, 4]")).unwrap());

    let mut interp = Interpreter::with_registry(&grammar, &registry).unwrap();
    interp.set_context(Value::Int(4));
    assert!(!interp.validate(&mut JsonSource::new("[3, 4]")).unwrap());

    matcher.clear_context();
    let err = validate(&mut matcher, &mut JsonSource::new("[5]")).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Eval);
}
