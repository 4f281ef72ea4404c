//! Grammar conformance cases run through both engines.
//!
//! Each case pairs a grammar with JSON documents and the outcome both the
//! memoized matcher and the interpreter must report.

use sylva_engine::{Interpreter, Matcher};
use sylva_foundation::{ErrorCategory, Result};
use sylva_json::JsonSource;
use sylva_language::parse;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Expect {
    Accept,
    Reject,
    Fail(ErrorCategory),
}

use Expect::{Accept, Fail, Reject};

struct Case {
    grammar: &'static str,
    documents: &'static [(&'static str, Expect)],
}

const CASES: &[Case] = &[
    Case {
        grammar: "a::$int",
        documents: &[
            (r#"{"a": 5}"#, Accept),
            (r#"{"a": "x"}"#, Reject),
            ("{}", Reject),
            (r#"{"a": 5, "b": 1}"#, Reject),
        ],
    },
    Case {
        grammar: "[a: *, *]",
        documents: &[
            (r#"{"a": 1, "b": 2}"#, Accept),
            (r#"{"b": 2, "a": 1}"#, Reject),
            (r#"{"a": {"deep": [1, 2]}}"#, Accept),
        ],
    },
    Case {
        grammar: "{a: *; b: *}",
        documents: &[
            (r#"{"a": 1, "b": 2}"#, Accept),
            (r#"{"b": 2, "a": 1}"#, Accept),
            (r#"{"a": 1}"#, Reject),
        ],
    },
    Case {
        grammar: "{id >= 0; (label :: $string)?}",
        documents: &[
            (r#"{"id": 3}"#, Accept),
            (r#"{"label": "x", "id": 0}"#, Accept),
            (r#"{"id": -1}"#, Reject),
            (r#"{"label": "x"}"#, Reject),
        ],
    },
    Case {
        grammar: "(_ :: $string)*",
        documents: &[
            (r#"["x", "y"]"#, Accept),
            (r#"["x", 1]"#, Reject),
            ("[]", Accept),
            ("{}", Accept),
        ],
    },
    Case {
        grammar: "[0 == 1, 1: *]",
        documents: &[
            (r#"[1, "x"]"#, Accept),
            (r#"[2, "x"]"#, Reject),
            ("[1]", Reject),
        ],
    },
    Case {
        grammar: ".(_ == 3)",
        documents: &[
            ("[1, 2, 3]", Accept),
            ("[3]", Accept),
            ("[1, 2]", Reject),
        ],
    },
    Case {
        grammar: "!(a: *)",
        documents: &[
            (r#"{"a": 1}"#, Reject),
            (r#"{"b": 1}"#, Accept),
            ("{}", Accept),
        ],
    },
    Case {
        grammar: "(!(secret): *)*",
        documents: &[
            (r#"{"a": 1, "b": 2}"#, Accept),
            (r#"{"a": 1, "secret": 2}"#, Reject),
        ],
    },
    Case {
        grammar: "({a: *; b: *} & [a: *, b: *])",
        documents: &[
            (r#"{"a": 1, "b": 2}"#, Accept),
            (r#"{"b": 1, "a": 2}"#, Reject),
        ],
    },
    Case {
        grammar: "(a: * | b :: $bool)",
        documents: &[
            (r#"{"a": null}"#, Accept),
            (r#"{"b": true}"#, Accept),
            (r#"{"b": 1}"#, Reject),
        ],
    },
    Case {
        grammar: r#"s ~= "^[0-9]+$""#,
        documents: &[(r#"{"s": "123"}"#, Accept), (r#"{"s": "12a"}"#, Reject)],
    },
    Case {
        grammar: "-> and(type($double), gt($double, 0.5))",
        documents: &[("0.75", Accept), ("0.25", Reject), ("1", Reject)],
    },
    Case {
        grammar: "[*, last: *]",
        documents: &[
            (r#"{"x": 1, "y": 2, "last": 3}"#, Accept),
            (r#"{"last": 3, "x": 1}"#, Reject),
        ],
    },
    Case {
        grammar: "#main = @list\n#list = (<empty> | [value :: $int, next: @list])",
        documents: &[
            (r#"{"value": 1, "next": {"value": 2, "next": {}}}"#, Accept),
            (r#"{"value": 1, "next": {"value": "x", "next": {}}}"#, Reject),
            ("{}", Accept),
        ],
    },
    Case {
        grammar: "== 5",
        documents: &[
            ("5", Accept),
            ("6", Reject),
            (r#""five""#, Fail(ErrorCategory::Eval)),
            ("[5", Fail(ErrorCategory::Parse)),
        ],
    },
];

fn outcome(result: Result<bool>) -> Expect {
    match result {
        Ok(true) => Accept,
        Ok(false) => Reject,
        Err(err) => Fail(err.category()),
    }
}

#[test]
fn matcher_conformance() {
    for case in CASES {
        let grammar = parse(case.grammar).unwrap();
        let mut matcher = Matcher::new(&grammar).unwrap();
        for &(document, expected) in case.documents {
            let got = outcome(matcher.validate(&mut JsonSource::new(document)));
            assert_eq!(got, expected, "{} on {document}", case.grammar);
        }
    }
}

#[test]
fn interpreter_conformance() {
    for case in CASES {
        let grammar = parse(case.grammar).unwrap();
        let interp = Interpreter::new(&grammar).unwrap();
        for &(document, expected) in case.documents {
            let got = outcome(interp.validate(&mut JsonSource::new(document)));
            assert_eq!(got, expected, "{} on {document}", case.grammar);
        }
    }
}

#[test]
fn reused_matchers_match_fresh_ones() {
    for case in CASES {
        let grammar = parse(case.grammar).unwrap();
        let mut warm = Matcher::new(&grammar).unwrap();
        for &(document, _) in case.documents {
            let _ = warm.validate(&mut JsonSource::new(document));
        }
        for &(document, expected) in case.documents.iter().rev() {
            let got = outcome(warm.validate(&mut JsonSource::new(document)));
            assert_eq!(got, expected, "{} on {document}", case.grammar);
        }
    }
}
