//! Property tests: the two engines agree, and the pattern algebra holds.

use proptest::prelude::*;

use sylva_engine::{Interpreter, Matcher, TreeEvent, VecSource};
use sylva_foundation::Value;
use sylva_language::{Expr, Grammar, NameExpr, Pattern, parse_expr};

// =============================================================================
// Generators
// =============================================================================

#[derive(Clone, Debug)]
enum Node {
    Leaf(Value),
    Tree(&'static str, Vec<Node>),
}

fn node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        (-3i64..4).prop_map(|n| Node::Leaf(Value::Int(n))),
        "[ab]{0,2}".prop_map(|s| Node::Leaf(Value::from(s))),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        (
            prop::sample::select(vec!["a", "b"]),
            prop::collection::vec(inner, 0..3),
        )
            .prop_map(|(name, children)| Node::Tree(name, children))
    })
}

fn forest() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(node(), 0..3)
}

fn push_events(nodes: &[Node], out: &mut Vec<TreeEvent>) {
    for node in nodes {
        match node {
            Node::Leaf(value) => out.push(TreeEvent::Leaf(value.clone())),
            Node::Tree(name, children) => {
                out.push(TreeEvent::EnterTree(Value::from(*name)));
                push_events(children, out);
                out.push(TreeEvent::ExitTree);
            }
        }
    }
}

fn events(nodes: &[Node]) -> Vec<TreeEvent> {
    let mut out = Vec::new();
    push_events(nodes, &mut out);
    out
}

/// Leaf predicates that never fail, whatever the leaf holds.
fn leaf_expr() -> impl Strategy<Value = Expr> {
    prop::sample::select(vec![
        "type($int)",
        "type($string)",
        "and(type($int), gt($int, 0))",
        "or(not(type($string)), hasPrefix($string, \"a\"))",
    ])
    .prop_map(|text| parse_expr(text).unwrap())
}

fn name_expr() -> impl Strategy<Value = NameExpr> {
    prop_oneof![
        Just(NameExpr::name("a")),
        Just(NameExpr::name("b")),
        Just(NameExpr::AnyName),
        Just(NameExpr::except(NameExpr::name("a"))),
    ]
}

fn pattern() -> impl Strategy<Value = Pattern> {
    let base = prop_oneof![
        Just(Pattern::Empty),
        Just(Pattern::ZAny),
        leaf_expr().prop_map(Pattern::leaf),
    ];
    base.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (name_expr(), inner.clone()).prop_map(|(n, p)| Pattern::tree(n, p)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Pattern::concat(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Pattern::or(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Pattern::and(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Pattern::interleave(l, r)),
            inner.clone().prop_map(Pattern::zero_or_more),
            inner.clone().prop_map(Pattern::optional),
            inner.clone().prop_map(Pattern::not),
            inner.prop_map(Pattern::contains),
        ]
    })
}

fn matches(pattern: &Pattern, nodes: &[Node]) -> bool {
    let mut matcher = Matcher::new(&Grammar::new(pattern.clone())).unwrap();
    matcher.validate(&mut VecSource::new(events(nodes))).unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn matcher_agrees_with_interpreter(p in pattern(), trees in forest()) {
        let grammar = Grammar::new(p);
        let mut matcher = Matcher::new(&grammar).unwrap();
        let interp = Interpreter::new(&grammar).unwrap();
        let memoized = matcher.validate(&mut VecSource::new(events(&trees))).unwrap();
        let direct = interp.validate(&mut VecSource::new(events(&trees))).unwrap();
        prop_assert_eq!(memoized, direct, "{}", grammar);
    }

    #[test]
    fn union_is_disjunction(p in pattern(), q in pattern(), trees in forest()) {
        let either = matches(&Pattern::or(p.clone(), q.clone()), &trees);
        prop_assert_eq!(either, matches(&p, &trees) || matches(&q, &trees));
    }

    #[test]
    fn intersection_is_conjunction(p in pattern(), q in pattern(), trees in forest()) {
        let both = matches(&Pattern::and(p.clone(), q.clone()), &trees);
        prop_assert_eq!(both, matches(&p, &trees) && matches(&q, &trees));
    }

    #[test]
    fn complement_is_negation(p in pattern(), trees in forest()) {
        prop_assert_eq!(matches(&Pattern::not(p.clone()), &trees), !matches(&p, &trees));
    }

    #[test]
    fn interleave_commutes(p in pattern(), q in pattern(), trees in forest()) {
        let pq = matches(&Pattern::interleave(p.clone(), q.clone()), &trees);
        let qp = matches(&Pattern::interleave(q, p), &trees);
        prop_assert_eq!(pq, qp);
    }

    #[test]
    fn intersection_is_idempotent(p in pattern(), trees in forest()) {
        prop_assert_eq!(matches(&Pattern::and(p.clone(), p.clone()), &trees), matches(&p, &trees));
    }

    #[test]
    fn a_pattern_or_its_complement_accepts_everything(p in pattern(), trees in forest()) {
        prop_assert!(matches(&Pattern::or(p.clone(), Pattern::not(p)), &trees));
    }

    #[test]
    fn double_complement_is_identity(p in pattern(), trees in forest()) {
        let twice = Pattern::not(Pattern::not(p.clone()));
        prop_assert_eq!(matches(&twice, &trees), matches(&p, &trees));
    }

    #[test]
    fn walks_agree_with_whole_validation_on_every_prefix(p in pattern(), trees in forest()) {
        let mut matcher = Matcher::new(&Grammar::new(p.clone())).unwrap();
        for cut in 0..=trees.len() {
            let prefix = &trees[..cut];
            let mut walk = matcher.start();
            for event in events(prefix) {
                walk.feed(event).unwrap();
            }
            let incremental = walk.is_accepting();
            prop_assert_eq!(incremental, matches(&p, prefix));
        }
    }

    #[test]
    fn a_reused_matcher_gives_the_same_answers(p in pattern(), first in forest(), second in forest()) {
        let mut matcher = Matcher::new(&Grammar::new(p.clone())).unwrap();
        matcher.validate(&mut VecSource::new(events(&first))).unwrap();
        let warm = matcher.validate(&mut VecSource::new(events(&second))).unwrap();
        prop_assert_eq!(warm, matches(&p, &second));
    }
}
