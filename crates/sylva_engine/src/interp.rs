//! Reference interpreter.
//!
//! Recomputes nullability and derivatives on every event over a shared
//! term tree, with no memo tables and no hash-consing. Results agree with [`Matcher`] on every
//! grammar both accept, which makes this the baseline the engine is
//! tested against.
//!
//! [`Matcher`]: crate::Matcher

use std::sync::Arc;

use sylva_foundation::{Error, Result, Value};
use sylva_language::funcs::eval_predicate;
use sylva_language::{Composer, Context, Func, Grammar, NameExpr, Pattern, Registry};
use tracing::debug;

use crate::event::{EventSource, TreeEvent};
use crate::recursion;

#[derive(Debug)]
enum Term {
    Empty,
    ZAny,
    /// The empty language, `Not(ZAny)`.
    Fail,
    Tree(NameExpr, Arc<Term>),
    Leaf(Func),
    Concat(Arc<Term>, Arc<Term>),
    Or(Arc<Term>, Arc<Term>),
    And(Arc<Term>, Arc<Term>),
    Interleave(Arc<Term>, Arc<Term>),
    ZeroOrMore(Arc<Term>),
    Not(Arc<Term>),
    Ref(usize),
}

/// An unmemoized evaluator for a prepared grammar.
#[derive(Debug)]
pub struct Interpreter {
    productions: Vec<Arc<Term>>,
    empty: Arc<Term>,
    zany: Arc<Term>,
    fail: Arc<Term>,
    external: Option<Value>,
}

impl Interpreter {
    /// Prepares `grammar` against the standard registry.
    ///
    /// # Errors
    /// See [`Interpreter::with_registry`].
    pub fn new(grammar: &Grammar) -> Result<Self> {
        Self::with_registry(grammar, &Registry::standard())
    }

    /// Prepares `grammar`, composing leaf predicates against `registry`.
    ///
    /// # Errors
    /// Returns `Recursion` for unguarded recursive productions,
    /// `UnresolvedReference` for unknown references, or any compose error.
    pub fn with_registry(grammar: &Grammar, registry: &Registry) -> Result<Self> {
        recursion::check(grammar)?;
        let composer = Composer::new(registry);
        let mut interp = Self {
            productions: Vec::with_capacity(grammar.len()),
            empty: Arc::new(Term::Empty),
            zany: Arc::new(Term::ZAny),
            fail: Arc::new(Term::Fail),
            external: None,
        };
        for decl in grammar.decls() {
            let term = interp
                .lower(&decl.pattern, grammar, &composer)
                .map_err(|e| e.with_frame(format!("production {}", decl.name)))?;
            interp.productions.push(term);
        }
        debug!(productions = grammar.len(), "prepared interpreter");
        Ok(interp)
    }

    /// Sets the external value visible to host functions.
    pub fn set_context(&mut self, value: Value) {
        self.external = Some(value);
    }

    /// Validates a whole event stream.
    ///
    /// Open trees are kept on an explicit frame stack, so document depth
    /// is bounded by memory rather than the call stack.
    ///
    /// # Errors
    /// Returns any error from the source, a leaf evaluation error, or
    /// `MalformedStream` for unbalanced events.
    pub fn validate<S: EventSource + ?Sized>(&self, source: &mut S) -> Result<bool> {
        let mut ctx = Context::new();
        ctx.set_external(self.external.clone());
        let top = self.productions.first().cloned().unwrap_or_else(|| self.fail());
        let mut state = vec![top];
        let mut stack: Vec<Vec<Arc<Term>>> = Vec::new();
        loop {
            match source.next_event()? {
                TreeEvent::EnterTree(name) => {
                    let children = self
                        .slots(&state)
                        .into_iter()
                        .map(|slot| match slot {
                            Term::Tree(label, child) if label.matches(&name) => Arc::clone(child),
                            _ => self.fail(),
                        })
                        .collect();
                    stack.push(std::mem::replace(&mut state, children));
                }
                TreeEvent::Leaf(value) => {
                    ctx.set_current(value);
                    let outcomes = self
                        .slots(&state)
                        .into_iter()
                        .map(|slot| match slot {
                            Term::Leaf(f) => eval_predicate(f.as_ref(), &ctx)
                                .map_err(|e| e.with_frame(format!("leaf {f}"))),
                            _ => Ok(false),
                        })
                        .collect::<Result<Vec<bool>>>()?;
                    state = self.fold(&state, &outcomes);
                }
                TreeEvent::ExitTree => {
                    let parent = stack
                        .pop()
                        .ok_or_else(|| Error::malformed_stream("exit without a matching enter"))?;
                    let outcomes: Vec<bool> = state.iter().map(|t| self.nullable(t)).collect();
                    state = self.fold(&parent, &outcomes);
                }
                TreeEvent::EndOfStream if !stack.is_empty() => {
                    return Err(Error::malformed_stream(format!(
                        "end of stream with {} open trees",
                        stack.len()
                    )));
                }
                TreeEvent::EndOfStream => {
                    return Ok(state.first().is_some_and(|t| self.nullable(t)));
                }
            }
        }
    }

    fn fold(&self, state: &[Arc<Term>], outcomes: &[bool]) -> Vec<Arc<Term>> {
        let mut pos = 0;
        state
            .iter()
            .map(|t| self.derive(t, outcomes, &mut pos))
            .collect()
    }

    // =========================================================================
    // Lowering
    // =========================================================================

    fn lower(&self, pattern: &Pattern, grammar: &Grammar, composer: &Composer<'_>) -> Result<Arc<Term>> {
        Ok(match pattern {
            Pattern::Empty => self.empty(),
            Pattern::ZAny => self.zany(),
            Pattern::TreeNode { name, pattern } => {
                Arc::new(Term::Tree(name.clone(), self.lower(pattern, grammar, composer)?))
            }
            Pattern::LeafNode(expr) => Arc::new(Term::Leaf(composer.compose_predicate(expr)?)),
            Pattern::Concat(l, r) => self.concat(
                self.lower(l, grammar, composer)?,
                self.lower(r, grammar, composer)?,
            ),
            Pattern::Or(l, r) => self.or(
                self.lower(l, grammar, composer)?,
                self.lower(r, grammar, composer)?,
            ),
            Pattern::And(l, r) => self.and(
                self.lower(l, grammar, composer)?,
                self.lower(r, grammar, composer)?,
            ),
            Pattern::Interleave(l, r) => self.interleave(
                self.lower(l, grammar, composer)?,
                self.lower(r, grammar, composer)?,
            ),
            Pattern::ZeroOrMore(p) => self.zero_or_more(self.lower(p, grammar, composer)?),
            Pattern::Optional(p) => self.or(self.empty(), self.lower(p, grammar, composer)?),
            Pattern::Not(p) => self.not(self.lower(p, grammar, composer)?),
            Pattern::Contains(p) => {
                let tail = self.concat(self.lower(p, grammar, composer)?, self.zany());
                self.concat(self.zany(), tail)
            }
            Pattern::Reference(name) => {
                let id = grammar
                    .id_of(name)
                    .ok_or_else(|| Error::unresolved_reference(name.as_str()))?;
                Arc::new(Term::Ref(id.index()))
            }
        })
    }

    // =========================================================================
    // Nullability, slots and derivatives
    // =========================================================================

    fn nullable(&self, t: &Term) -> bool {
        match t {
            Term::Empty | Term::ZAny | Term::ZeroOrMore(_) => true,
            Term::Fail | Term::Tree(..) | Term::Leaf(_) => false,
            Term::Concat(l, r) | Term::And(l, r) | Term::Interleave(l, r) => {
                self.nullable(l) && self.nullable(r)
            }
            Term::Or(l, r) => self.nullable(l) || self.nullable(r),
            Term::Not(p) => !self.nullable(p),
            Term::Ref(id) => self.production(*id).is_some_and(|p| self.nullable(p)),
        }
    }

    fn slots<'t>(&'t self, state: &'t [Arc<Term>]) -> Vec<&'t Term> {
        let mut out = Vec::new();
        for t in state {
            self.collect_slots(t, &mut out);
        }
        out
    }

    fn collect_slots<'t>(&'t self, t: &'t Term, out: &mut Vec<&'t Term>) {
        match t {
            Term::Empty | Term::ZAny | Term::Fail => {}
            Term::Tree(..) | Term::Leaf(_) => out.push(t),
            Term::Concat(l, r) => {
                self.collect_slots(l, out);
                if self.nullable(l) {
                    self.collect_slots(r, out);
                }
            }
            Term::Or(l, r) | Term::And(l, r) | Term::Interleave(l, r) => {
                self.collect_slots(l, out);
                self.collect_slots(r, out);
            }
            Term::ZeroOrMore(p) | Term::Not(p) => self.collect_slots(p, out),
            Term::Ref(id) => {
                if let Some(p) = self.production(*id) {
                    self.collect_slots(p, out);
                }
            }
        }
    }

    fn derive(&self, t: &Arc<Term>, outcomes: &[bool], pos: &mut usize) -> Arc<Term> {
        match &**t {
            Term::Empty | Term::Fail => self.fail(),
            Term::ZAny => self.zany(),
            Term::Tree(..) | Term::Leaf(_) => {
                let hit = outcomes.get(*pos).copied().unwrap_or(false);
                *pos += 1;
                if hit { self.empty() } else { self.fail() }
            }
            Term::Concat(l, r) => {
                let head = self.concat(self.derive(l, outcomes, pos), Arc::clone(r));
                if self.nullable(l) {
                    let dr = self.derive(r, outcomes, pos);
                    self.or(head, dr)
                } else {
                    head
                }
            }
            Term::Or(l, r) => {
                let dl = self.derive(l, outcomes, pos);
                let dr = self.derive(r, outcomes, pos);
                self.or(dl, dr)
            }
            Term::And(l, r) => {
                let dl = self.derive(l, outcomes, pos);
                let dr = self.derive(r, outcomes, pos);
                self.and(dl, dr)
            }
            Term::Interleave(l, r) => {
                let dl = self.derive(l, outcomes, pos);
                let dr = self.derive(r, outcomes, pos);
                self.or(
                    self.interleave(dl, Arc::clone(r)),
                    self.interleave(Arc::clone(l), dr),
                )
            }
            Term::ZeroOrMore(p) => self.concat(self.derive(p, outcomes, pos), Arc::clone(t)),
            Term::Not(p) => self.not(self.derive(p, outcomes, pos)),
            Term::Ref(id) => match self.production(*id) {
                Some(p) => self.derive(p, outcomes, pos),
                None => self.fail(),
            },
        }
    }

    fn production(&self, id: usize) -> Option<&Arc<Term>> {
        self.productions.get(id)
    }

    // =========================================================================
    // Simplifying constructors
    // =========================================================================

    fn empty(&self) -> Arc<Term> {
        Arc::clone(&self.empty)
    }

    fn zany(&self) -> Arc<Term> {
        Arc::clone(&self.zany)
    }

    fn fail(&self) -> Arc<Term> {
        Arc::clone(&self.fail)
    }

    fn concat(&self, l: Arc<Term>, r: Arc<Term>) -> Arc<Term> {
        if is_fail(&l) || is_fail(&r) {
            return self.fail();
        }
        if matches!(*l, Term::Empty) {
            return r;
        }
        if matches!(*r, Term::Empty) {
            return l;
        }
        if matches!(*l, Term::ZAny) && matches!(*r, Term::ZAny) {
            return l;
        }
        Arc::new(Term::Concat(l, r))
    }

    fn or(&self, l: Arc<Term>, r: Arc<Term>) -> Arc<Term> {
        if matches!(*l, Term::ZAny) || matches!(*r, Term::ZAny) {
            return self.zany();
        }
        if is_fail(&l) {
            return r;
        }
        if is_fail(&r) {
            return l;
        }
        Arc::new(Term::Or(l, r))
    }

    fn and(&self, l: Arc<Term>, r: Arc<Term>) -> Arc<Term> {
        if is_fail(&l) || is_fail(&r) {
            return self.fail();
        }
        if matches!(*l, Term::ZAny) {
            return r;
        }
        if matches!(*r, Term::ZAny) {
            return l;
        }
        Arc::new(Term::And(l, r))
    }

    fn interleave(&self, l: Arc<Term>, r: Arc<Term>) -> Arc<Term> {
        if is_fail(&l) || is_fail(&r) {
            return self.fail();
        }
        if matches!(*l, Term::Empty) {
            return r;
        }
        if matches!(*r, Term::Empty) {
            return l;
        }
        if matches!(*l, Term::ZAny) && matches!(*r, Term::ZAny) {
            return l;
        }
        Arc::new(Term::Interleave(l, r))
    }

    fn zero_or_more(&self, p: Arc<Term>) -> Arc<Term> {
        if matches!(*p, Term::Empty | Term::Fail) {
            return self.empty();
        }
        if matches!(*p, Term::ZAny | Term::ZeroOrMore(_)) {
            return p;
        }
        Arc::new(Term::ZeroOrMore(p))
    }

    fn not(&self, p: Arc<Term>) -> Arc<Term> {
        if let Term::Not(inner) = &*p {
            return Arc::clone(inner);
        }
        if matches!(*p, Term::ZAny) {
            return self.fail();
        }
        if is_fail(&p) {
            return self.zany();
        }
        Arc::new(Term::Not(p))
    }
}

fn is_fail(t: &Term) -> bool {
    matches!(t, Term::Fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::VecSource;
    use sylva_foundation::{ErrorCategory, ErrorKind};
    use sylva_language::parse;

    fn interpret(text: &str, events: Vec<TreeEvent>) -> Result<bool> {
        Interpreter::new(&parse(text).unwrap())?.validate(&mut VecSource::new(events))
    }

    fn enter(name: &str) -> TreeEvent {
        TreeEvent::EnterTree(Value::from(name))
    }

    #[test]
    fn fields_and_leaves() {
        let events = vec![enter("a"), TreeEvent::Leaf(Value::Int(5)), TreeEvent::ExitTree];
        assert!(interpret("a::$int", events.clone()).unwrap());
        assert!(!interpret("a::$string", events.clone()).unwrap());
        assert!(!interpret("b::$int", events).unwrap());
    }

    #[test]
    fn interleave_keeps_subtrees_whole() {
        let grammar = "{a: [x: *, y: *]; b: *}";
        let events = vec![
            enter("b"),
            TreeEvent::ExitTree,
            enter("a"),
            enter("x"),
            TreeEvent::ExitTree,
            enter("y"),
            TreeEvent::ExitTree,
            TreeEvent::ExitTree,
        ];
        assert!(interpret(grammar, events).unwrap());
    }

    #[test]
    fn contains_finds_an_item_anywhere() {
        let grammar = ".b: *";
        let events = vec![
            enter("a"),
            TreeEvent::ExitTree,
            enter("b"),
            TreeEvent::ExitTree,
            enter("c"),
            TreeEvent::ExitTree,
        ];
        assert!(interpret(grammar, events).unwrap());
        assert!(!interpret(grammar, vec![enter("a"), TreeEvent::ExitTree]).unwrap());
    }

    #[test]
    fn not_complements_whole_sequences() {
        assert!(interpret("!(a: *)", vec![]).unwrap());
        assert!(!interpret("!(a: *)", vec![enter("a"), TreeEvent::ExitTree]).unwrap());
    }

    #[test]
    fn guarded_recursion() {
        let grammar = "#main = @list\n#list = (<empty> | cons: [head == 1, tail: @list])";
        let events = vec![
            enter("cons"),
            enter("head"),
            TreeEvent::Leaf(Value::Int(1)),
            TreeEvent::ExitTree,
            enter("tail"),
            TreeEvent::ExitTree,
            TreeEvent::ExitTree,
        ];
        assert!(interpret(grammar, events).unwrap());
    }

    #[test]
    fn refusals() {
        let err = Interpreter::new(&parse("#main = [@main, a: *]").unwrap()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Recursion);
        let err = Interpreter::new(&parse("@missing").unwrap()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnresolvedReference(_)));
    }

    #[test]
    fn unbalanced_streams() {
        let err = interpret("*", vec![TreeEvent::ExitTree]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Stream);
        let err = interpret("*", vec![enter("a")]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Stream);
    }

    #[test]
    fn deep_nesting_uses_the_frame_stack() {
        let depth = 100_000;
        let mut events = vec![enter("a"); depth];
        events.extend(std::iter::repeat_n(TreeEvent::ExitTree, depth));
        assert!(interpret("*", events.clone()).unwrap());
        events.pop();
        let err = interpret("*", events).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Stream);
    }

    #[test]
    fn leaf_errors_propagate() {
        let err = interpret("-> eq($int, 1)", vec![TreeEvent::Leaf(Value::from("x"))]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Eval);
    }
}
