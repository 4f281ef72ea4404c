//! Derivative-based matcher with memoization.
//!
//! A state is an interned list of arena patterns, one per slot of the
//! enclosing level; the initial state is `[top]`. Each pattern exposes
//! *slots*, the tree and leaf patterns that can consume the next sibling.
//!
//! - `EnterTree(name)` maps every slot to its child pattern (or the empty
//!   language) and pushes the parent state.
//! - `Leaf(value)` evaluates every leaf slot and folds the outcomes into
//!   the state.
//! - `ExitTree` folds the child state's nullability into the saved parent.
//!
//! Slots, child states, folded states and nullability are all memoized,
//! so repeated shapes (array items, recurring objects) cost a table
//! lookup after the first occurrence.

use std::collections::HashMap;
use std::sync::Arc;

use sylva_foundation::{Error, Result, SemanticLimit, Value};
use sylva_language::funcs::eval_predicate;
use sylva_language::{Composer, Context, Grammar, Registry};
use tracing::{debug, trace};

use crate::arena::{Arena, Node, PatternId, PredId};
use crate::config::MatcherConfig;
use crate::event::{EventSource, TreeEvent};
use crate::recursion;

/// Index of an interned matcher state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateId(u32);

impl StateId {
    /// Returns the raw index of this state.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
struct Memo {
    states: Vec<Arc<[PatternId]>>,
    state_ids: HashMap<Arc<[PatternId]>, StateId>,
    nullable: HashMap<PatternId, bool>,
    slots: HashMap<PatternId, Arc<[PatternId]>>,
    state_slots: HashMap<StateId, Arc<[PatternId]>>,
    calls: HashMap<(StateId, Box<[bool]>), StateId>,
    returns: HashMap<(StateId, Box<[bool]>), StateId>,
}

impl Memo {
    fn intern_state(&mut self, patterns: Vec<PatternId>) -> StateId {
        let patterns: Arc<[PatternId]> = patterns.into();
        if let Some(&id) = self.state_ids.get(&patterns) {
            return id;
        }
        let id = StateId(u32::try_from(self.states.len()).unwrap_or(u32::MAX));
        trace!(state = id.0, width = patterns.len(), "new state");
        self.states.push(Arc::clone(&patterns));
        self.state_ids.insert(patterns, id);
        id
    }

    fn patterns(&self, state: StateId) -> Arc<[PatternId]> {
        Arc::clone(&self.states[state.index()])
    }
}

/// A prepared grammar plus its memo tables.
///
/// Preparing composes every leaf predicate once; the tables then grow
/// across validations, so reusing one matcher for many documents is
/// cheaper than preparing a new one each time.
#[derive(Debug)]
pub struct Matcher {
    arena: Arena,
    memo: Memo,
    initial: StateId,
    config: MatcherConfig,
    external: Option<Value>,
}

impl Matcher {
    /// Prepares `grammar` against the standard registry with no limits.
    ///
    /// # Errors
    /// See [`Matcher::with_config`].
    pub fn new(grammar: &Grammar) -> Result<Self> {
        Self::with_config(grammar, &Registry::standard(), MatcherConfig::default())
    }

    /// Prepares `grammar`, composing leaf predicates against `registry`.
    ///
    /// # Errors
    /// Returns `Recursion` for unguarded recursive productions,
    /// `UnresolvedReference` for unknown references, any compose error,
    /// or `LimitExceeded` if the arena limit is too small.
    pub fn with_config(grammar: &Grammar, registry: &Registry, config: MatcherConfig) -> Result<Self> {
        recursion::check(grammar)?;
        let mut arena = Arena::with_max_patterns(config.max_patterns);
        let top = arena.lower_grammar(grammar, &Composer::new(registry))?;
        let mut memo = Memo::default();
        let initial = memo.intern_state(vec![top]);
        debug!(
            productions = grammar.len(),
            patterns = arena.len(),
            predicates = arena.predicate_count(),
            "prepared matcher"
        );
        Ok(Self {
            arena,
            memo,
            initial,
            config,
            external: None,
        })
    }

    /// Sets the external value visible to host functions in later runs.
    pub fn set_context(&mut self, value: Value) {
        self.external = Some(value);
    }

    /// Removes the external value.
    pub fn clear_context(&mut self) {
        self.external = None;
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Returns the pattern arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns the number of states discovered so far.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.memo.states.len()
    }

    /// Begins an incremental validation.
    pub fn start(&mut self) -> Walk<'_> {
        let mut ctx = Context::new();
        ctx.set_external(self.external.clone());
        let state = self.initial;
        Walk {
            matcher: self,
            ctx,
            state,
            stack: Vec::new(),
            outcome: None,
        }
    }

    /// Validates a whole event stream.
    ///
    /// # Errors
    /// Returns any error from the source, a leaf evaluation error,
    /// `MalformedStream` for unbalanced events, or `LimitExceeded`.
    pub fn validate<S: EventSource + ?Sized>(&mut self, source: &mut S) -> Result<bool> {
        let accepted = {
            let mut walk = self.start();
            loop {
                match source.next_event()? {
                    TreeEvent::EndOfStream => break walk.finish()?,
                    event => walk.feed(event)?,
                }
            }
        };
        trace!(
            accepted,
            states = self.memo.states.len(),
            patterns = self.arena.len(),
            "validation finished"
        );
        Ok(accepted)
    }

    // =========================================================================
    // Nullability and slots
    // =========================================================================

    fn nullable(&mut self, p: PatternId) -> bool {
        if let Some(&n) = self.memo.nullable.get(&p) {
            return n;
        }
        let n = match self.arena.node(p).clone() {
            Node::Empty | Node::ZAny | Node::ZeroOrMore(_) => true,
            Node::Tree { .. } | Node::Leaf(_) => false,
            Node::Concat(l, r) | Node::Interleave(l, r) => self.nullable(l) && self.nullable(r),
            Node::Or(items) => items.iter().any(|&q| self.nullable(q)),
            Node::And(items) => items.iter().all(|&q| self.nullable(q)),
            Node::Not(q) => !self.nullable(q),
            Node::Ref(decl) => {
                let q = self.arena.production(decl);
                self.nullable(q)
            }
        };
        self.memo.nullable.insert(p, n);
        n
    }

    fn slots(&mut self, p: PatternId) -> Arc<[PatternId]> {
        if let Some(slots) = self.memo.slots.get(&p) {
            return Arc::clone(slots);
        }
        let mut out = Vec::new();
        match self.arena.node(p).clone() {
            Node::Empty | Node::ZAny => {}
            Node::Tree { .. } | Node::Leaf(_) => out.push(p),
            Node::Concat(l, r) => {
                out.extend_from_slice(&self.slots(l));
                if self.nullable(l) {
                    out.extend_from_slice(&self.slots(r));
                }
            }
            Node::Or(items) | Node::And(items) => {
                for q in items {
                    out.extend_from_slice(&self.slots(q));
                }
            }
            Node::Interleave(l, r) => {
                out.extend_from_slice(&self.slots(l));
                out.extend_from_slice(&self.slots(r));
            }
            Node::ZeroOrMore(q) | Node::Not(q) => out.extend_from_slice(&self.slots(q)),
            Node::Ref(decl) => {
                let q = self.arena.production(decl);
                out.extend_from_slice(&self.slots(q));
            }
        }
        let slots: Arc<[PatternId]> = out.into();
        self.memo.slots.insert(p, Arc::clone(&slots));
        slots
    }

    fn state_slots(&mut self, state: StateId) -> Arc<[PatternId]> {
        if let Some(slots) = self.memo.state_slots.get(&state) {
            return Arc::clone(slots);
        }
        let mut out = Vec::new();
        for &p in self.memo.patterns(state).iter() {
            out.extend_from_slice(&self.slots(p));
        }
        let slots: Arc<[PatternId]> = out.into();
        self.memo.state_slots.insert(state, Arc::clone(&slots));
        slots
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// The child state entered from `state` on a tree labelled `name`.
    ///
    /// Memoized on which tree slots accept the label, not on the label
    /// itself, so distinct keys and indices share entries.
    fn call(&mut self, state: StateId, name: &Value) -> StateId {
        let slots = self.state_slots(state);
        let hits: Box<[bool]> = slots
            .iter()
            .map(|&slot| {
                matches!(self.arena.node(slot), Node::Tree { name: label, .. } if label.matches(name))
            })
            .collect();
        let key = (state, hits);
        if let Some(&child) = self.memo.calls.get(&key) {
            return child;
        }
        trace!(state = state.0, %name, "call miss");
        let children = slots
            .iter()
            .zip(key.1.iter())
            .map(|(&slot, &hit)| match self.arena.node(slot) {
                Node::Tree { child, .. } if hit => *child,
                _ => PatternId::NONE,
            })
            .collect();
        let child = self.memo.intern_state(children);
        self.memo.calls.insert(key, child);
        child
    }

    /// Evaluates every leaf slot of `state` against the current value.
    fn leaf(&mut self, state: StateId, ctx: &Context) -> Result<StateId> {
        let slots = self.state_slots(state);
        let mut evaluated: Vec<(PredId, bool)> = Vec::new();
        let mut outcomes = Vec::with_capacity(slots.len());
        for &slot in slots.iter() {
            let hit = match *self.arena.node(slot) {
                Node::Leaf(pred) => match evaluated.iter().find(|(id, _)| *id == pred) {
                    Some(&(_, hit)) => hit,
                    None => {
                        let f = self.arena.predicate(pred);
                        let hit = eval_predicate(f.as_ref(), ctx)
                            .map_err(|e| e.with_frame(format!("leaf {f}")))?;
                        evaluated.push((pred, hit));
                        hit
                    }
                },
                _ => false,
            };
            outcomes.push(hit);
        }
        self.fold(state, &outcomes)
    }

    /// Folds a finished child state back into its parent.
    fn exit(&mut self, child: StateId, parent: StateId) -> Result<StateId> {
        let outcomes: Vec<bool> = self
            .memo
            .patterns(child)
            .iter()
            .map(|&p| self.nullable(p))
            .collect();
        self.fold(parent, &outcomes)
    }

    /// Derives every pattern of `state` given one outcome per slot.
    fn fold(&mut self, state: StateId, outcomes: &[bool]) -> Result<StateId> {
        let key = (state, Box::<[bool]>::from(outcomes));
        if let Some(&next) = self.memo.returns.get(&key) {
            return Ok(next);
        }
        trace!(state = state.0, ?outcomes, "returns miss");
        let mut pos = 0;
        let mut derived = Vec::new();
        for &p in self.memo.patterns(state).iter() {
            derived.push(self.derive(p, outcomes, &mut pos)?);
        }
        let next = self.memo.intern_state(derived);
        self.memo.returns.insert(key, next);
        Ok(next)
    }

    /// The derivative of `p`, consuming outcomes in slot order.
    fn derive(&mut self, p: PatternId, outcomes: &[bool], pos: &mut usize) -> Result<PatternId> {
        match self.arena.node(p).clone() {
            Node::Empty => Ok(PatternId::NONE),
            Node::ZAny => Ok(PatternId::ZANY),
            Node::Tree { .. } | Node::Leaf(_) => {
                let hit = outcomes.get(*pos).copied().unwrap_or(false);
                *pos += 1;
                Ok(if hit { PatternId::EMPTY } else { PatternId::NONE })
            }
            Node::Concat(l, r) => {
                let dl = self.derive(l, outcomes, pos)?;
                let head = self.arena.concat(dl, r)?;
                if self.nullable(l) {
                    let dr = self.derive(r, outcomes, pos)?;
                    self.arena.or(head, dr)
                } else {
                    Ok(head)
                }
            }
            Node::Or(items) => {
                let mut derived = Vec::with_capacity(items.len());
                for q in items {
                    derived.push(self.derive(q, outcomes, pos)?);
                }
                self.arena.or_all(derived)
            }
            Node::And(items) => {
                let mut derived = Vec::with_capacity(items.len());
                for q in items {
                    derived.push(self.derive(q, outcomes, pos)?);
                }
                self.arena.and_all(derived)
            }
            Node::Interleave(l, r) => {
                let dl = self.derive(l, outcomes, pos)?;
                let dr = self.derive(r, outcomes, pos)?;
                let left = self.arena.interleave(dl, r)?;
                let right = self.arena.interleave(l, dr)?;
                self.arena.or(left, right)
            }
            Node::ZeroOrMore(q) => {
                let dq = self.derive(q, outcomes, pos)?;
                self.arena.concat(dq, p)
            }
            Node::Not(q) => {
                let dq = self.derive(q, outcomes, pos)?;
                self.arena.not(dq)
            }
            Node::Ref(decl) => {
                let q = self.arena.production(decl);
                self.derive(q, outcomes, pos)
            }
        }
    }
}

/// An in-progress validation that accepts one event at a time.
#[derive(Debug)]
pub struct Walk<'m> {
    matcher: &'m mut Matcher,
    ctx: Context,
    state: StateId,
    stack: Vec<StateId>,
    outcome: Option<bool>,
}

impl Walk<'_> {
    /// Consumes one event.
    ///
    /// # Errors
    /// Returns a leaf evaluation error, `MalformedStream` for unbalanced
    /// events or events after the end, or `LimitExceeded` past the
    /// configured depth.
    pub fn feed(&mut self, event: TreeEvent) -> Result<()> {
        if self.outcome.is_some() {
            return match event {
                TreeEvent::EndOfStream => Ok(()),
                event => Err(Error::malformed_stream(format!("{event} after end of stream"))),
            };
        }
        match event {
            TreeEvent::EnterTree(name) => {
                if let Some(limit) = self.matcher.config.max_depth {
                    if self.stack.len() >= limit {
                        return Err(Error::limit_exceeded(SemanticLimit::MaxDepth { limit }));
                    }
                }
                let child = self.matcher.call(self.state, &name);
                self.stack.push(self.state);
                self.state = child;
            }
            TreeEvent::Leaf(value) => {
                self.ctx.set_current(value);
                self.state = self.matcher.leaf(self.state, &self.ctx)?;
            }
            TreeEvent::ExitTree => {
                let parent = self
                    .stack
                    .pop()
                    .ok_or_else(|| Error::malformed_stream("exit without a matching enter"))?;
                self.state = self.matcher.exit(self.state, parent)?;
            }
            TreeEvent::EndOfStream => {
                if !self.stack.is_empty() {
                    return Err(Error::malformed_stream(format!(
                        "end of stream with {} open trees",
                        self.stack.len()
                    )));
                }
                self.outcome = Some(self.top_nullable());
            }
        }
        Ok(())
    }

    /// Returns the number of open tree nodes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True if the events so far, followed by the end of the stream, match.
    pub fn is_accepting(&mut self) -> bool {
        match self.outcome {
            Some(accepted) => accepted,
            None => self.stack.is_empty() && self.top_nullable(),
        }
    }

    /// Ends the stream and returns the result.
    ///
    /// # Errors
    /// Returns `MalformedStream` if trees are still open.
    pub fn finish(mut self) -> Result<bool> {
        self.feed(TreeEvent::EndOfStream)?;
        Ok(self.outcome.unwrap_or(false))
    }

    fn top_nullable(&mut self) -> bool {
        let top = self
            .matcher
            .memo
            .patterns(self.state)
            .first()
            .copied()
            .unwrap_or(PatternId::NONE);
        self.matcher.nullable(top)
    }
}
