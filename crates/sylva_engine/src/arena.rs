//! Hash-consed pattern arena.
//!
//! Every pattern the matcher ever sees, including derivatives, lives here
//! exactly once. Constructors simplify before interning, so structurally
//! equal patterns share one [`PatternId`]:
//!
//! - `Or` and `And` are flattened, sorted and deduplicated
//! - `Empty`, `ZAny` and the empty language act as identities or absorbers
//! - `Not(Not(p))` is `p`
//!
//! Leaf predicates are interned separately by structural hash plus
//! [`Function::compare`], so two separately composed but equal predicates
//! share one [`PredId`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use sylva_foundation::{Error, Result, SemanticLimit};
use sylva_language::{Composer, DeclId, Func, Grammar, NameExpr, Pattern};
use tracing::trace;

/// Index of an interned pattern.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(u32);

impl PatternId {
    /// The language containing only the empty sequence.
    pub const EMPTY: PatternId = PatternId(0);

    /// Every sibling sequence.
    pub const ZANY: PatternId = PatternId(1);

    /// The empty language, `Not(ZAny)`.
    pub const NONE: PatternId = PatternId(2);

    /// Returns the raw index of this pattern.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatternId({})", self.0)
    }
}

/// Index of an interned leaf predicate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredId(u32);

impl PredId {
    /// Returns the raw index of this predicate.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An interned pattern node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    /// End of the sibling sequence.
    Empty,
    /// Any sibling sequence.
    ZAny,
    /// One tree node.
    Tree {
        /// Label matcher.
        name: NameExpr,
        /// Pattern for the children.
        child: PatternId,
    },
    /// One leaf satisfying a predicate.
    Leaf(PredId),
    /// Sequence.
    Concat(PatternId, PatternId),
    /// Union of at least two sorted, distinct patterns.
    Or(Vec<PatternId>),
    /// Intersection of at least two sorted, distinct patterns.
    And(Vec<PatternId>),
    /// Unordered composition, operands sorted.
    Interleave(PatternId, PatternId),
    /// Kleene star.
    ZeroOrMore(PatternId),
    /// Complement.
    Not(PatternId),
    /// A named production, resolved through [`Arena::production`].
    Ref(DeclId),
}

/// The pattern and predicate arena.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
    ids: HashMap<Node, PatternId>,
    preds: Vec<Func>,
    pred_buckets: HashMap<u64, Vec<PredId>>,
    productions: Vec<PatternId>,
    max_patterns: Option<usize>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Creates an arena holding only the reserved patterns.
    #[must_use]
    pub fn new() -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            ids: HashMap::new(),
            preds: Vec::new(),
            pred_buckets: HashMap::new(),
            productions: Vec::new(),
            max_patterns: None,
        };
        for node in [Node::Empty, Node::ZAny, Node::Not(PatternId::ZANY)] {
            arena.push(node);
        }
        arena
    }

    /// Creates an empty arena that refuses to grow past `limit` patterns.
    #[must_use]
    pub fn with_max_patterns(limit: Option<usize>) -> Self {
        Self {
            max_patterns: limit,
            ..Self::new()
        }
    }

    /// Lowers every production of `grammar`, composing leaf predicates.
    ///
    /// Returns the id of the top-level pattern.
    ///
    /// # Errors
    /// Returns `UnresolvedReference` for references to unknown productions,
    /// any compose error from a leaf, or `LimitExceeded`.
    pub fn lower_grammar(&mut self, grammar: &Grammar, composer: &Composer<'_>) -> Result<PatternId> {
        let mut productions = Vec::with_capacity(grammar.len());
        for decl in grammar.decls() {
            let id = self
                .lower(&decl.pattern, grammar, composer)
                .map_err(|e| e.with_frame(format!("production {}", decl.name)))?;
            productions.push(id);
        }
        self.productions = productions;
        Ok(self.production(DeclId::MAIN))
    }

    fn lower(&mut self, pattern: &Pattern, grammar: &Grammar, composer: &Composer<'_>) -> Result<PatternId> {
        match pattern {
            Pattern::Empty => Ok(PatternId::EMPTY),
            Pattern::ZAny => Ok(PatternId::ZANY),
            Pattern::TreeNode { name, pattern } => {
                let child = self.lower(pattern, grammar, composer)?;
                self.tree(name.clone(), child)
            }
            Pattern::LeafNode(expr) => {
                let pred = composer.compose_predicate(expr)?;
                let pred = self.intern_predicate(pred);
                self.leaf(pred)
            }
            Pattern::Concat(l, r) => {
                let l = self.lower(l, grammar, composer)?;
                let r = self.lower(r, grammar, composer)?;
                self.concat(l, r)
            }
            Pattern::Or(l, r) => {
                let l = self.lower(l, grammar, composer)?;
                let r = self.lower(r, grammar, composer)?;
                self.or(l, r)
            }
            Pattern::And(l, r) => {
                let l = self.lower(l, grammar, composer)?;
                let r = self.lower(r, grammar, composer)?;
                self.and(l, r)
            }
            Pattern::Interleave(l, r) => {
                let l = self.lower(l, grammar, composer)?;
                let r = self.lower(r, grammar, composer)?;
                self.interleave(l, r)
            }
            Pattern::ZeroOrMore(p) => {
                let p = self.lower(p, grammar, composer)?;
                self.zero_or_more(p)
            }
            Pattern::Optional(p) => {
                let p = self.lower(p, grammar, composer)?;
                self.or(PatternId::EMPTY, p)
            }
            Pattern::Not(p) => {
                let p = self.lower(p, grammar, composer)?;
                self.not(p)
            }
            Pattern::Contains(p) => {
                let p = self.lower(p, grammar, composer)?;
                let tail = self.concat(p, PatternId::ZANY)?;
                self.concat(PatternId::ZANY, tail)
            }
            Pattern::Reference(name) => {
                let id = grammar
                    .id_of(name)
                    .ok_or_else(|| Error::unresolved_reference(name.as_str()))?;
                self.intern(Node::Ref(id))
            }
        }
    }

    /// Returns the node behind `id`.
    #[must_use]
    pub fn node(&self, id: PatternId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the lowered root of a production.
    ///
    /// Unknown ids resolve to the empty language.
    #[must_use]
    pub fn production(&self, id: DeclId) -> PatternId {
        self.productions
            .get(id.index())
            .copied()
            .unwrap_or(PatternId::NONE)
    }

    /// Returns the predicate behind `id`.
    #[must_use]
    pub fn predicate(&self, id: PredId) -> &Func {
        &self.preds[id.index()]
    }

    /// Returns the number of interned patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the reserved patterns are present from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of interned predicates.
    #[must_use]
    pub fn predicate_count(&self) -> usize {
        self.preds.len()
    }

    /// Interns a predicate, returning the id of an equal one if present.
    pub fn intern_predicate(&mut self, pred: Func) -> PredId {
        let Self {
            preds,
            pred_buckets,
            ..
        } = self;
        let bucket = pred_buckets.entry(pred.hash_code()).or_default();
        if let Some(&id) = bucket
            .iter()
            .find(|id| preds[id.index()].compare(pred.as_ref()) == Ordering::Equal)
        {
            return id;
        }
        let id = PredId(u32::try_from(preds.len()).unwrap_or(u32::MAX));
        trace!(?id, predicate = %pred, "interned predicate");
        preds.push(pred);
        bucket.push(id);
        id
    }

    fn intern(&mut self, node: Node) -> Result<PatternId> {
        if let Some(&id) = self.ids.get(&node) {
            return Ok(id);
        }
        if let Some(limit) = self.max_patterns {
            if self.nodes.len() >= limit {
                return Err(Error::limit_exceeded(SemanticLimit::MaxPatterns { limit }));
            }
        }
        Ok(self.push(node))
    }

    fn push(&mut self, node: Node) -> PatternId {
        let id = PatternId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        trace!(?id, ?node, "interned pattern");
        self.ids.insert(node.clone(), id);
        self.nodes.push(node);
        id
    }

    // =========================================================================
    // Simplifying constructors
    // =========================================================================

    /// Builds a tree node pattern.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn tree(&mut self, name: NameExpr, child: PatternId) -> Result<PatternId> {
        self.intern(Node::Tree { name, child })
    }

    /// Builds a leaf pattern.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn leaf(&mut self, pred: PredId) -> Result<PatternId> {
        self.intern(Node::Leaf(pred))
    }

    /// Builds `[l, r]`.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn concat(&mut self, l: PatternId, r: PatternId) -> Result<PatternId> {
        if l == PatternId::NONE || r == PatternId::NONE {
            return Ok(PatternId::NONE);
        }
        if l == PatternId::EMPTY {
            return Ok(r);
        }
        if r == PatternId::EMPTY {
            return Ok(l);
        }
        if l == PatternId::ZANY && r == PatternId::ZANY {
            return Ok(PatternId::ZANY);
        }
        self.intern(Node::Concat(l, r))
    }

    /// Builds `(l | r)`.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn or(&mut self, l: PatternId, r: PatternId) -> Result<PatternId> {
        self.or_all(vec![l, r])
    }

    /// Builds the union of `patterns`; the empty union is the empty language.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn or_all(&mut self, patterns: Vec<PatternId>) -> Result<PatternId> {
        let mut flat = self.flatten(patterns, |node| match node {
            Node::Or(items) => Some(items),
            _ => None,
        });
        if flat.contains(&PatternId::ZANY) {
            return Ok(PatternId::ZANY);
        }
        flat.retain(|&p| p != PatternId::NONE);
        match flat.as_slice() {
            [] => Ok(PatternId::NONE),
            [only] => Ok(*only),
            _ => self.intern(Node::Or(flat)),
        }
    }

    /// Builds `(l & r)`.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn and(&mut self, l: PatternId, r: PatternId) -> Result<PatternId> {
        self.and_all(vec![l, r])
    }

    /// Builds the intersection of `patterns`; the empty intersection is `ZAny`.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn and_all(&mut self, patterns: Vec<PatternId>) -> Result<PatternId> {
        let mut flat = self.flatten(patterns, |node| match node {
            Node::And(items) => Some(items),
            _ => None,
        });
        if flat.contains(&PatternId::NONE) {
            return Ok(PatternId::NONE);
        }
        flat.retain(|&p| p != PatternId::ZANY);
        match flat.as_slice() {
            [] => Ok(PatternId::ZANY),
            [only] => Ok(*only),
            _ => self.intern(Node::And(flat)),
        }
    }

    fn flatten(
        &self,
        patterns: Vec<PatternId>,
        nested: impl Fn(&Node) -> Option<&Vec<PatternId>>,
    ) -> Vec<PatternId> {
        let mut flat = Vec::with_capacity(patterns.len());
        for p in patterns {
            match nested(self.node(p)) {
                Some(items) => flat.extend_from_slice(items),
                None => flat.push(p),
            }
        }
        flat.sort_unstable();
        flat.dedup();
        flat
    }

    /// Builds `{l; r}`.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn interleave(&mut self, l: PatternId, r: PatternId) -> Result<PatternId> {
        if l == PatternId::NONE || r == PatternId::NONE {
            return Ok(PatternId::NONE);
        }
        if l == PatternId::EMPTY {
            return Ok(r);
        }
        if r == PatternId::EMPTY {
            return Ok(l);
        }
        if l == PatternId::ZANY && r == PatternId::ZANY {
            return Ok(PatternId::ZANY);
        }
        let (l, r) = if l <= r { (l, r) } else { (r, l) };
        self.intern(Node::Interleave(l, r))
    }

    /// Builds `(p)*`.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn zero_or_more(&mut self, p: PatternId) -> Result<PatternId> {
        if p == PatternId::EMPTY || p == PatternId::NONE {
            return Ok(PatternId::EMPTY);
        }
        if p == PatternId::ZANY || matches!(self.node(p), Node::ZeroOrMore(_)) {
            return Ok(p);
        }
        self.intern(Node::ZeroOrMore(p))
    }

    /// Builds `!(p)`.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the arena is full.
    pub fn not(&mut self, p: PatternId) -> Result<PatternId> {
        if let Node::Not(inner) = self.node(p) {
            return Ok(*inner);
        }
        self.intern(Node::Not(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_foundation::{ErrorKind, Value};
    use sylva_language::{Registry, parse};

    fn lowered(text: &str) -> (Arena, PatternId) {
        let registry = Registry::standard();
        let mut arena = Arena::new();
        let top = arena
            .lower_grammar(&parse(text).unwrap(), &Composer::new(&registry))
            .unwrap();
        (arena, top)
    }

    fn name(arena: &mut Arena, label: &str) -> PatternId {
        arena.tree(NameExpr::name(label), PatternId::ZANY).unwrap()
    }

    #[test]
    fn reserved_ids() {
        let arena = Arena::new();
        assert_eq!(arena.node(PatternId::EMPTY), &Node::Empty);
        assert_eq!(arena.node(PatternId::ZANY), &Node::ZAny);
        assert_eq!(arena.node(PatternId::NONE), &Node::Not(PatternId::ZANY));
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn equal_structures_share_ids() {
        let mut arena = Arena::new();
        let a = name(&mut arena, "a");
        let b = name(&mut arena, "b");
        let x = arena.concat(a, b).unwrap();
        let y = arena.concat(a, b).unwrap();
        assert_eq!(x, y);
        assert_eq!(arena.tree(NameExpr::name("a"), PatternId::ZANY).unwrap(), a);
    }

    #[test]
    fn or_is_flattened_sorted_and_deduplicated() {
        let mut arena = Arena::new();
        let a = name(&mut arena, "a");
        let b = name(&mut arena, "b");
        let c = name(&mut arena, "c");
        let ab = arena.or(a, b).unwrap();
        let left = arena.or(ab, c).unwrap();
        let bc = arena.or(c, b).unwrap();
        let right = arena.or(bc, a).unwrap();
        assert_eq!(left, right);
        assert_eq!(arena.node(left), &Node::Or(vec![a, b, c]));
        assert_eq!(arena.or(a, a).unwrap(), a);
    }

    #[test]
    fn identities_and_absorbers() {
        let mut arena = Arena::new();
        let a = name(&mut arena, "a");
        assert_eq!(arena.or(a, PatternId::NONE).unwrap(), a);
        assert_eq!(arena.or(a, PatternId::ZANY).unwrap(), PatternId::ZANY);
        assert_eq!(arena.and(a, PatternId::ZANY).unwrap(), a);
        assert_eq!(arena.and(a, PatternId::NONE).unwrap(), PatternId::NONE);
        assert_eq!(arena.and(a, a).unwrap(), a);
        assert_eq!(arena.concat(PatternId::EMPTY, a).unwrap(), a);
        assert_eq!(arena.concat(a, PatternId::NONE).unwrap(), PatternId::NONE);
        assert_eq!(arena.interleave(PatternId::EMPTY, a).unwrap(), a);
        assert_eq!(arena.zero_or_more(PatternId::NONE).unwrap(), PatternId::EMPTY);
    }

    #[test]
    fn double_negation_cancels() {
        let mut arena = Arena::new();
        let a = name(&mut arena, "a");
        let not_a = arena.not(a).unwrap();
        assert_eq!(arena.not(not_a).unwrap(), a);
        assert_eq!(arena.not(PatternId::ZANY).unwrap(), PatternId::NONE);
        assert_eq!(arena.not(PatternId::NONE).unwrap(), PatternId::ZANY);
    }

    #[test]
    fn interleave_is_commutative() {
        let mut arena = Arena::new();
        let a = name(&mut arena, "a");
        let b = name(&mut arena, "b");
        assert_eq!(arena.interleave(a, b).unwrap(), arena.interleave(b, a).unwrap());
    }

    #[test]
    fn equal_predicates_share_ids() {
        let (arena, top) = lowered("(a == 1 | b == 1)");
        let Node::Or(items) = arena.node(top) else {
            panic!("expected an or");
        };
        let preds: Vec<PredId> = items
            .iter()
            .map(|&id| match arena.node(id) {
                Node::Tree { child, .. } => match arena.node(*child) {
                    Node::Leaf(pred) => *pred,
                    other => panic!("expected a leaf, got {other:?}"),
                },
                other => panic!("expected a tree, got {other:?}"),
            })
            .collect();
        assert_eq!(preds[0], preds[1]);
        assert_eq!(arena.predicate_count(), 1);
    }

    #[test]
    fn references_resolve_to_productions() {
        let (arena, top) = lowered("#main = @item\n#item = x: *");
        let Node::Ref(id) = arena.node(top) else {
            panic!("expected a reference");
        };
        let item = arena.production(*id);
        assert!(matches!(
            arena.node(item),
            Node::Tree { name: NameExpr::Name(Value::String(s)), .. } if &**s == "x"
        ));
    }

    #[test]
    fn unresolved_reference_fails() {
        let registry = Registry::standard();
        let err = Arena::new()
            .lower_grammar(&parse("#main = @nope").unwrap(), &Composer::new(&registry))
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnresolvedReference(ref n) if n == "nope"));
        assert_eq!(err.context.unwrap().stack, vec!["production main".to_string()]);
    }

    #[test]
    fn pattern_limit() {
        let mut arena = Arena::with_max_patterns(Some(4));
        let _a = name(&mut arena, "a");
        let err = arena.tree(NameExpr::name("b"), PatternId::ZANY).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::LimitExceeded(SemanticLimit::MaxPatterns { limit: 4 })
        ));
    }
}
