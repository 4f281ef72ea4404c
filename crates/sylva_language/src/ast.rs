//! Abstract syntax tree for tree grammars.
//!
//! A [`Grammar`] is an arena of named productions. Each production is a
//! [`Pattern`] over tree events, whose leaves embed [`Expr`] predicates
//! over scalar values. The whole tree is immutable once built; matchers
//! compile their own representations from it.

use sylva_foundation::{Type, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Grammar
// =============================================================================

/// Index of a production within a [`Grammar`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeclId(pub u32);

impl DeclId {
    /// The top-level production.
    pub const MAIN: DeclId = DeclId(0);

    /// Returns the index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named production.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternDecl {
    /// Production name, referenced by `@name`.
    pub name: String,
    /// The production's pattern.
    pub pattern: Pattern,
}

/// An arena of named productions; production 0 is `main`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grammar {
    decls: Vec<PatternDecl>,
}

impl Grammar {
    /// Name of the top-level production.
    pub const MAIN: &'static str = "main";

    /// Creates a grammar whose top-level production is `top`.
    #[must_use]
    pub fn new(top: Pattern) -> Self {
        Self {
            decls: vec![PatternDecl {
                name: Self::MAIN.to_string(),
                pattern: top,
            }],
        }
    }

    /// Adds a named production, replacing any production with the same name.
    #[must_use]
    pub fn with_decl(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        let name = name.into();
        if let Some(existing) = self.decls.iter_mut().find(|d| d.name == name) {
            existing.pattern = pattern;
        } else {
            self.decls.push(PatternDecl { name, pattern });
        }
        self
    }

    /// Returns the top-level pattern.
    #[must_use]
    pub fn top(&self) -> &Pattern {
        &self.decls[0].pattern
    }

    /// Returns all productions, `main` first.
    #[must_use]
    pub fn decls(&self) -> &[PatternDecl] {
        &self.decls
    }

    /// Returns the number of productions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Always false: a grammar has at least its `main` production.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Looks up a production's pattern by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Pattern> {
        self.decls
            .iter()
            .find(|d| d.name == name)
            .map(|d| &d.pattern)
    }

    /// Returns the id of a production by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<DeclId> {
        self.decls
            .iter()
            .position(|d| d.name == name)
            .and_then(|i| u32::try_from(i).ok())
            .map(DeclId)
    }

    /// Returns a production by id.
    #[must_use]
    pub fn get(&self, id: DeclId) -> Option<&PatternDecl> {
        self.decls.get(id.index())
    }
}

// =============================================================================
// Pattern
// =============================================================================

/// A tree pattern.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Pattern {
    /// Matches only the end of the sibling sequence.
    Empty,
    /// One tree node whose label matches `name`, with children matching `pattern`.
    TreeNode {
        /// Label matcher.
        name: NameExpr,
        /// Pattern for the node's children.
        pattern: Box<Pattern>,
    },
    /// One leaf for which the boolean expression holds.
    LeafNode(Expr),
    /// Sequence.
    Concat(Box<Pattern>, Box<Pattern>),
    /// Union.
    Or(Box<Pattern>, Box<Pattern>),
    /// Intersection.
    And(Box<Pattern>, Box<Pattern>),
    /// Kleene star.
    ZeroOrMore(Box<Pattern>),
    /// `Or(Empty, p)`.
    Optional(Box<Pattern>),
    /// Unordered composition.
    Interleave(Box<Pattern>, Box<Pattern>),
    /// Complement.
    Not(Box<Pattern>),
    /// Any sibling sequence.
    ZAny,
    /// Somewhere among the siblings, `p` matches a contiguous run.
    Contains(Box<Pattern>),
    /// Named production in the same grammar.
    Reference(String),
}

impl Pattern {
    /// Creates a tree node pattern.
    #[must_use]
    pub fn tree(name: NameExpr, pattern: Pattern) -> Self {
        Self::TreeNode {
            name,
            pattern: Box::new(pattern),
        }
    }

    /// Creates a leaf pattern.
    #[must_use]
    pub fn leaf(expr: Expr) -> Self {
        Self::LeafNode(expr)
    }

    /// Creates a sequence.
    #[must_use]
    pub fn concat(left: Pattern, right: Pattern) -> Self {
        Self::Concat(Box::new(left), Box::new(right))
    }

    /// Creates a union.
    #[must_use]
    pub fn or(left: Pattern, right: Pattern) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Creates an intersection.
    #[must_use]
    pub fn and(left: Pattern, right: Pattern) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Creates an unordered composition.
    #[must_use]
    pub fn interleave(left: Pattern, right: Pattern) -> Self {
        Self::Interleave(Box::new(left), Box::new(right))
    }

    /// Creates a Kleene star.
    #[must_use]
    pub fn zero_or_more(pattern: Pattern) -> Self {
        Self::ZeroOrMore(Box::new(pattern))
    }

    /// Creates an optional pattern.
    #[must_use]
    pub fn optional(pattern: Pattern) -> Self {
        Self::Optional(Box::new(pattern))
    }

    /// Creates a complement.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(pattern: Pattern) -> Self {
        Self::Not(Box::new(pattern))
    }

    /// Creates an existential pattern.
    #[must_use]
    pub fn contains(pattern: Pattern) -> Self {
        Self::Contains(Box::new(pattern))
    }

    /// Creates a reference to a named production.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// Folds patterns into a right-nested union. Returns `None` when empty.
    #[must_use]
    pub fn or_all(patterns: Vec<Pattern>) -> Option<Self> {
        fold_right(patterns, Self::or)
    }

    /// Folds patterns into a right-nested intersection.
    #[must_use]
    pub fn and_all(patterns: Vec<Pattern>) -> Option<Self> {
        fold_right(patterns, Self::and)
    }

    /// Folds patterns into a right-nested sequence.
    #[must_use]
    pub fn concat_all(patterns: Vec<Pattern>) -> Option<Self> {
        fold_right(patterns, Self::concat)
    }

    /// Folds patterns into a right-nested interleave.
    #[must_use]
    pub fn interleave_all(patterns: Vec<Pattern>) -> Option<Self> {
        fold_right(patterns, Self::interleave)
    }

    /// Visits this pattern and every nested pattern, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Pattern)) {
        visit(self);
        match self {
            Self::Empty | Self::ZAny | Self::LeafNode(_) | Self::Reference(_) => {}
            Self::TreeNode { pattern, .. }
            | Self::ZeroOrMore(pattern)
            | Self::Optional(pattern)
            | Self::Not(pattern)
            | Self::Contains(pattern) => pattern.walk(visit),
            Self::Concat(l, r) | Self::Or(l, r) | Self::And(l, r) | Self::Interleave(l, r) => {
                l.walk(visit);
                r.walk(visit);
            }
        }
    }
}

fn fold_right(patterns: Vec<Pattern>, join: fn(Pattern, Pattern) -> Pattern) -> Option<Pattern> {
    let mut iter = patterns.into_iter().rev();
    let last = iter.next()?;
    Some(iter.fold(last, |acc, p| join(p, acc)))
}

// =============================================================================
// NameExpr
// =============================================================================

/// Matcher for tree node labels.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NameExpr {
    /// Exactly this label.
    Name(Value),
    /// Any label.
    AnyName,
    /// Any label the inner expression rejects.
    AnyNameExcept(Box<NameExpr>),
    /// Either side.
    NameChoice(Box<NameExpr>, Box<NameExpr>),
}

impl NameExpr {
    /// Creates an exact-label matcher.
    #[must_use]
    pub fn name(value: impl Into<Value>) -> Self {
        Self::Name(value.into())
    }

    /// Creates a complement matcher.
    #[must_use]
    pub fn except(inner: NameExpr) -> Self {
        Self::AnyNameExcept(Box::new(inner))
    }

    /// Creates a choice matcher.
    #[must_use]
    pub fn choice(left: NameExpr, right: NameExpr) -> Self {
        Self::NameChoice(Box::new(left), Box::new(right))
    }

    /// Returns true if `label` is accepted.
    ///
    /// Signed and unsigned integer labels compare numerically.
    #[must_use]
    pub fn matches(&self, label: &Value) -> bool {
        match self {
            Self::Name(name) => name.name_eq(label),
            Self::AnyName => true,
            Self::AnyNameExcept(inner) => !inner.matches(label),
            Self::NameChoice(left, right) => left.matches(label) || right.matches(label),
        }
    }
}

// =============================================================================
// Expr
// =============================================================================

/// A typed expression embedded in a leaf pattern.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// A literal or a variable.
    Terminal(Terminal),
    /// A homogeneous list, `[]int{1, 2}`.
    List {
        /// The list type (`IntList`, ...).
        ty: Type,
        /// Element expressions.
        elems: Vec<Expr>,
    },
    /// A call to a registered function.
    Function {
        /// Function name.
        name: String,
        /// Parameter expressions.
        params: Vec<Expr>,
    },
    /// Operator shorthand such as `== 3`, compared against the current value.
    BuiltIn {
        /// The operator.
        symbol: BuiltInSymbol,
        /// The right-hand operand.
        operand: Box<Expr>,
    },
}

/// A leaf of an expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Terminal {
    /// A constant.
    Literal(Value),
    /// The current leaf value, read as the given type.
    Variable(Type),
}

impl Expr {
    /// Creates a literal expression.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Terminal(Terminal::Literal(value.into()))
    }

    /// Creates a variable expression.
    #[must_use]
    pub fn var(ty: Type) -> Self {
        Self::Terminal(Terminal::Variable(ty))
    }

    /// Creates a function call expression.
    #[must_use]
    pub fn call(name: impl Into<String>, params: Vec<Expr>) -> Self {
        Self::Function {
            name: name.into(),
            params,
        }
    }

    /// Creates a list expression.
    #[must_use]
    pub fn list(ty: Type, elems: Vec<Expr>) -> Self {
        Self::List { ty, elems }
    }

    /// Creates an operator shorthand expression.
    #[must_use]
    pub fn builtin(symbol: BuiltInSymbol, operand: Expr) -> Self {
        Self::BuiltIn {
            symbol,
            operand: Box::new(operand),
        }
    }

    /// Returns the type this expression declares without composition.
    ///
    /// Function calls only have a type once resolved against a registry.
    #[must_use]
    pub fn declared_type(&self) -> Option<Type> {
        match self {
            Self::Terminal(Terminal::Literal(value)) => Some(value.value_type()),
            Self::Terminal(Terminal::Variable(ty)) | Self::List { ty, .. } => Some(*ty),
            Self::BuiltIn { .. } => Some(Type::Bool),
            Self::Function { .. } => None,
        }
    }
}

/// Operator shorthands for leaf predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BuiltInSymbol {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~=`
    Regex,
    /// `*=`
    Contains,
    /// `^=`
    HasPrefix,
    /// `$=`
    HasSuffix,
    /// `::`
    Type,
}

impl BuiltInSymbol {
    /// Returns the operator as written.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Regex => "~=",
            Self::Contains => "*=",
            Self::HasPrefix => "^=",
            Self::HasSuffix => "$=",
            Self::Type => "::",
        }
    }

    /// Returns the registered function the operator desugars to.
    #[must_use]
    pub const fn function(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Regex => "regex",
            Self::Contains => "contains",
            Self::HasPrefix => "hasPrefix",
            Self::HasSuffix => "hasSuffix",
            Self::Type => "type",
        }
    }
}
