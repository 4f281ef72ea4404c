//! Compiled expression values.
//!
//! The composer turns [`Expr`](crate::ast::Expr) trees into [`Func`]s:
//! shared, thread-safe objects that evaluate against a [`Context`],
//! print canonically, and can be hashed and totally ordered so that the
//! engine can intern structurally equal predicates.
//!
//! Hosts add functions by implementing [`Function`] and registering a
//! [`Signature`] whose constructor builds it.

pub mod compare;
pub mod logic;
pub mod schema;
pub mod terminal;
pub mod text;

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sylva_foundation::{Error, Result, Type, Value};

use crate::context::Context;
use crate::registry::{Registry, Signature};

/// A compiled expression.
pub trait Function: fmt::Debug + Send + Sync {
    /// The function name, used for hashing, ordering and printing.
    fn name(&self) -> &str;

    /// The type every successful evaluation produces.
    fn output(&self) -> Type;

    /// The composed parameters.
    fn params(&self) -> &[Func];

    /// Evaluates against the context.
    ///
    /// # Errors
    /// Returns an evaluation error when a variable cannot read the current
    /// value or the function itself fails.
    fn eval(&self, ctx: &Context) -> Result<Value>;

    /// The payload of a constant, if this is one.
    fn literal(&self) -> Option<&Value> {
        None
    }

    /// True when evaluation depends on the context.
    fn has_variable(&self) -> bool {
        self.params().iter().any(|p| p.has_variable())
    }

    /// Structural hash over name, output type, parameters and literal.
    fn hash_code(&self) -> u64 {
        let mut h = combine(17, hash_of(self.name()));
        h = combine(h, u64::from(self.output().code().unsigned_abs()));
        for p in self.params() {
            h = combine(h, p.hash_code());
        }
        if let Some(value) = self.literal() {
            h = combine(h, hash_of(value));
        }
        h
    }

    /// Total order: hash, then name, then parameters, then literal payload.
    fn compare(&self, other: &dyn Function) -> Ordering {
        self.hash_code()
            .cmp(&other.hash_code())
            .then_with(|| self.name().cmp(other.name()))
            .then_with(|| self.output().cmp(&other.output()))
            .then_with(|| compare_params(self.params(), other.params()))
            .then_with(|| match (self.literal(), other.literal()) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
    }

    /// Writes the canonical, parseable form.
    ///
    /// # Errors
    /// Propagates formatter errors.
    fn fmt_canonical(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, p) in self.params().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            p.fmt_canonical(f)?;
        }
        f.write_str(")")
    }
}

/// A shared compiled expression.
pub type Func = Arc<dyn Function>;

impl fmt::Display for dyn Function + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_canonical(f)
    }
}

fn compare_params(a: &[Func], b: &[Func]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = x.compare(y.as_ref());
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Mixes one part into a running structural hash.
#[must_use]
pub fn combine(h: u64, part: u64) -> u64 {
    h.wrapping_mul(31).wrapping_add(part)
}

/// Hashes any value with the deterministic default hasher.
#[must_use]
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Evaluates a boolean predicate.
///
/// # Errors
/// Returns the predicate's evaluation error, or an internal error if it
/// produced something other than a boolean.
pub fn eval_predicate(f: &dyn Function, ctx: &Context) -> Result<bool> {
    match f.eval(ctx)? {
        Value::Bool(b) => Ok(b),
        other => Err(unexpected_output(f, Type::Bool, &other)),
    }
}

pub(crate) fn eval_double(f: &dyn Function, ctx: &Context) -> Result<f64> {
    match f.eval(ctx)? {
        Value::Double(n) => Ok(n),
        other => Err(unexpected_output(f, Type::Double, &other)),
    }
}

pub(crate) fn eval_int(f: &dyn Function, ctx: &Context) -> Result<i64> {
    match f.eval(ctx)? {
        Value::Int(n) => Ok(n),
        other => Err(unexpected_output(f, Type::Int, &other)),
    }
}

pub(crate) fn eval_str(f: &dyn Function, ctx: &Context) -> Result<Arc<str>> {
    match f.eval(ctx)? {
        Value::String(s) => Ok(s),
        other => Err(unexpected_output(f, Type::String, &other)),
    }
}

fn unexpected_output(f: &dyn Function, expected: Type, actual: &Value) -> Error {
    Error::internal(format!(
        "{f} produced a {} where {expected} was expected",
        actual.value_type()
    ))
}

/// Splits composed parameters into a fixed-size array.
pub(crate) fn arity<const N: usize>(function: &str, params: Vec<Func>) -> Result<[Func; N]> {
    <[Func; N]>::try_from(params)
        .map_err(|params| Error::arity_mismatch(function, N.to_string(), params.len()))
}

/// Evaluates a constant parameter at construction time.
pub(crate) fn constant(f: &dyn Function) -> Result<Value> {
    f.eval(&Context::new())
}

/// Installs the built-in function table.
pub(crate) fn install_standard(registry: &mut Registry) {
    use Type::{Bool, Bytes, Double, Int, Uint};

    for ty in Type::SINGLES {
        registry.register(Signature::new("eq", &[ty, ty], Bool, compare::eq));
        registry.register(Signature::new("ne", &[ty, ty], Bool, compare::ne));
        registry.register(Signature::new("type", &[ty], Bool, logic::type_test));
        if let Some(list) = ty.list_of() {
            registry.register(Signature::new("contains", &[ty, list], Bool, text::contains));
            registry.register(Signature::new("elem", &[list, Int], ty, text::elem));
            registry.register(Signature::new("length", &[list], Int, text::length));
        }
    }
    for ty in [Double, Int, Uint, Type::String, Bytes] {
        registry.register(Signature::new("lt", &[ty, ty], Bool, compare::lt));
        registry.register(Signature::new("le", &[ty, ty], Bool, compare::le));
        registry.register(Signature::new("gt", &[ty, ty], Bool, compare::gt));
        registry.register(Signature::new("ge", &[ty, ty], Bool, compare::ge));
    }

    registry.register(Signature::new("not", &[Bool], Bool, logic::not));
    registry.register(Signature::new("and", &[Bool, Bool], Bool, logic::and));
    registry.register(Signature::new("or", &[Bool, Bool], Bool, logic::or));

    let string = Type::String;
    registry.register(Signature::new("contains", &[string, string], Bool, text::contains));
    for ty in [string, Bytes] {
        registry.register(Signature::new("hasPrefix", &[ty, ty], Bool, text::has_prefix));
        registry.register(Signature::new("hasSuffix", &[ty, ty], Bool, text::has_suffix));
        registry.register(Signature::new("length", &[ty], Int, text::length));
    }
    registry.register(Signature::new("toLower", &[string], string, text::to_lower));
    registry.register(Signature::new("toUpper", &[string], string, text::to_upper));
    registry.register(
        Signature::new("regex", &[string, string], Bool, text::regex).with_constant(0),
    );

    registry.register(
        Signature::new("multipleOf", &[Double, Double], Bool, schema::multiple_of)
            .with_constant(1),
    );
    registry.register(Signature::new("integer", &[], Double, schema::integer));
    registry.register(Signature::new("number", &[], Double, schema::number));
    registry.register(
        Signature::new("maxLength", &[string, Int], Bool, schema::max_length).with_constant(1),
    );
    registry.register(
        Signature::new("minLength", &[string, Int], Bool, schema::min_length).with_constant(1),
    );
}
