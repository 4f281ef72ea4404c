//! Equality and ordering comparisons.

use std::cmp::Ordering;
use std::sync::Arc;

use sylva_foundation::{Result, Type, Value};

use super::{Func, Function, arity};
use crate::context::Context;

/// A comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `eq`
    Eq,
    /// `ne`
    Ne,
    /// `lt`
    Lt,
    /// `le`
    Le,
    /// `gt`
    Gt,
    /// `ge`
    Ge,
}

impl CompareOp {
    /// Returns the registered function name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }

    /// Applies the operator to an ordering; `None` (NaN) only satisfies `ne`.
    #[must_use]
    pub fn holds(self, ord: Option<Ordering>) -> bool {
        match self {
            Self::Eq => ord == Some(Ordering::Equal),
            Self::Ne => ord != Some(Ordering::Equal),
            Self::Lt => ord == Some(Ordering::Less),
            Self::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            Self::Gt => ord == Some(Ordering::Greater),
            Self::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

/// Compares two values of the same type.
#[derive(Debug)]
pub struct Comparison {
    op: CompareOp,
    params: [Func; 2],
}

impl Comparison {
    /// Creates a comparison.
    #[must_use]
    pub fn new(op: CompareOp, left: Func, right: Func) -> Self {
        Self {
            op,
            params: [left, right],
        }
    }
}

impl Function for Comparison {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn output(&self) -> Type {
        Type::Bool
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        let left = self.params[0].eval(ctx)?;
        let right = self.params[1].eval(ctx)?;
        Ok(Value::Bool(self.op.holds(left.partial_cmp(&right))))
    }
}

fn build(op: CompareOp, params: Vec<Func>) -> Result<Func> {
    let [left, right] = arity(op.name(), params)?;
    Ok(Arc::new(Comparison::new(op, left, right)))
}

/// Constructs `eq`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn eq(params: Vec<Func>) -> Result<Func> {
    build(CompareOp::Eq, params)
}

/// Constructs `ne`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn ne(params: Vec<Func>) -> Result<Func> {
    build(CompareOp::Ne, params)
}

/// Constructs `lt`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn lt(params: Vec<Func>) -> Result<Func> {
    build(CompareOp::Lt, params)
}

/// Constructs `le`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn le(params: Vec<Func>) -> Result<Func> {
    build(CompareOp::Le, params)
}

/// Constructs `gt`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn gt(params: Vec<Func>) -> Result<Func> {
    build(CompareOp::Gt, params)
}

/// Constructs `ge`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn ge(params: Vec<Func>) -> Result<Func> {
    build(CompareOp::Ge, params)
}
