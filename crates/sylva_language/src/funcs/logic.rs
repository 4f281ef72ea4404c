//! Boolean connectives and the type test.
//!
//! `and` and `or` evaluate left to right and stop as soon as the result is
//! known. An error on the evaluated side is returned, not swallowed; only
//! `type` turns errors into a value.

use std::sync::Arc;

use sylva_foundation::{Result, Type, Value};

use super::{Func, Function, arity, eval_predicate};
use crate::context::Context;

/// Boolean negation.
#[derive(Debug)]
pub struct Not {
    params: [Func; 1],
}

impl Function for Not {
    fn name(&self) -> &str {
        "not"
    }

    fn output(&self) -> Type {
        Type::Bool
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        Ok(Value::Bool(!eval_predicate(self.params[0].as_ref(), ctx)?))
    }
}

/// Short-circuiting `and` / `or`.
#[derive(Debug)]
pub struct Connective {
    conjunction: bool,
    params: [Func; 2],
}

impl Function for Connective {
    fn name(&self) -> &str {
        if self.conjunction { "and" } else { "or" }
    }

    fn output(&self) -> Type {
        Type::Bool
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        let left = eval_predicate(self.params[0].as_ref(), ctx)?;
        // `and` stops on false, `or` stops on true.
        if left != self.conjunction {
            return Ok(Value::Bool(left));
        }
        eval_predicate(self.params[1].as_ref(), ctx).map(Value::Bool)
    }
}

/// True iff the operand evaluates without error.
#[derive(Debug)]
pub struct TypeTest {
    params: [Func; 1],
}

impl Function for TypeTest {
    fn name(&self) -> &str {
        "type"
    }

    fn output(&self) -> Type {
        Type::Bool
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        Ok(Value::Bool(self.params[0].eval(ctx).is_ok()))
    }
}

/// Constructs `not`.
///
/// # Errors
/// Returns an arity error unless given one parameter.
pub fn not(params: Vec<Func>) -> Result<Func> {
    Ok(Arc::new(Not {
        params: arity("not", params)?,
    }))
}

/// Constructs `and`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn and(params: Vec<Func>) -> Result<Func> {
    Ok(Arc::new(Connective {
        conjunction: true,
        params: arity("and", params)?,
    }))
}

/// Constructs `or`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn or(params: Vec<Func>) -> Result<Func> {
    Ok(Arc::new(Connective {
        conjunction: false,
        params: arity("or", params)?,
    }))
}

/// Constructs `type`.
///
/// # Errors
/// Returns an arity error unless given one parameter.
pub fn type_test(params: Vec<Func>) -> Result<Func> {
    Ok(Arc::new(TypeTest {
        params: arity("type", params)?,
    }))
}
