//! Numeric and length checks used by JSON-Schema translations.

use std::sync::Arc;

use sylva_foundation::{Error, ErrorKind, Result, Type, Value};

use super::{Func, Function, arity, constant, eval_double, eval_str};
use crate::context::Context;

/// `multipleOf(double, const double)`.
#[derive(Debug)]
pub struct MultipleOf {
    divisor: f64,
    params: [Func; 2],
}

impl Function for MultipleOf {
    fn name(&self) -> &str {
        "multipleOf"
    }

    fn output(&self) -> Type {
        Type::Bool
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        let n = eval_double(self.params[0].as_ref(), ctx)?;
        let quotient = n / self.divisor;
        Ok(Value::Bool(quotient.is_finite() && quotient.fract() == 0.0))
    }
}

/// Constructs `multipleOf`.
///
/// # Errors
/// Returns an invalid argument error unless the divisor is positive.
pub fn multiple_of(params: Vec<Func>) -> Result<Func> {
    let params = arity::<2>("multipleOf", params)?;
    let divisor = match constant(params[1].as_ref())? {
        Value::Double(d) if d > 0.0 => d,
        other => {
            return Err(Error::new(ErrorKind::InvalidArgument {
                function: "multipleOf".to_string(),
                message: format!("divisor must be positive, got {other}"),
            }));
        }
    };
    Ok(Arc::new(MultipleOf { divisor, params }))
}

/// Reads the current value as a number: `integer()` and `number()`.
#[derive(Debug)]
pub struct NumberReading {
    integral_only: bool,
}

impl Function for NumberReading {
    fn name(&self) -> &str {
        if self.integral_only { "integer" } else { "number" }
    }

    fn output(&self) -> Type {
        Type::Double
    }

    fn params(&self) -> &[Func] {
        &[]
    }

    fn has_variable(&self) -> bool {
        true
    }

    #[allow(clippy::cast_precision_loss)]
    fn eval(&self, ctx: &Context) -> Result<Value> {
        let reading = ctx
            .read(Type::Uint)
            .map(|v| v.as_uint().map(|u| u as f64))
            .or_else(|_| ctx.read(Type::Int).map(|v| v.as_int().map(|i| i as f64)));
        let reading = if self.integral_only {
            reading
        } else {
            reading.or_else(|_| ctx.read(Type::Double).map(|v| v.as_double()))
        }?;
        reading
            .map(Value::Double)
            .ok_or_else(|| Error::internal("numeric reading produced no number"))
    }
}

/// Constructs `integer()`: the current value as a double if it is an integer.
///
/// # Errors
/// Returns an arity error if given parameters.
pub fn integer(params: Vec<Func>) -> Result<Func> {
    arity::<0>("integer", params)?;
    Ok(Arc::new(NumberReading {
        integral_only: true,
    }))
}

/// Constructs `number()`: the current value as a double if it is any number.
///
/// # Errors
/// Returns an arity error if given parameters.
pub fn number(params: Vec<Func>) -> Result<Func> {
    arity::<0>("number", params)?;
    Ok(Arc::new(NumberReading {
        integral_only: false,
    }))
}

/// `maxLength` / `minLength` over characters.
#[derive(Debug)]
pub struct LengthBound {
    max: bool,
    bound: i64,
    params: [Func; 2],
}

impl Function for LengthBound {
    fn name(&self) -> &str {
        if self.max { "maxLength" } else { "minLength" }
    }

    fn output(&self) -> Type {
        Type::Bool
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        let s = eval_str(self.params[0].as_ref(), ctx)?;
        let len = i64::try_from(s.chars().count()).unwrap_or(i64::MAX);
        Ok(Value::Bool(if self.max {
            len <= self.bound
        } else {
            len >= self.bound
        }))
    }
}

fn length_bound(max: bool, params: Vec<Func>) -> Result<Func> {
    let name = if max { "maxLength" } else { "minLength" };
    let params = arity::<2>(name, params)?;
    let bound = match constant(params[1].as_ref())? {
        Value::Int(n) => n,
        other => return Err(Error::type_mismatch(Type::Int, other.value_type())),
    };
    Ok(Arc::new(LengthBound { max, bound, params }))
}

/// Constructs `maxLength(string, const int)`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn max_length(params: Vec<Func>) -> Result<Func> {
    length_bound(true, params)
}

/// Constructs `minLength(string, const int)`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn min_length(params: Vec<Func>) -> Result<Func> {
    length_bound(false, params)
}
