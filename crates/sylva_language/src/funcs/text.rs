//! String, byte and list helpers, including compiled regular expressions.

use std::sync::Arc;

use sylva_foundation::{Error, ErrorKind, Result, Type, Value};

use super::{Func, Function, arity, constant, eval_int, eval_str};
use crate::context::Context;

/// Which helper a [`Helper`] computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Contains,
    HasPrefix,
    HasSuffix,
    Length,
    ToLower,
    ToUpper,
    Elem,
}

impl Op {
    const fn name(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::HasPrefix => "hasPrefix",
            Self::HasSuffix => "hasSuffix",
            Self::Length => "length",
            Self::ToLower => "toLower",
            Self::ToUpper => "toUpper",
            Self::Elem => "elem",
        }
    }
}

/// A string, bytes or list helper function.
#[derive(Debug)]
pub struct Helper {
    op: Op,
    output: Type,
    params: Vec<Func>,
}

impl Function for Helper {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn output(&self) -> Type {
        self.output
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        match self.op {
            Op::Contains => {
                let needle = self.params[0].eval(ctx)?;
                let haystack = self.params[1].eval(ctx)?;
                let found = match (&needle, &haystack) {
                    (Value::String(s), Value::String(sub)) => s.contains(&**sub),
                    (item, Value::List(items)) => items.iter().any(|i| i == item),
                    _ => return Err(self.mismatch(&haystack)),
                };
                Ok(Value::Bool(found))
            }
            Op::HasPrefix | Op::HasSuffix => {
                let value = self.params[0].eval(ctx)?;
                let affix = self.params[1].eval(ctx)?;
                let prefix = self.op == Op::HasPrefix;
                let found = match (&value, &affix) {
                    (Value::String(s), Value::String(a)) if prefix => s.starts_with(&**a),
                    (Value::String(s), Value::String(a)) => s.ends_with(&**a),
                    (Value::Bytes(b), Value::Bytes(a)) if prefix => b.starts_with(a),
                    (Value::Bytes(b), Value::Bytes(a)) => b.ends_with(a),
                    _ => return Err(self.mismatch(&value)),
                };
                Ok(Value::Bool(found))
            }
            Op::Length => {
                let value = self.params[0].eval(ctx)?;
                let len = match &value {
                    Value::String(s) => s.chars().count(),
                    Value::Bytes(b) => b.len(),
                    Value::List(items) => items.len(),
                    _ => return Err(self.mismatch(&value)),
                };
                i64::try_from(len)
                    .map(Value::Int)
                    .map_err(|_| Error::eval(format!("length {len} does not fit in int")))
            }
            Op::ToLower => Ok(Value::from(eval_str(self.params[0].as_ref(), ctx)?.to_lowercase())),
            Op::ToUpper => Ok(Value::from(eval_str(self.params[0].as_ref(), ctx)?.to_uppercase())),
            Op::Elem => {
                let list = self.params[0].eval(ctx)?;
                let index = eval_int(self.params[1].as_ref(), ctx)?;
                let Value::List(items) = &list else {
                    return Err(self.mismatch(&list));
                };
                usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        Error::new(ErrorKind::IndexOutOfBounds {
                            index,
                            length: items.len(),
                        })
                    })
            }
        }
    }
}

impl Helper {
    fn mismatch(&self, value: &Value) -> Error {
        Error::internal(format!(
            "{} received an unexpected {} value",
            self.op.name(),
            value.value_type()
        ))
    }
}

fn build(op: Op, output: Type, params: Vec<Func>) -> Func {
    Arc::new(Helper { op, output, params })
}

/// Constructs `contains(string, string)` or `contains(T, []T)`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn contains(params: Vec<Func>) -> Result<Func> {
    let params = arity::<2>("contains", params)?;
    Ok(build(Op::Contains, Type::Bool, params.into()))
}

/// Constructs `hasPrefix`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn has_prefix(params: Vec<Func>) -> Result<Func> {
    let params = arity::<2>("hasPrefix", params)?;
    Ok(build(Op::HasPrefix, Type::Bool, params.into()))
}

/// Constructs `hasSuffix`.
///
/// # Errors
/// Returns an arity error unless given two parameters.
pub fn has_suffix(params: Vec<Func>) -> Result<Func> {
    let params = arity::<2>("hasSuffix", params)?;
    Ok(build(Op::HasSuffix, Type::Bool, params.into()))
}

/// Constructs `length`; strings count characters.
///
/// # Errors
/// Returns an arity error unless given one parameter.
pub fn length(params: Vec<Func>) -> Result<Func> {
    let params = arity::<1>("length", params)?;
    Ok(build(Op::Length, Type::Int, params.into()))
}

/// Constructs `toLower`.
///
/// # Errors
/// Returns an arity error unless given one parameter.
pub fn to_lower(params: Vec<Func>) -> Result<Func> {
    let params = arity::<1>("toLower", params)?;
    Ok(build(Op::ToLower, Type::String, params.into()))
}

/// Constructs `toUpper`.
///
/// # Errors
/// Returns an arity error unless given one parameter.
pub fn to_upper(params: Vec<Func>) -> Result<Func> {
    let params = arity::<1>("toUpper", params)?;
    Ok(build(Op::ToUpper, Type::String, params.into()))
}

/// Constructs `elem([]T, int) -> T`.
///
/// # Errors
/// Returns an arity error unless given two parameters, or a type error
/// if the first is not a list.
pub fn elem(params: Vec<Func>) -> Result<Func> {
    let params = arity::<2>("elem", params)?;
    let list = params[0].output();
    let output = list
        .element()
        .ok_or_else(|| Error::type_mismatch(Type::IntList, list))?;
    Ok(build(Op::Elem, output, params.into()))
}

/// `regex(const string, string)`, compiled once at construction.
#[derive(Debug)]
pub struct Regex {
    compiled: regex::Regex,
    params: [Func; 2],
}

impl Function for Regex {
    fn name(&self) -> &str {
        "regex"
    }

    fn output(&self) -> Type {
        Type::Bool
    }

    fn params(&self) -> &[Func] {
        &self.params
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        let s = eval_str(self.params[1].as_ref(), ctx)?;
        Ok(Value::Bool(self.compiled.is_match(&s)))
    }
}

/// Constructs `regex`.
///
/// # Errors
/// Returns an invalid argument error if the pattern does not compile.
pub fn regex(params: Vec<Func>) -> Result<Func> {
    let params = arity::<2>("regex", params)?;
    let pattern = constant(params[0].as_ref())?;
    let pattern = pattern
        .as_str()
        .ok_or_else(|| Error::type_mismatch(Type::String, pattern.value_type()))?;
    let compiled = regex::Regex::new(pattern).map_err(|e| {
        Error::new(ErrorKind::InvalidArgument {
            function: "regex".to_string(),
            message: e.to_string(),
        })
    })?;
    Ok(Arc::new(Regex { compiled, params }))
}
