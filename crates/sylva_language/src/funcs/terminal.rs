//! Constants, variables and list literals.

use std::fmt;

use sylva_foundation::{Result, Type, Value};

use super::{Func, Function};
use crate::context::Context;

/// A literal value.
#[derive(Debug)]
pub struct Constant {
    value: Value,
}

impl Constant {
    /// Creates a constant.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Function for Constant {
    fn name(&self) -> &str {
        "const"
    }

    fn output(&self) -> Type {
        self.value.value_type()
    }

    fn params(&self) -> &[Func] {
        &[]
    }

    fn eval(&self, _ctx: &Context) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn literal(&self) -> Option<&Value> {
        Some(&self.value)
    }

    fn fmt_canonical(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// The current leaf value read as a fixed type.
#[derive(Debug)]
pub struct Variable {
    ty: Type,
    name: String,
}

impl Variable {
    /// Creates a variable of a single type.
    #[must_use]
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            name: format!("${}", ty.keyword()),
        }
    }
}

impl Function for Variable {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> Type {
        self.ty
    }

    fn params(&self) -> &[Func] {
        &[]
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        ctx.read(self.ty)
    }

    fn has_variable(&self) -> bool {
        true
    }

    fn fmt_canonical(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A list built element-wise from composed expressions.
#[derive(Debug)]
pub struct ListOf {
    ty: Type,
    elems: Vec<Func>,
}

impl ListOf {
    /// Creates a list of the given list type.
    #[must_use]
    pub fn new(ty: Type, elems: Vec<Func>) -> Self {
        Self { ty, elems }
    }
}

impl Function for ListOf {
    fn name(&self) -> &str {
        "list"
    }

    fn output(&self) -> Type {
        self.ty
    }

    fn params(&self) -> &[Func] {
        &self.elems
    }

    fn eval(&self, ctx: &Context) -> Result<Value> {
        let items = self
            .elems
            .iter()
            .map(|e| e.eval(ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::list(items))
    }

    fn fmt_canonical(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.ty.keyword())?;
        for (i, e) in self.elems.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            e.fmt_canonical(f)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn show(f: &dyn Function) -> String {
        f.to_string()
    }

    #[test]
    fn constant_prints_literal() {
        assert_eq!(show(&Constant::new(Value::Uint(3))), "uint(3)");
        assert_eq!(show(&Constant::new(Value::from("a"))), "\"a\"");
        assert_eq!(Constant::new(Value::Double(2.0)).output(), Type::Double);
    }

    #[test]
    fn variable_reads_context() {
        let mut ctx = Context::new();
        ctx.set_current(Value::from("x"));
        assert_eq!(Variable::new(Type::String).eval(&ctx).unwrap(), Value::from("x"));
        assert!(Variable::new(Type::Bool).eval(&ctx).is_err());
    }

    #[test]
    fn list_evaluates_elements() {
        let elems: Vec<Func> = vec![
            Arc::new(Constant::new(Value::Int(1))),
            Arc::new(Variable::new(Type::Int)),
        ];
        let list = ListOf::new(Type::IntList, elems);
        let mut ctx = Context::new();
        ctx.set_current(Value::Int(2));
        assert_eq!(
            list.eval(&ctx).unwrap(),
            Value::list(vec![Value::Int(1), Value::Int(2)])
        );
        assert!(list.has_variable());
        assert_eq!(show(&list), "[]int{1, $int}");
    }
}
