//! Composer: type-checks expression trees and compiles them into functions.
//!
//! The composer borrows a [`Registry`] read-only. Operator shorthands such
//! as `== 3` are desugared here into ordinary calls against the current
//! value, so the registry never sees them.

use std::sync::Arc;

use sylva_foundation::{Error, ErrorKind, Result, Type};

use crate::ast::{BuiltInSymbol, Expr, Terminal};
use crate::funcs::Func;
use crate::funcs::terminal::{Constant, ListOf, Variable};
use crate::registry::Registry;

/// Compiles [`Expr`] trees against a registry.
#[derive(Clone, Copy, Debug)]
pub struct Composer<'r> {
    registry: &'r Registry,
}

impl<'r> Composer<'r> {
    /// Creates a composer over `registry`.
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Returns the registry this composer resolves against.
    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Composes an expression of any type.
    ///
    /// # Errors
    /// Returns a compose error when a function is unknown, is called with
    /// the wrong arity or types, or receives a non-constant argument in a
    /// constant position.
    pub fn compose(&self, expr: &Expr) -> Result<Func> {
        match expr {
            Expr::Terminal(Terminal::Literal(value)) => {
                if value.is_null() {
                    return Err(Error::unsupported("null literal"));
                }
                Ok(Arc::new(Constant::new(value.clone())))
            }
            Expr::Terminal(Terminal::Variable(ty)) => compose_variable(*ty),
            Expr::List { ty, elems } => self.compose_list(*ty, elems),
            Expr::Function { name, params } => {
                let params = params
                    .iter()
                    .map(|p| self.compose(p))
                    .collect::<Result<Vec<_>>>()?;
                self.call(name, params)
            }
            Expr::BuiltIn { symbol, operand } => self.compose_builtin(*symbol, operand),
        }
    }

    /// Composes a leaf predicate, which must be boolean.
    ///
    /// # Errors
    /// Returns a type mismatch if the expression is not `bool`, or any
    /// error from [`Composer::compose`].
    pub fn compose_predicate(&self, expr: &Expr) -> Result<Func> {
        let f = self.compose(expr)?;
        if f.output() == Type::Bool {
            Ok(f)
        } else {
            Err(Error::type_mismatch(Type::Bool, f.output()))
        }
    }

    /// Resolves `name` against the composed parameters and constructs it.
    ///
    /// # Errors
    /// See [`Registry::resolve`]; also rejects variable-dependent arguments
    /// in constant positions.
    pub fn call(&self, name: &str, params: Vec<Func>) -> Result<Func> {
        let types: Vec<Type> = params.iter().map(|p| p.output()).collect();
        let signature = self.registry.resolve(name, &types)?;
        for (position, (param, arg)) in signature.params.iter().zip(&params).enumerate() {
            if param.constant && arg.has_variable() {
                return Err(Error::new(ErrorKind::NonConstantArgument {
                    function: name.to_string(),
                    position,
                }));
            }
        }
        let f = (signature.constructor)(params)?;
        if f.output() != signature.output {
            return Err(Error::internal(format!(
                "{name} declared {} but constructed {}",
                signature.output,
                f.output()
            )));
        }
        Ok(f)
    }

    fn compose_list(&self, ty: Type, elems: &[Expr]) -> Result<Func> {
        let element = ty.element().ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument {
                function: "list".to_string(),
                message: format!("{ty} is not a list type"),
            })
        })?;
        let mut composed = Vec::with_capacity(elems.len());
        for elem in elems {
            let f = self.compose(elem)?;
            if f.output() != element {
                return Err(Error::type_mismatch(element, f.output()));
            }
            composed.push(f);
        }
        Ok(Arc::new(ListOf::new(ty, composed)))
    }

    fn compose_builtin(&self, symbol: BuiltInSymbol, operand: &Expr) -> Result<Func> {
        let operand = self.compose(operand)?;
        let ty = operand.output();
        let name = symbol.function();
        match symbol {
            BuiltInSymbol::Eq
            | BuiltInSymbol::Ne
            | BuiltInSymbol::Lt
            | BuiltInSymbol::Le
            | BuiltInSymbol::Gt
            | BuiltInSymbol::Ge
            | BuiltInSymbol::HasPrefix
            | BuiltInSymbol::HasSuffix => self.call(name, vec![compose_variable(ty)?, operand]),
            BuiltInSymbol::Regex => self.call(name, vec![operand, compose_variable(Type::String)?]),
            BuiltInSymbol::Contains => {
                // `*= []int{..}` tests membership; `*= "s"` tests substrings.
                let current = ty.element().unwrap_or(ty);
                self.call(name, vec![compose_variable(current)?, operand])
            }
            BuiltInSymbol::Type => self.call(name, vec![operand]),
        }
    }
}

fn compose_variable(ty: Type) -> Result<Func> {
    if !ty.is_single() {
        return Err(Error::new(ErrorKind::InvalidArgument {
            function: format!("${ty}"),
            message: "variables read a single scalar type".to_string(),
        }));
    }
    Ok(Arc::new(Variable::new(ty)))
}

/// Composes `expr` against `registry`.
///
/// # Errors
/// See [`Composer::compose`].
pub fn compose(registry: &Registry, expr: &Expr) -> Result<Func> {
    Composer::new(registry).compose(expr)
}

/// Composes a boolean leaf predicate against `registry`.
///
/// # Errors
/// See [`Composer::compose_predicate`].
pub fn compose_predicate(registry: &Registry, expr: &Expr) -> Result<Func> {
    Composer::new(registry).compose_predicate(expr)
}
