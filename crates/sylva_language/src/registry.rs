//! Registry of typed function signatures.
//!
//! Maps function names to their overloads. The standard table is built by
//! [`Registry::standard`]; hosts register extra functions before composing
//! and only read the registry after that.

use std::collections::HashMap;
use std::fmt;

use sylva_foundation::{Error, Result, Type};

use crate::funcs::Func;

/// Builds a function from composed, type-checked parameters.
pub type Constructor = fn(Vec<Func>) -> Result<Func>;

/// One declared parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param {
    /// The parameter type.
    pub ty: Type,
    /// Whether the argument must not depend on the current value.
    pub constant: bool,
}

/// One overload of a function.
#[derive(Clone, Debug)]
pub struct Signature {
    /// Function name.
    pub name: String,
    /// Declared parameters.
    pub params: Vec<Param>,
    /// Output type.
    pub output: Type,
    /// Constructor invoked after type checking.
    pub constructor: Constructor,
}

impl Signature {
    /// Creates a signature with non-constant parameters.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        params: &[Type],
        output: Type,
        constructor: Constructor,
    ) -> Self {
        Self {
            name: name.into(),
            params: params
                .iter()
                .map(|&ty| Param {
                    ty,
                    constant: false,
                })
                .collect(),
            output,
            constructor,
        }
    }

    /// Marks the parameter at `position` as constant.
    #[must_use]
    pub fn with_constant(mut self, position: usize) -> Self {
        if let Some(param) = self.params.get_mut(position) {
            param.constant = true;
        }
        self
    }

    /// Returns true if the parameter types match exactly.
    #[must_use]
    pub fn accepts(&self, types: &[Type]) -> bool {
        self.params.len() == types.len() && self.params.iter().zip(types).all(|(p, t)| p.ty == *t)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if p.constant {
                f.write_str("const ")?;
            }
            write!(f, "{}", p.ty)?;
        }
        write!(f, ") {}", self.output)
    }
}

/// Registry of function overloads, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    functions: HashMap<String, Vec<Signature>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in functions.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        crate::funcs::install_standard(&mut registry);
        registry
    }

    /// Registers an overload, replacing one with identical parameter types.
    pub fn register(&mut self, signature: Signature) {
        let overloads = self.functions.entry(signature.name.clone()).or_default();
        let types: Vec<Type> = signature.params.iter().map(|p| p.ty).collect();
        overloads.retain(|s| !s.accepts(&types));
        overloads.push(signature);
    }

    /// Returns true if any overload is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Returns all overloads registered under `name`.
    #[must_use]
    pub fn overloads(&self, name: &str) -> &[Signature] {
        self.functions.get(name).map_or(&[], Vec::as_slice)
    }

    /// Finds the overload whose parameter types match exactly.
    ///
    /// # Errors
    /// Returns `UndefinedFunction` for unknown names, `ArityMismatch` when
    /// no overload takes this many parameters, and `SignatureMismatch`
    /// naming the declared and supplied types otherwise.
    pub fn resolve(&self, name: &str, types: &[Type]) -> Result<&Signature> {
        let overloads = self.overloads(name);
        if overloads.is_empty() {
            return Err(Error::undefined_function(name));
        }
        if let Some(signature) = overloads.iter().find(|s| s.accepts(types)) {
            return Ok(signature);
        }
        if !overloads.iter().any(|s| s.params.len() == types.len()) {
            let mut arities: Vec<usize> = overloads.iter().map(|s| s.params.len()).collect();
            arities.sort_unstable();
            arities.dedup();
            let expected = arities
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(Error::arity_mismatch(name, expected, types.len()));
        }
        let declared = overloads
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        let supplied = types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::signature_mismatch(name, declared, supplied))
    }
}
