//! Per-validation evaluation context.

use sylva_foundation::{Error, Result, Type, Value};

/// What compiled expressions can see while they evaluate.
///
/// A context is created fresh for each validation run. The matcher rebinds
/// `current` before evaluating the predicates of each leaf; `external` is
/// set by the host and left alone by the matcher.
#[derive(Clone, Debug)]
pub struct Context {
    current: Value,
    external: Option<Value>,
}

impl Context {
    /// Creates a context with no current leaf and no external value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Value::Null,
            external: None,
        }
    }

    /// Creates a context carrying an external value.
    #[must_use]
    pub fn with_external(value: Value) -> Self {
        Self {
            current: Value::Null,
            external: Some(value),
        }
    }

    /// Returns the current leaf value.
    #[must_use]
    pub fn current(&self) -> &Value {
        &self.current
    }

    /// Rebinds the current leaf value.
    pub fn set_current(&mut self, value: Value) {
        self.current = value;
    }

    /// Returns the external value, if the host injected one.
    #[must_use]
    pub fn external(&self) -> Option<&Value> {
        self.external.as_ref()
    }

    /// Replaces the external value.
    pub fn set_external(&mut self, value: Option<Value>) {
        self.external = value;
    }

    /// Reads the current value as `ty`.
    ///
    /// Integers cross between `int` and `uint` when the number fits;
    /// every other reading requires the exact type.
    ///
    /// # Errors
    /// Returns a variable mismatch when the current value has no reading
    /// of the requested type.
    pub fn read(&self, ty: Type) -> Result<Value> {
        let value = match (ty, &self.current) {
            (Type::Int, Value::Uint(u)) => i64::try_from(*u).ok().map(Value::Int),
            (Type::Uint, Value::Int(i)) => u64::try_from(*i).ok().map(Value::Uint),
            (ty, value) if value.value_type() == ty && ty.is_single() => Some(value.clone()),
            _ => None,
        };
        value.ok_or_else(|| Error::variable_mismatch(ty, self.current.value_type()))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
