//! Error types for the Sylva system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every kind belongs to one [`ErrorCategory`], which is what callers use
//! to tell "could not be parsed/composed/evaluated" apart.

use std::fmt;

use thiserror::Error;

use crate::types::Type;

/// The main error type for Sylva operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Pushes a frame onto this error's context, creating it if needed.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Creates a compose-time type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an error for a variable read against a value of another type.
    #[must_use]
    pub fn variable_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::VariableMismatch { expected, actual })
    }

    /// Creates an undefined function error.
    #[must_use]
    pub fn undefined_function(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedFunction(name.into()))
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(function: impl Into<String>, expected: String, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            function: function.into(),
            expected,
            actual,
        })
    }

    /// Creates a signature mismatch error.
    #[must_use]
    pub fn signature_mismatch(function: impl Into<String>, expected: String, actual: String) -> Self {
        Self::new(ErrorKind::SignatureMismatch {
            function: function.into(),
            expected,
            actual,
        })
    }

    /// Creates an unresolved reference error.
    #[must_use]
    pub fn unresolved_reference(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedReference(name.into()))
    }

    /// Creates a runtime evaluation error.
    #[must_use]
    pub fn eval(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Eval(message.into()))
    }

    /// Creates an unsupported construct error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported(message.into()))
    }

    /// Creates a recursion error naming the production on the cycle.
    #[must_use]
    pub fn recursion(production: impl Into<String>) -> Self {
        Self::new(ErrorKind::Recursion {
            production: production.into(),
        })
    }

    /// Creates a malformed event stream error.
    #[must_use]
    pub fn malformed_stream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedStream(message.into()))
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed grammar text, schema document, or input document.
    #[error("parse error at {line}:{column}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// An expression has the wrong type where a specific one is required.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// No overload of a function accepts the supplied parameter types.
    #[error("no overload of {function} accepts ({actual}); declared: {expected}")]
    SignatureMismatch {
        /// The function name.
        function: String,
        /// The declared signatures.
        expected: String,
        /// The supplied parameter types.
        actual: String,
    },

    /// Wrong number of arguments to a function.
    #[error("arity mismatch for {function}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// The function name.
        function: String,
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Function was not registered.
    #[error("undefined function: {0}")]
    UndefinedFunction(String),

    /// A constant parameter received an expression that reads the current value.
    #[error("parameter {position} of {function} must be constant")]
    NonConstantArgument {
        /// The function name.
        function: String,
        /// Zero-based parameter position.
        position: usize,
    },

    /// A parameter value is outside what the function accepts.
    #[error("invalid argument to {function}: {message}")]
    InvalidArgument {
        /// The function name.
        function: String,
        /// What was wrong with it.
        message: String,
    },

    /// A reference names a production the grammar does not declare.
    #[error("unresolved reference: @{0}")]
    UnresolvedReference(String),

    /// A typed variable read a value of a different type.
    #[error("variable ${expected} cannot read a {actual} value")]
    VariableMismatch {
        /// The variable's type.
        expected: Type,
        /// The type of the current value.
        actual: Type,
    },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: i64,
        /// The actual length of the collection.
        length: usize,
    },

    /// Other runtime failure inside a compiled predicate.
    #[error("evaluation failed: {0}")]
    Eval(String),

    /// Schema feature with no pattern translation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A production reaches itself without consuming an event.
    #[error("recursive production without an intervening tree node: {production}")]
    Recursion {
        /// A production on the cycle.
        production: String,
    },

    /// The event source produced an impossible sequence.
    #[error("malformed event stream: {0}")]
    MalformedStream(String),

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the category this kind belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ParseError { .. } => ErrorCategory::Parse,
            Self::TypeMismatch { .. }
            | Self::SignatureMismatch { .. }
            | Self::ArityMismatch { .. }
            | Self::UndefinedFunction(_)
            | Self::NonConstantArgument { .. }
            | Self::InvalidArgument { .. }
            | Self::UnresolvedReference(_) => ErrorCategory::Compose,
            Self::VariableMismatch { .. } | Self::IndexOutOfBounds { .. } | Self::Eval(_) => {
                ErrorCategory::Eval
            }
            Self::Unsupported(_) => ErrorCategory::Unsupported,
            Self::Recursion { .. } => ErrorCategory::Recursion,
            Self::MalformedStream(_) => ErrorCategory::Stream,
            Self::LimitExceeded(_) => ErrorCategory::Limit,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// Coarse classification of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed grammar text, schema, or document.
    Parse,
    /// Function arity/type mismatch or unresolved reference.
    Compose,
    /// Runtime failure inside a compiled predicate.
    Eval,
    /// Schema feature with no translation.
    Unsupported,
    /// Unsafe reference cycle.
    Recursion,
    /// Impossible event sequence.
    Stream,
    /// Configured limit exceeded.
    Limit,
    /// Bug.
    Internal,
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// Maximum tree nesting depth exceeded.
    MaxDepth {
        /// The configured limit.
        limit: usize,
    },
    /// Maximum number of interned patterns exceeded.
    MaxPatterns {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxDepth { limit } => write!(f, "max depth ({limit}) exceeded"),
            Self::MaxPatterns { limit } => write!(f, "max patterns ({limit}) exceeded"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Source file or production name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
    /// Stack of enclosing constructs, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            line: None,
            column: None,
            stack: Vec::new(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_mismatch() {
        let err = Error::type_mismatch(Type::Bool, Type::String);
        assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
        assert_eq!(err.category(), ErrorCategory::Compose);
        let msg = format!("{err}");
        assert!(msg.contains("bool"));
        assert!(msg.contains("string"));
    }

    #[test]
    fn variable_mismatch_is_eval() {
        let err = Error::variable_mismatch(Type::Int, Type::String);
        assert_eq!(err.category(), ErrorCategory::Eval);
        assert_eq!(format!("{err}"), "variable $int cannot read a string value");
    }

    #[test]
    fn error_with_context() {
        let err = Error::unresolved_reference("item").with_context(
            ErrorContext::new()
                .with_source("schema.sylva")
                .with_position(10, 5),
        );

        assert_eq!(err.category(), ErrorCategory::Compose);
        let ctx = err.context.unwrap();
        assert_eq!(ctx.source, Some("schema.sylva".to_string()));
        assert_eq!(ctx.line, Some(10));
        assert_eq!(ctx.column, Some(5));
    }

    #[test]
    fn with_frame_accumulates() {
        let err = Error::eval("boom").with_frame("leaf a").with_frame("production main");
        let ctx = err.context.unwrap();
        assert_eq!(ctx.stack, vec!["leaf a", "production main"]);
        let shown = format!("{ctx}");
        assert!(shown.contains("in leaf a"));
    }

    #[test]
    fn categories() {
        assert_eq!(Error::unsupported("$ref").category(), ErrorCategory::Unsupported);
        assert_eq!(Error::recursion("main").category(), ErrorCategory::Recursion);
        assert_eq!(
            Error::malformed_stream("unbalanced").category(),
            ErrorCategory::Stream
        );
        assert_eq!(
            Error::limit_exceeded(SemanticLimit::MaxDepth { limit: 3 }).category(),
            ErrorCategory::Limit
        );
    }

    #[test]
    fn semantic_limit_display() {
        let limit = SemanticLimit::MaxPatterns { limit: 1000 };
        assert_eq!(format!("{limit}"), "max patterns (1000) exceeded");
    }
}
