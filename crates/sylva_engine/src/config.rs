//! Configuration for the matching engine.

/// Resource bounds for one [`Matcher`](crate::Matcher).
///
/// Both limits are off by default. A bounded matcher fails with
/// `LimitExceeded` instead of growing without bound on hostile input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Maximum number of simultaneously open tree nodes.
    pub max_depth: Option<usize>,

    /// Maximum number of interned patterns in the arena.
    pub max_patterns: Option<usize>,
}

impl MatcherConfig {
    /// Creates a configuration with no limits.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Creates a configuration with limits suited to untrusted input.
    #[must_use]
    pub fn bounded() -> Self {
        Self {
            max_depth: Some(512),
            max_patterns: Some(1 << 20),
        }
    }

    /// Builder method to set the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Builder method to set the maximum arena size.
    #[must_use]
    pub fn with_max_patterns(mut self, patterns: usize) -> Self {
        self.max_patterns = Some(patterns);
        self
    }
}
