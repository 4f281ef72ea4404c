//! Tree events and the sources that produce them.

use std::collections::VecDeque;
use std::fmt;

use sylva_foundation::{Result, Value};
use tracing::trace;

/// One step of a streamed tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEvent {
    /// A tree node with this label opens; its children follow.
    EnterTree(Value),
    /// A scalar leaf.
    Leaf(Value),
    /// The innermost open tree node closes.
    ExitTree,
    /// The input is exhausted.
    EndOfStream,
}

impl fmt::Display for TreeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnterTree(name) => write!(f, "enter {name}"),
            Self::Leaf(value) => write!(f, "leaf {value}"),
            Self::ExitTree => f.write_str("exit"),
            Self::EndOfStream => f.write_str("end"),
        }
    }
}

/// A pull-based producer of tree events.
///
/// Once exhausted, a source keeps returning [`TreeEvent::EndOfStream`].
pub trait EventSource {
    /// Returns the next event.
    ///
    /// # Errors
    /// Returns an error if the underlying input is malformed.
    fn next_event(&mut self) -> Result<TreeEvent>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Result<TreeEvent> {
        (**self).next_event()
    }
}

/// An in-memory list of events.
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    events: VecDeque<TreeEvent>,
}

impl VecSource {
    /// Creates a source that yields `events` in order.
    #[must_use]
    pub fn new(events: Vec<TreeEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Returns the number of events not yet pulled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for VecSource {
    fn next_event(&mut self) -> Result<TreeEvent> {
        Ok(self.events.pop_front().unwrap_or(TreeEvent::EndOfStream))
    }
}

impl FromIterator<TreeEvent> for VecSource {
    fn from_iter<I: IntoIterator<Item = TreeEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

/// Logs every event at trace level, then forwards it.
#[derive(Debug)]
pub struct Traced<S> {
    inner: S,
    depth: usize,
}

impl<S: EventSource> Traced<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner, depth: 0 }
    }

    /// Unwraps the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSource> EventSource for Traced<S> {
    fn next_event(&mut self) -> Result<TreeEvent> {
        let event = self.inner.next_event()?;
        if event == TreeEvent::ExitTree {
            self.depth = self.depth.saturating_sub(1);
        }
        trace!(depth = self.depth, %event, "tree event");
        if matches!(event, TreeEvent::EnterTree(_)) {
            self.depth += 1;
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_source_repeats_end_of_stream() {
        let mut source = VecSource::new(vec![TreeEvent::Leaf(Value::Int(1))]);
        assert_eq!(source.next_event().unwrap(), TreeEvent::Leaf(Value::Int(1)));
        assert_eq!(source.next_event().unwrap(), TreeEvent::EndOfStream);
        assert_eq!(source.next_event().unwrap(), TreeEvent::EndOfStream);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn traced_forwards_events() {
        let events = vec![
            TreeEvent::EnterTree(Value::from("a")),
            TreeEvent::Leaf(Value::Bool(true)),
            TreeEvent::ExitTree,
        ];
        let mut traced = Traced::new(VecSource::new(events.clone()));
        for expected in events {
            assert_eq!(traced.next_event().unwrap(), expected);
        }
        assert_eq!(traced.next_event().unwrap(), TreeEvent::EndOfStream);
        assert_eq!(traced.into_inner().remaining(), 0);
    }

    #[test]
    fn event_display() {
        assert_eq!(TreeEvent::EnterTree(Value::Uint(0)).to_string(), "enter uint(0)");
        assert_eq!(TreeEvent::Leaf(Value::from("x")).to_string(), "leaf \"x\"");
    }
}
