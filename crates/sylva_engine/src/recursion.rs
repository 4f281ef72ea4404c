//! Detection of productions that reach themselves without consuming input.
//!
//! A `Reference` inside a `TreeNode` only expands after an `EnterTree`
//! event, so it cannot loop. Any other path from a production back to
//! itself would make nullability and derivatives diverge, and such
//! grammars are refused. The scan is conservative: it does not ask
//! whether the path could actually be taken.

use std::collections::HashSet;

use sylva_foundation::{Error, Result};
use sylva_language::{Grammar, Pattern};
use tracing::warn;

/// Returns true if some production reaches itself outside any tree node.
#[must_use]
pub fn has_recursion(grammar: &Grammar) -> bool {
    find_recursion(grammar).is_some()
}

/// Returns the name of a production on an unguarded cycle, if any.
#[must_use]
pub fn find_recursion(grammar: &Grammar) -> Option<String> {
    let edges: Vec<Vec<usize>> = grammar
        .decls()
        .iter()
        .map(|decl| {
            let mut refs = Vec::new();
            unguarded_references(&decl.pattern, &mut refs);
            refs.into_iter()
                .filter_map(|name| grammar.id_of(name).map(|id| id.index()))
                .collect()
        })
        .collect();

    let mut finished = HashSet::new();
    for start in 0..edges.len() {
        let mut on_path = Vec::new();
        if let Some(cycle) = visit(start, &edges, &mut on_path, &mut finished) {
            return grammar.decls().get(cycle).map(|d| d.name.clone());
        }
    }
    None
}

/// Fails with a recursion error if the grammar has an unguarded cycle.
///
/// # Errors
/// Returns `Recursion` naming a production on the cycle.
pub fn check(grammar: &Grammar) -> Result<()> {
    match find_recursion(grammar) {
        Some(production) => {
            warn!(%production, "refusing grammar with unguarded recursion");
            Err(Error::recursion(production))
        }
        None => Ok(()),
    }
}

fn visit(
    node: usize,
    edges: &[Vec<usize>],
    on_path: &mut Vec<usize>,
    finished: &mut HashSet<usize>,
) -> Option<usize> {
    if on_path.contains(&node) {
        return Some(node);
    }
    if finished.contains(&node) {
        return None;
    }
    on_path.push(node);
    for &next in &edges[node] {
        if let Some(cycle) = visit(next, edges, on_path, finished) {
            return Some(cycle);
        }
    }
    on_path.pop();
    finished.insert(node);
    None
}

/// Collects references reachable without entering a tree node.
fn unguarded_references<'a>(pattern: &'a Pattern, out: &mut Vec<&'a str>) {
    match pattern {
        Pattern::Reference(name) => out.push(name),
        Pattern::Empty | Pattern::ZAny | Pattern::TreeNode { .. } | Pattern::LeafNode(_) => {}
        Pattern::Concat(l, r)
        | Pattern::Or(l, r)
        | Pattern::And(l, r)
        | Pattern::Interleave(l, r) => {
            unguarded_references(l, out);
            unguarded_references(r, out);
        }
        Pattern::ZeroOrMore(p) | Pattern::Optional(p) | Pattern::Not(p) | Pattern::Contains(p) => {
            unguarded_references(p, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_foundation::ErrorKind;
    use sylva_language::parse;

    #[test]
    fn left_recursion_is_found() {
        let grammar = parse("#main = @a\n#a = [@a, x: *]").unwrap();
        assert!(has_recursion(&grammar));
        assert_eq!(find_recursion(&grammar).as_deref(), Some("a"));
        let err = check(&grammar).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Recursion { ref production } if production == "a"));
    }

    #[test]
    fn recursion_through_tree_nodes_is_allowed() {
        let grammar = parse("#main = @node\n#node = (leaf: * | branch: (@node)*)").unwrap();
        assert!(!has_recursion(&grammar));
        assert!(check(&grammar).is_ok());
    }

    #[test]
    fn mutual_recursion_is_found() {
        let grammar = parse("#main = @a\n#a = (@b | <empty>)\n#b = [x: *, @a]").unwrap();
        // Conservative: `@a` follows a tree node in `b`, but is still unguarded.
        assert!(has_recursion(&grammar));
    }

    #[test]
    fn self_reference_in_main() {
        let grammar = parse("#main = (@main)*").unwrap();
        assert_eq!(find_recursion(&grammar).as_deref(), Some("main"));
    }

    #[test]
    fn unresolved_references_are_ignored() {
        let grammar = parse("#main = @missing").unwrap();
        assert!(!has_recursion(&grammar));
    }
}
