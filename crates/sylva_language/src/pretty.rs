//! Printing grammars back to source text.
//!
//! Every `Display` impl here produces text that [`crate::parse`] reads
//! back into an equal tree.
//!
//! # Example
//!
//! ```
//! use sylva_language::parse;
//!
//! let grammar = parse("a::$int").unwrap();
//! let printed = grammar.to_string();
//! assert_eq!(printed, "#main = a: :: $int\n");
//! assert_eq!(parse(&printed).unwrap(), grammar);
//! ```

use std::fmt;

use sylva_foundation::Value;

use crate::ast::{Expr, Grammar, NameExpr, Pattern, Terminal};

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decl in self.decls() {
            writeln!(f, "#{} = {}", decl.name, decl.pattern)?;
        }
        Ok(())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("<empty>"),
            Self::ZAny => f.write_str("*"),
            Self::TreeNode { name, pattern } => write!(f, "{name}: {pattern}"),
            Self::LeafNode(expr @ Expr::BuiltIn { .. }) => write!(f, "{expr}"),
            Self::LeafNode(expr) => write!(f, "-> {expr}"),
            Self::Concat(l, r) => write!(f, "[{l}, {r}]"),
            Self::Or(l, r) => write!(f, "({l} | {r})"),
            Self::And(l, r) => write!(f, "({l} & {r})"),
            Self::Interleave(l, r) => write!(f, "{{{l}; {r}}}"),
            Self::ZeroOrMore(p) => write!(f, "({p})*"),
            Self::Optional(p) => write!(f, "({p})?"),
            Self::Not(p) => write!(f, "!({p})"),
            Self::Contains(p) => write!(f, ".{p}"),
            Self::Reference(name) => write!(f, "@{name}"),
        }
    }
}

impl fmt::Display for NameExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(Value::String(s)) if is_bare_name(s) => f.write_str(s),
            Self::Name(value) => write!(f, "{value}"),
            Self::AnyName => f.write_str("_"),
            Self::AnyNameExcept(inner) => write!(f, "!({inner})"),
            Self::NameChoice(l, r) => write!(f, "({l}|{r})"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(Terminal::Literal(value)) => write!(f, "{value}"),
            Self::Terminal(Terminal::Variable(ty)) => write!(f, "${}", ty.keyword()),
            Self::List { ty, elems } => {
                write!(f, "{}{{", ty.keyword())?;
                write_comma_separated(f, elems)?;
                f.write_str("}")
            }
            Self::Function { name, params } => {
                write!(f, "{name}(")?;
                write_comma_separated(f, params)?;
                f.write_str(")")
            }
            Self::BuiltIn { symbol, operand } => write!(f, "{} {operand}", symbol.symbol()),
        }
    }
}

fn write_comma_separated(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// True for names the lexer reads back as a plain identifier.
fn is_bare_name(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || (first == '_' && s.len() > 1))
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(s, "true" | "false")
}
