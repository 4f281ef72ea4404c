//! Parser for the grammar language.
//!
//! The parser converts a stream of tokens into a [`Grammar`]. It is a
//! hand-written recursive descent parser with one token of lookahead,
//! plus checkpoint backtracking where a `(` or `!` could open either a
//! name expression or a pattern.

use sylva_foundation::{Error, ErrorKind, Result, Type, Value};

use crate::ast::{BuiltInSymbol, Expr, Grammar, NameExpr, Pattern};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for grammar source text.
#[derive(Clone)]
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Source text (for error messages).
    source: &'src str,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = next_significant(&mut lexer);
        Self {
            lexer,
            current,
            source,
        }
    }

    /// Parses a whole grammar: an optional top pattern, then declarations.
    ///
    /// # Errors
    /// Returns a parse error if the source is malformed, declares a
    /// production twice, or has no top-level pattern.
    pub fn parse_grammar(&mut self) -> Result<Grammar> {
        let mut top = None;
        if self.current.kind != TokenKind::Eof && !self.at_declaration() {
            top = Some(self.parse_pattern()?);
        }

        let mut decls: Vec<(String, Pattern)> = Vec::new();
        while self.current.kind != TokenKind::Eof {
            if !self.at_declaration() {
                return Err(self.unexpected("a declaration"));
            }
            let span = self.current.span;
            if self.current.kind == TokenKind::Hash {
                self.advance();
            }
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Equals)?;
            let pattern = self.parse_pattern()?;

            let duplicate = decls.iter().any(|(n, _)| *n == name)
                || (name == Grammar::MAIN && top.is_some());
            if duplicate {
                return Err(self.error_at(span, &format!("duplicate declaration: {name}")));
            }
            decls.push((name, pattern));
        }

        let top = match top {
            Some(top) => top,
            None => {
                let Some(index) = decls.iter().position(|(n, _)| n == Grammar::MAIN) else {
                    return Err(self.error("missing main pattern"));
                };
                decls.remove(index).1
            }
        };
        Ok(decls
            .into_iter()
            .fold(Grammar::new(top), |g, (name, pattern)| g.with_decl(name, pattern)))
    }

    /// Parses a single pattern, requiring the input to end after it.
    ///
    /// # Errors
    /// Returns a parse error if the source is not exactly one pattern.
    pub fn parse_single_pattern(&mut self) -> Result<Pattern> {
        let pattern = self.parse_pattern()?;
        self.expect(&TokenKind::Eof)?;
        Ok(pattern)
    }

    /// Parses a single expression, requiring the input to end after it.
    /// A leading operator shorthand such as `== 3` is accepted.
    ///
    /// # Errors
    /// Returns a parse error if the source is not exactly one expression.
    pub fn parse_single_expr(&mut self) -> Result<Expr> {
        let expr = if self.current.kind.is_builtin_operator() {
            self.parse_builtin()?
        } else {
            self.parse_expr()?
        };
        self.expect(&TokenKind::Eof)?;
        Ok(expr)
    }

    // -------------------------------------------------------------------------
    // Patterns
    // -------------------------------------------------------------------------

    fn parse_pattern(&mut self) -> Result<Pattern> {
        match &self.current.kind {
            TokenKind::Empty => {
                self.advance();
                Ok(Pattern::Empty)
            }
            TokenKind::Star => {
                self.advance();
                Ok(Pattern::ZAny)
            }
            TokenKind::Arrow => {
                self.advance();
                Ok(Pattern::LeafNode(self.parse_expr()?))
            }
            kind if kind.is_builtin_operator() => Ok(Pattern::LeafNode(self.parse_builtin()?)),
            TokenKind::At => {
                self.advance();
                Ok(Pattern::Reference(self.expect_ident()?))
            }
            TokenKind::Dot => {
                self.advance();
                Ok(Pattern::contains(self.parse_pattern()?))
            }
            TokenKind::LBracket => self.parse_concat(),
            TokenKind::LBrace => self.parse_interleave(),
            TokenKind::LParen | TokenKind::Bang => {
                let checkpoint = self.clone();
                match self.parse_tree_node() {
                    Ok(pattern) => Ok(pattern),
                    Err(_) => {
                        *self = checkpoint;
                        if self.current.kind == TokenKind::Bang {
                            self.parse_not()
                        } else {
                            self.parse_group()
                        }
                    }
                }
            }
            _ => self.parse_tree_node(),
        }
    }

    /// Parses `name: pattern` or `name <builtin>`.
    fn parse_tree_node(&mut self) -> Result<Pattern> {
        let name = self.parse_name()?;
        if self.current.kind == TokenKind::Colon {
            self.advance();
            return Ok(Pattern::tree(name, self.parse_pattern()?));
        }
        if self.current.kind.is_builtin_operator() {
            let leaf = Pattern::LeafNode(self.parse_builtin()?);
            return Ok(Pattern::tree(name, leaf));
        }
        Err(self.unexpected("':' after name"))
    }

    /// Parses `!(pattern)`.
    fn parse_not(&mut self) -> Result<Pattern> {
        self.expect(&TokenKind::Bang)?;
        self.expect(&TokenKind::LParen)?;
        let inner = self.parse_pattern()?;
        self.expect(&TokenKind::RParen)?;
        Ok(Pattern::not(inner))
    }

    /// Parses `[p, q, ...]`.
    fn parse_concat(&mut self) -> Result<Pattern> {
        let start = self.current.span;
        self.expect(&TokenKind::LBracket)?;
        let items = self.parse_separated(&TokenKind::Comma, &TokenKind::RBracket, start)?;
        Pattern::concat_all(items).ok_or_else(|| self.error_at(start, "empty sequence"))
    }

    /// Parses `{p; q; ...}`.
    fn parse_interleave(&mut self) -> Result<Pattern> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        let items = self.parse_separated(&TokenKind::Semicolon, &TokenKind::RBrace, start)?;
        Pattern::interleave_all(items).ok_or_else(|| self.error_at(start, "empty interleave"))
    }

    /// Parses patterns separated by `sep` up to and including `close`.
    fn parse_separated(
        &mut self,
        sep: &TokenKind,
        close: &TokenKind,
        start: Span,
    ) -> Result<Vec<Pattern>> {
        let mut items = Vec::new();
        while self.current.kind != *close {
            if self.current.kind == TokenKind::Eof {
                return Err(self.error_at(start, &format!("unterminated group, expected {}", close.name())));
            }
            items.push(self.parse_pattern()?);
            if self.current.kind == *sep {
                self.advance();
            } else if self.current.kind != *close {
                return Err(self.unexpected(&format!("{} or {}", sep.name(), close.name())));
            }
        }
        self.advance();
        Ok(items)
    }

    /// Parses a parenthesised group: grouping, `,` sequence, `|` union,
    /// or `&` intersection, with an optional `*` or `?` suffix.
    fn parse_group(&mut self) -> Result<Pattern> {
        let start = self.current.span;
        self.expect(&TokenKind::LParen)?;
        let first = self.parse_pattern()?;

        let join: Option<fn(Vec<Pattern>) -> Option<Pattern>> = match self.current.kind {
            TokenKind::Comma => Some(Pattern::concat_all),
            TokenKind::Pipe => Some(Pattern::or_all),
            TokenKind::Ampersand => Some(Pattern::and_all),
            _ => None,
        };

        let group = match join {
            None => {
                self.expect(&TokenKind::RParen)?;
                first
            }
            Some(join) => {
                let sep = self.current.kind.clone();
                let mut items = vec![first];
                while self.current.kind == sep {
                    self.advance();
                    items.push(self.parse_pattern()?);
                }
                self.expect(&TokenKind::RParen)?;
                join(items).ok_or_else(|| self.error_at(start, "empty group"))?
            }
        };

        Ok(match self.current.kind {
            TokenKind::Star => {
                self.advance();
                Pattern::zero_or_more(group)
            }
            TokenKind::Question => {
                self.advance();
                Pattern::optional(group)
            }
            _ => group,
        })
    }

    /// Parses an operator shorthand like `== 3` into a builtin expression.
    fn parse_builtin(&mut self) -> Result<Expr> {
        let symbol = match self.current.kind {
            TokenKind::EqEq => BuiltInSymbol::Eq,
            TokenKind::NotEq => BuiltInSymbol::Ne,
            TokenKind::Lt => BuiltInSymbol::Lt,
            TokenKind::Le => BuiltInSymbol::Le,
            TokenKind::Gt => BuiltInSymbol::Gt,
            TokenKind::Ge => BuiltInSymbol::Ge,
            TokenKind::TildeEq => BuiltInSymbol::Regex,
            TokenKind::StarEq => BuiltInSymbol::Contains,
            TokenKind::CaretEq => BuiltInSymbol::HasPrefix,
            TokenKind::DollarEq => BuiltInSymbol::HasSuffix,
            TokenKind::ColonColon => BuiltInSymbol::Type,
            _ => return Err(self.unexpected("an operator")),
        };
        self.advance();
        Ok(Expr::builtin(symbol, self.parse_expr()?))
    }

    // -------------------------------------------------------------------------
    // Names
    // -------------------------------------------------------------------------

    fn parse_name(&mut self) -> Result<NameExpr> {
        match &self.current.kind {
            TokenKind::Underscore => {
                self.advance();
                Ok(NameExpr::AnyName)
            }
            TokenKind::Bang => {
                self.advance();
                self.expect(&TokenKind::LParen)?;
                let inner = self.parse_name()?;
                self.expect(&TokenKind::RParen)?;
                Ok(NameExpr::except(inner))
            }
            TokenKind::LParen => {
                self.advance();
                let mut names = vec![self.parse_name()?];
                while self.current.kind == TokenKind::Pipe {
                    self.advance();
                    names.push(self.parse_name()?);
                }
                self.expect(&TokenKind::RParen)?;
                let mut iter = names.into_iter().rev();
                let last = iter.next().ok_or_else(|| self.error("empty name choice"))?;
                Ok(iter.fold(last, |acc, n| NameExpr::choice(n, acc)))
            }
            TokenKind::Ident(name) if !self.at_cast() => {
                let name = name.clone();
                self.advance();
                Ok(NameExpr::Name(Value::from(name)))
            }
            _ => Ok(NameExpr::Name(self.parse_literal()?)),
        }
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr> {
        match &self.current.kind {
            TokenKind::Variable(ty) => {
                let ty = *ty;
                self.advance();
                Ok(Expr::var(ty))
            }
            TokenKind::TypeKeyword(ty) if ty.is_list() => {
                let ty = *ty;
                self.parse_list(ty)
            }
            TokenKind::Ident(_) if !self.at_cast() => self.parse_call(),
            _ => Ok(Expr::literal(self.parse_literal()?)),
        }
    }

    /// Parses `[]T{e, ...}`.
    fn parse_list(&mut self, ty: Type) -> Result<Expr> {
        self.advance();
        self.expect(&TokenKind::LBrace)?;
        let mut elems = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            elems.push(self.parse_expr()?);
            if self.current.kind == TokenKind::Comma {
                self.advance();
            } else if self.current.kind != TokenKind::RBrace {
                return Err(self.unexpected("',' or '}'"));
            }
        }
        self.advance();
        Ok(Expr::list(ty, elems))
    }

    /// Parses `name(arg, ...)`.
    fn parse_call(&mut self) -> Result<Expr> {
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while self.current.kind != TokenKind::RParen {
            params.push(self.parse_expr()?);
            if self.current.kind == TokenKind::Comma {
                self.advance();
            } else if self.current.kind != TokenKind::RParen {
                return Err(self.unexpected("',' or ')'"));
            }
        }
        self.advance();
        Ok(Expr::call(name, params))
    }

    /// Parses a literal value, including casts like `uint(3)` and `[]byte{1, 2}`.
    fn parse_literal(&mut self) -> Result<Value> {
        let value = match &self.current.kind {
            TokenKind::Int(n) => Value::Int(*n),
            TokenKind::Uint(n) => Value::Uint(*n),
            TokenKind::Double(n) => Value::Double(*n),
            TokenKind::String(s) => Value::from(s.as_str()),
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::TypeKeyword(Type::Bytes) => return self.parse_bytes(),
            TokenKind::Ident(cast) if self.at_cast() => {
                let cast = cast.clone();
                return self.parse_cast(&cast);
            }
            _ => return Err(self.unexpected("a literal")),
        };
        self.advance();
        Ok(value)
    }

    /// Parses `[]byte{1, 2, ...}`.
    fn parse_bytes(&mut self) -> Result<Value> {
        self.advance();
        self.expect(&TokenKind::LBrace)?;
        let mut bytes = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            let TokenKind::Int(n) = self.current.kind else {
                return Err(self.unexpected("a byte"));
            };
            let byte = u8::try_from(n).map_err(|_| self.error(&format!("byte out of range: {n}")))?;
            bytes.push(byte);
            self.advance();
            if self.current.kind == TokenKind::Comma {
                self.advance();
            } else if self.current.kind != TokenKind::RBrace {
                return Err(self.unexpected("',' or '}'"));
            }
        }
        self.advance();
        Ok(Value::bytes(bytes))
    }

    /// Parses a typed cast like `int(3)`, `uint(3)` or `double(3)`.
    fn parse_cast(&mut self, cast: &str) -> Result<Value> {
        self.advance();
        self.expect(&TokenKind::LParen)?;
        let value = match (cast, &self.current.kind) {
            ("int", TokenKind::Int(n)) => Value::Int(*n),
            ("uint", TokenKind::Int(n)) => match u64::try_from(*n) {
                Ok(n) => Value::Uint(n),
                Err(_) => return Err(self.error(&format!("negative uint: {n}"))),
            },
            ("uint", TokenKind::Uint(n)) => Value::Uint(*n),
            #[allow(clippy::cast_precision_loss)]
            ("double", TokenKind::Int(n)) => Value::Double(*n as f64),
            #[allow(clippy::cast_precision_loss)]
            ("double", TokenKind::Uint(n)) => Value::Double(*n as f64),
            ("double", TokenKind::Double(n)) => Value::Double(*n),
            ("string", TokenKind::String(s)) => Value::from(s.as_str()),
            ("bool", TokenKind::True) => Value::Bool(true),
            ("bool", TokenKind::False) => Value::Bool(false),
            _ => return Err(self.unexpected(&format!("a {cast} literal"))),
        };
        self.advance();
        self.expect(&TokenKind::RParen)?;
        Ok(value)
    }

    // -------------------------------------------------------------------------
    // Token helpers
    // -------------------------------------------------------------------------

    /// Returns the token after the current one.
    fn peek(&self) -> TokenKind {
        let mut lexer = self.lexer.clone();
        next_significant(&mut lexer).kind
    }

    /// True at `#name =` or `name =`.
    fn at_declaration(&self) -> bool {
        match self.current.kind {
            TokenKind::Hash => true,
            TokenKind::Ident(_) => self.peek() == TokenKind::Equals,
            _ => false,
        }
    }

    /// True at a typed cast keyword followed by `(`.
    fn at_cast(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Ident(name) if matches!(name.as_str(), "int" | "uint" | "double" | "string" | "bool")
        ) && self.peek() == TokenKind::LParen
    }

    fn advance(&mut self) {
        self.current = next_significant(&mut self.lexer);
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        let matches =
            std::mem::discriminant(&self.current.kind) == std::mem::discriminant(expected);
        if matches {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected.name()))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// Creates an "expected X, found Y" error, or surfaces a lexer error.
    fn unexpected(&self, expected: &str) -> Error {
        if let TokenKind::Error(message) = &self.current.kind {
            return self.error(message);
        }
        self.error(&format!(
            "expected {expected}, found {}",
            self.current.kind.name()
        ))
    }

    /// Creates a parse error at the current position.
    fn error(&self, message: &str) -> Error {
        self.error_at(self.current.span, message)
    }

    /// Creates a parse error at a specific span.
    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::new(ErrorKind::ParseError {
            message: message.to_string(),
            line: span.line,
            column: span.column,
            context: span.line_text(self.source).to_string(),
        })
    }
}

/// Returns the next non-comment token.
fn next_significant(lexer: &mut Lexer<'_>) -> Token {
    loop {
        let token = lexer.next_token();
        if !token.kind.is_trivia() {
            return token;
        }
    }
}

/// Parses grammar text into a [`Grammar`].
///
/// # Errors
/// Returns a parse error if the text is malformed.
pub fn parse(source: &str) -> Result<Grammar> {
    Parser::new(source).parse_grammar()
}

/// Parses a single pattern.
///
/// # Errors
/// Returns a parse error if the text is not one pattern.
pub fn parse_pattern(source: &str) -> Result<Pattern> {
    Parser::new(source).parse_single_pattern()
}

/// Parses a single expression.
///
/// # Errors
/// Returns a parse error if the text is not one expression.
pub fn parse_expr(source: &str) -> Result<Expr> {
    Parser::new(source).parse_single_expr()
}
