//! Token types for the grammar language.
//!
//! Tokens are the output of the lexer and input to the parser.

use sylva_foundation::Type;

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token types for the grammar language.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // Punctuation
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `|`
    Pipe,
    /// `&`
    Ampersand,
    /// `*`
    Star,
    /// `?`
    Question,
    /// `!`
    Bang,
    /// `.`
    Dot,
    /// `@`
    At,
    /// `#`
    Hash,
    /// `=`
    Equals,
    /// `->`
    Arrow,
    /// `_`
    Underscore,
    /// `<empty>`
    Empty,

    // Builtin operators
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~=`
    TildeEq,
    /// `*=`
    StarEq,
    /// `^=`
    CaretEq,
    /// `$=`
    DollarEq,
    /// `::`
    ColonColon,

    // Literals
    /// `true`
    True,
    /// `false`
    False,
    /// Integer literal that fits in `i64`.
    Int(i64),
    /// Integer literal that only fits in `u64`.
    Uint(u64),
    /// Floating point literal like `1.5` or `1e3`.
    Double(f64),
    /// Quoted or raw string literal.
    String(String),
    /// Identifier like `name` or `hasPrefix`.
    Ident(String),
    /// Typed variable like `$int` or `$[]byte`.
    Variable(Type),
    /// Type keyword with a `[]` prefix, like `[]int` or `[]byte`.
    TypeKeyword(Type),

    // Meta
    /// Comment text.
    Comment(String),
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns true if this token kind should be ignored during parsing.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Returns true for the operators that introduce a builtin leaf.
    #[must_use]
    pub const fn is_builtin_operator(&self) -> bool {
        matches!(
            self,
            Self::EqEq
                | Self::NotEq
                | Self::Lt
                | Self::Le
                | Self::Gt
                | Self::Ge
                | Self::TildeEq
                | Self::StarEq
                | Self::CaretEq
                | Self::DollarEq
                | Self::ColonColon
        )
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Pipe => "'|'",
            Self::Ampersand => "'&'",
            Self::Star => "'*'",
            Self::Question => "'?'",
            Self::Bang => "'!'",
            Self::Dot => "'.'",
            Self::At => "'@'",
            Self::Hash => "'#'",
            Self::Equals => "'='",
            Self::Arrow => "'->'",
            Self::Underscore => "'_'",
            Self::Empty => "'<empty>'",
            Self::EqEq => "'=='",
            Self::NotEq => "'!='",
            Self::Lt => "'<'",
            Self::Le => "'<='",
            Self::Gt => "'>'",
            Self::Ge => "'>='",
            Self::TildeEq => "'~='",
            Self::StarEq => "'*='",
            Self::CaretEq => "'^='",
            Self::DollarEq => "'$='",
            Self::ColonColon => "'::'",
            Self::True => "true",
            Self::False => "false",
            Self::Int(_) | Self::Uint(_) => "integer",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Ident(_) => "identifier",
            Self::Variable(_) => "variable",
            Self::TypeKeyword(_) => "type",
            Self::Comment(_) => "comment",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }
}
