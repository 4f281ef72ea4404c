//! Lexer for the grammar language.
//!
//! The lexer converts grammar text into a stream of tokens. It is cheap to
//! clone, which is how the parser backtracks between a tree name and a
//! parenthesised pattern.

use sylva_foundation::Type;

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for grammar source text.
#[derive(Clone)]
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '|' => self.single(TokenKind::Pipe),
            '&' => self.single(TokenKind::Ampersand),
            '?' => self.single(TokenKind::Question),
            '.' => self.single(TokenKind::Dot),
            '@' => self.single(TokenKind::At),
            '#' => self.single(TokenKind::Hash),
            '[' => self.scan_bracket(),
            ':' => self.pair(':', TokenKind::ColonColon, TokenKind::Colon),
            '*' => self.pair('=', TokenKind::StarEq, TokenKind::Star),
            '!' => self.pair('=', TokenKind::NotEq, TokenKind::Bang),
            '=' => self.pair('=', TokenKind::EqEq, TokenKind::Equals),
            '>' => self.pair('=', TokenKind::Ge, TokenKind::Gt),
            '<' => {
                if self.rest.starts_with("<empty>") {
                    self.advance_n("<empty>".len());
                    TokenKind::Empty
                } else {
                    self.pair('=', TokenKind::Le, TokenKind::Lt)
                }
            }
            '~' => self.pair(
                '=',
                TokenKind::TildeEq,
                TokenKind::Error("expected '=' after '~'".into()),
            ),
            '^' => self.pair(
                '=',
                TokenKind::CaretEq,
                TokenKind::Error("expected '=' after '^'".into()),
            ),
            '$' => self.scan_variable(),
            '-' => match self.peek_char_n(1) {
                Some('>') => {
                    self.advance_n(2);
                    TokenKind::Arrow
                }
                Some(c) if c.is_ascii_digit() => self.scan_number(),
                _ => {
                    self.advance();
                    TokenKind::Error("unexpected character: -".into())
                }
            },
            '/' => self.scan_comment(),
            '"' => self.scan_string(),
            '`' => self.scan_raw_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            '_' if !self.peek_char_n(1).is_some_and(is_ident_char) => {
                self.single(TokenKind::Underscore)
            }
            c if is_ident_start(c) => self.scan_ident(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens.
    ///
    /// Comments are included in the output.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Consumes one character, then `second` too if it follows.
    fn pair(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans `//` and `/* */` comments.
    fn scan_comment(&mut self) -> TokenKind {
        let start = self.position;
        match self.peek_char_n(1) {
            Some('/') => {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            }
            Some('*') => {
                self.advance_n(2);
                loop {
                    if self.rest.starts_with("*/") {
                        self.advance_n(2);
                        break;
                    }
                    if self.rest.is_empty() {
                        return TokenKind::Error("unterminated block comment".into());
                    }
                    self.advance();
                }
            }
            _ => {
                self.advance();
                return TokenKind::Error("unexpected character: /".into());
            }
        }
        TokenKind::Comment(self.source[start..self.position].to_string())
    }

    /// Scans `[`, or a `[]`-prefixed type keyword like `[]int` or `[][]byte`.
    fn scan_bracket(&mut self) -> TokenKind {
        if self.peek_char_n(1) != Some(']') {
            return self.single(TokenKind::LBracket);
        }
        let start = self.position;
        self.advance_n(2);
        if self.rest.starts_with("[]") {
            self.advance_n(2);
        }
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        let keyword = &self.source[start..self.position];
        match Type::from_keyword(keyword) {
            Some(ty) => TokenKind::TypeKeyword(ty),
            None => TokenKind::Error(format!("unknown type: {keyword}")),
        }
    }

    /// Scans `$=` or a typed variable like `$int` or `$[]byte`.
    fn scan_variable(&mut self) -> TokenKind {
        self.advance(); // consume '$'
        if self.peek_char() == Some('=') {
            self.advance();
            return TokenKind::DollarEq;
        }
        let start = self.position;
        if self.rest.starts_with("[]") {
            self.advance_n(2);
        }
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        let keyword = &self.source[start..self.position];
        match Type::from_keyword(keyword) {
            Some(ty) if ty.is_single() => TokenKind::Variable(ty),
            _ => TokenKind::Error(format!("unknown variable type: ${keyword}")),
        }
    }

    /// Scans a double quoted string literal.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('u') => match self.scan_unicode_escape() {
                            Ok(c) => {
                                text.push(c);
                                continue;
                            }
                            Err(message) => return TokenKind::Error(message),
                        },
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in string escape".into(),
                            );
                        }
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => {
                    return TokenKind::Error("unterminated string literal".into());
                }
            }
        }
        TokenKind::String(text)
    }

    /// Scans the `uXXXX` tail of a unicode escape.
    fn scan_unicode_escape(&mut self) -> Result<char, String> {
        self.advance(); // consume 'u'
        let digits: String = self.rest.chars().take(4).collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("expected four hex digits after \\u".into());
        }
        self.advance_n(4);
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("invalid unicode escape: \\u{digits}"))
    }

    /// Scans a backtick raw string, which has no escapes.
    fn scan_raw_string(&mut self) -> TokenKind {
        self.advance(); // consume opening '`'
        let start = self.position;
        while let Some(c) = self.peek_char() {
            if c == '`' {
                let text = self.source[start..self.position].to_string();
                self.advance();
                return TokenKind::String(text);
            }
            self.advance();
        }
        TokenKind::Error("unterminated raw string literal".into())
    }

    /// Scans a number: decimal or hex integer, or a double.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let negative = self.peek_char() == Some('-');
        if negative {
            self.advance();
        }

        if self.rest.starts_with("0x") || self.rest.starts_with("0X") {
            self.advance_n(2);
            let digits_start = self.position;
            while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = &self.source[digits_start..self.position];
            return match u64::from_str_radix(digits, 16) {
                Ok(n) => integer_token(negative, n),
                Err(e) => TokenKind::Error(format!("invalid hex integer: {e}")),
            };
        }

        let mut is_double = false;
        self.skip_digits();
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_double = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char_n(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char_n(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_double = true;
                self.advance_n(digit_at);
                self.skip_digits();
            }
        }

        let text = &self.source[start..self.position];
        if is_double {
            return match text.parse::<f64>() {
                Ok(n) => TokenKind::Double(n),
                Err(e) => TokenKind::Error(format!("invalid double: {e}")),
            };
        }
        let digits = if negative { &text[1..] } else { text };
        match digits.parse::<u64>() {
            Ok(n) => integer_token(negative, n),
            Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Scans an identifier or the `true`/`false` keywords.
    fn scan_ident(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        match &self.source[start..self.position] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            name => TokenKind::Ident(name.to_string()),
        }
    }
}

/// Picks the narrowest integer token for a magnitude and sign.
fn integer_token(negative: bool, magnitude: u64) -> TokenKind {
    if negative {
        match i64::try_from(magnitude) {
            Ok(n) => TokenKind::Int(-n),
            Err(_) if magnitude == i64::MIN.unsigned_abs() => TokenKind::Int(i64::MIN),
            Err(_) => TokenKind::Error(format!("integer out of range: -{magnitude}")),
        }
    } else {
        match i64::try_from(magnitude) {
            Ok(n) => TokenKind::Int(n),
            Err(_) => TokenKind::Uint(magnitude),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
