//! Streaming JSON tokenizer that emits tree events.
//!
//! The source never builds a document. It keeps one frame per open
//! container and turns the text into events as it is pulled:
//!
//! - object member `"k": v` becomes `EnterTree("k")`, the events of `v`, `ExitTree`
//! - array element `i` becomes `EnterTree(uint(i))`, the events of the element, `ExitTree`
//! - scalars become `Leaf`
//!
//! Integral numbers are `int` when they fit in an `i64`, `uint` when they
//! fit only in a `u64`, and `double` otherwise. `null` is [`Value::Null`].

use sylva_engine::{EventSource, TreeEvent};
use sylva_foundation::{Error, ErrorKind, Result, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Object,
    Array { next: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expect {
    /// A value, at the top or after a key or array slot.
    Value,
    /// The first member of an object, or `}`.
    FirstMember,
    /// The first element of an array, or `]`.
    FirstElement,
    /// A value just ended; close its member or element.
    AfterValue,
    /// `,` or the closing bracket of the innermost container.
    Separator,
    Done,
}

/// A pull-based JSON event source.
#[derive(Clone, Debug)]
pub struct JsonSource<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    stack: Vec<Frame>,
    expect: Expect,
}

impl<'src> JsonSource<'src> {
    /// Creates a source over JSON text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            line: 1,
            column: 1,
            stack: Vec::new(),
            expect: Expect::Value,
        }
    }

    /// Creates a source over UTF-8 encoded JSON.
    ///
    /// # Errors
    /// Returns a parse error if the bytes are not valid UTF-8.
    pub fn from_bytes(bytes: &'src [u8]) -> Result<Self> {
        std::str::from_utf8(bytes).map(Self::new).map_err(|e| {
            Error::new(ErrorKind::ParseError {
                message: format!("invalid UTF-8: {e}"),
                line: 1,
                column: 1,
                context: String::new(),
            })
        })
    }

    /// Returns the number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn step(&mut self) -> Result<Option<TreeEvent>> {
        match self.expect {
            Expect::Done => Ok(Some(TreeEvent::EndOfStream)),
            Expect::Value => {
                self.skip_whitespace();
                match self.peek_char() {
                    Some('{') => {
                        self.advance();
                        self.stack.push(Frame::Object);
                        self.expect = Expect::FirstMember;
                        Ok(None)
                    }
                    Some('[') => {
                        self.advance();
                        self.stack.push(Frame::Array { next: 0 });
                        self.expect = Expect::FirstElement;
                        Ok(None)
                    }
                    _ => {
                        let value = self.scalar()?;
                        self.expect = Expect::AfterValue;
                        Ok(Some(TreeEvent::Leaf(value)))
                    }
                }
            }
            Expect::FirstMember => {
                self.skip_whitespace();
                if self.peek_char() == Some('}') {
                    self.close();
                    return Ok(None);
                }
                self.member().map(Some)
            }
            Expect::FirstElement => {
                self.skip_whitespace();
                if self.peek_char() == Some(']') {
                    self.close();
                    return Ok(None);
                }
                Ok(Some(self.element()))
            }
            Expect::AfterValue => {
                if self.stack.is_empty() {
                    self.skip_whitespace();
                    if let Some(c) = self.peek_char() {
                        return Err(self.error(&format!("trailing character {c:?} after value")));
                    }
                    self.expect = Expect::Done;
                    return Ok(Some(TreeEvent::EndOfStream));
                }
                self.expect = Expect::Separator;
                Ok(Some(TreeEvent::ExitTree))
            }
            Expect::Separator => {
                self.skip_whitespace();
                match (self.peek_char(), self.stack.last().copied()) {
                    (Some(','), Some(Frame::Object)) => {
                        self.advance();
                        self.member().map(Some)
                    }
                    (Some(','), Some(Frame::Array { .. })) => {
                        self.advance();
                        Ok(Some(self.element()))
                    }
                    (Some('}'), Some(Frame::Object)) | (Some(']'), Some(Frame::Array { .. })) => {
                        self.close();
                        Ok(None)
                    }
                    (Some(c), _) => Err(self.error(&format!("expected ',' or closing bracket, found {c:?}"))),
                    (None, _) => Err(self.error("unexpected end of input")),
                }
            }
        }
    }

    /// Consumes the closing bracket of the innermost container.
    fn close(&mut self) {
        self.advance();
        self.stack.pop();
        self.expect = Expect::AfterValue;
    }

    fn member(&mut self) -> Result<TreeEvent> {
        self.skip_whitespace();
        if self.peek_char() != Some('"') {
            return Err(self.error("expected string key"));
        }
        let key = self.string()?;
        self.skip_whitespace();
        if self.peek_char() != Some(':') {
            return Err(self.error("expected ':' after key"));
        }
        self.advance();
        self.expect = Expect::Value;
        Ok(TreeEvent::EnterTree(Value::from(key)))
    }

    fn element(&mut self) -> TreeEvent {
        let index = match self.stack.last_mut() {
            Some(Frame::Array { next }) => {
                let index = *next;
                *next += 1;
                index
            }
            _ => 0,
        };
        self.expect = Expect::Value;
        TreeEvent::EnterTree(Value::Uint(index))
    }

    // -------------------------------------------------------------------------
    // Scalars
    // -------------------------------------------------------------------------

    fn scalar(&mut self) -> Result<Value> {
        match self.peek_char() {
            Some('"') => self.string().map(Value::from),
            Some('t') => self.keyword("true", Value::Bool(true)),
            Some('f') => self.keyword("false", Value::Bool(false)),
            Some('n') => self.keyword("null", Value::Null),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) => Err(self.error(&format!("unexpected character {c:?}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn keyword(&mut self, word: &str, value: Value) -> Result<Value> {
        if !self.rest.starts_with(word) {
            return Err(self.error(&format!("expected {word}")));
        }
        for _ in 0..word.len() {
            self.advance();
        }
        Ok(value)
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.rest;
        let mut len = 0;
        let mut integral = true;

        if self.peek_char() == Some('-') {
            len += self.advance_len();
        }
        match self.peek_char() {
            Some('0') => len += self.advance_len(),
            Some(c) if c.is_ascii_digit() => len += self.digits(),
            _ => return Err(self.error("expected digit")),
        }
        if self.peek_char() == Some('.') {
            integral = false;
            len += self.advance_len();
            if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("expected digit after '.'"));
            }
            len += self.digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            integral = false;
            len += self.advance_len();
            if matches!(self.peek_char(), Some('+' | '-')) {
                len += self.advance_len();
            }
            if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("expected digit in exponent"));
            }
            len += self.digits();
        }

        let text = &start[..len];
        if integral {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::Int(i));
            }
            if let Ok(u) = text.parse::<u64>() {
                return Ok(Value::Uint(u));
            }
        }
        text.parse::<f64>()
            .map(Value::Double)
            .map_err(|e| self.error(&format!("invalid number {text}: {e}")))
    }

    fn digits(&mut self) -> usize {
        let mut len = 0;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            len += self.advance_len();
        }
        len
    }

    fn string(&mut self) -> Result<String> {
        self.advance();
        let mut out = String::new();
        loop {
            match self.peek_char() {
                None => return Err(self.error("unterminated string")),
                Some('"') => {
                    self.advance();
                    return Ok(out);
                }
                Some('\\') => {
                    self.advance();
                    out.push(self.escape()?);
                }
                Some(c) if u32::from(c) < 0x20 => {
                    return Err(self.error("control character in string"));
                }
                Some(c) => {
                    self.advance();
                    out.push(c);
                }
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let c = self
            .peek_char()
            .ok_or_else(|| self.error("unterminated escape"))?;
        self.advance();
        Ok(match c {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                let high = self.hex4()?;
                if (0xD800..0xDC00).contains(&high) {
                    if !self.rest.starts_with("\\u") {
                        return Err(self.error("unpaired surrogate"));
                    }
                    self.advance();
                    self.advance();
                    let low = self.hex4()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error("invalid low surrogate"));
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(code).ok_or_else(|| self.error("invalid surrogate pair"))?
                } else {
                    char::from_u32(high).ok_or_else(|| self.error("unpaired surrogate"))?
                }
            }
            other => return Err(self.error(&format!("invalid escape \\{other}"))),
        })
    }

    fn hex4(&mut self) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .peek_char()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("expected four hex digits"))?;
            self.advance();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn advance(&mut self) {
        self.advance_len();
    }

    /// Advances one character and returns its length in bytes.
    fn advance_len(&mut self) -> usize {
        let Some(c) = self.peek_char() else {
            return 0;
        };
        let len = c.len_utf8();
        self.rest = &self.rest[len..];
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        len
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(' ' | '\t' | '\n' | '\r')) {
            self.advance();
        }
    }

    fn error(&self, message: &str) -> Error {
        let offset = self.source.len() - self.rest.len();
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[offset..]
            .find('\n')
            .map_or(self.source.len(), |i| offset + i);
        Error::new(ErrorKind::ParseError {
            message: message.to_string(),
            line: self.line,
            column: self.column,
            context: self.source[line_start..line_end].to_string(),
        })
    }
}

impl EventSource for JsonSource<'_> {
    fn next_event(&mut self) -> Result<TreeEvent> {
        loop {
            if let Some(event) = self.step()? {
                return Ok(event);
            }
        }
    }
}
