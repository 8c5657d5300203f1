//! Low-level byte cursor shared by the text reader.
//!
//! Tracks position, line, and column over a UTF-8 input, and provides
//! the primitive parsing operations the pull reader is built from: name
//! parsing, entity/character references, quoted attribute values, and a
//! nesting-depth guard.

use crate::error::{Error, SourceLocation};
use memchr::{memchr2, memrchr};

/// Default maximum element nesting depth.
///
/// Bounds the recursion of any consumer that descends per element
/// (the streaming builder in particular).
const DEFAULT_MAX_DEPTH: u32 = 256;

/// A byte cursor over UTF-8 input with location tracking.
pub(crate) struct Input<'a> {
    /// The raw input bytes.
    input: &'a [u8],
    /// Current byte offset.
    pos: usize,
    /// Current 1-based line.
    line: u32,
    /// Current 1-based column (in characters).
    column: u32,
    /// Current element nesting depth.
    depth: u32,
    /// Maximum allowed nesting depth.
    max_depth: u32,
}

impl<'a> Input<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Creates a malformed-input error at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> Error {
        Error::malformed(message, self.location())
    }

    // -- Depth guard --

    /// Increments the nesting depth, failing when the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "element nesting depth exceeds maximum ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth.
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position and peeking --

    /// Returns `true` if the cursor is at the end of input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the byte at the cursor without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns the byte `offset` positions ahead of the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Decodes the character at the cursor without advancing.
    pub fn peek_char(&self) -> Option<char> {
        let rest = self.input.get(self.pos..)?;
        for len in 1..=rest.len().min(4) {
            if let Ok(s) = std::str::from_utf8(&rest[..len]) {
                return s.chars().next();
            }
        }
        None
    }

    /// Advances over `count` bytes of ASCII markup, updating line/column.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(&b) = self.input.get(self.pos) {
                self.pos += 1;
                if b == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else {
                    self.column += 1;
                }
            }
        }
    }

    /// Advances past a character previously obtained from
    /// [`peek_char`](Self::peek_char).
    pub fn advance_char(&mut self, ch: char) {
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Consumes and returns the next character.
    pub fn next_char(&mut self) -> Result<char, Error> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance_char(ch);
        Ok(ch)
    }

    /// Consumes the next byte, requiring it to equal `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), Error> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(b) => Err(self.fatal(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(self.fatal(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    /// Consumes `expected`, erroring if the input differs.
    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), Error> {
        if !self.looking_at(expected) {
            return Err(self.fatal(format!(
                "expected '{}'",
                String::from_utf8_lossy(expected)
            )));
        }
        self.advance(expected.len());
        Ok(())
    }

    /// Returns `true` if the input at the cursor starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    /// Skips whitespace; returns `true` if any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.pos > start
    }

    /// Consumes bytes while `pred` returns `true` and returns the string.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if pred(b) {
                self.advance(1);
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).to_string()
    }

    /// Consumes character data up to the next `<` or `&` (or end of
    /// input) and appends it to `buf`. Returns the number of bytes
    /// consumed.
    ///
    /// The scan itself is a `memchr` sweep; line/column bookkeeping is
    /// reconstructed from the consumed chunk afterwards.
    pub fn take_char_data(&mut self, buf: &mut String) -> Result<usize, Error> {
        let rest = &self.input[self.pos..];
        let len = memchr2(b'<', b'&', rest).unwrap_or(rest.len());
        if len == 0 {
            return Ok(0);
        }
        let chunk = std::str::from_utf8(&rest[..len])
            .map_err(|_| self.fatal("invalid UTF-8 in character data"))?;
        if chunk.contains("]]>") {
            return Err(self.fatal("']]>' not allowed in character data"));
        }
        buf.push_str(chunk);

        self.pos += len;
        match memrchr(b'\n', &rest[..len]) {
            Some(last_nl) => {
                self.line += bytecount_newlines(&rest[..len]);
                let tail = std::str::from_utf8(&rest[last_nl + 1..len]).unwrap_or("");
                self.column = u32::try_from(tail.chars().count()).unwrap_or(u32::MAX) + 1;
            }
            None => {
                self.column += u32::try_from(chunk.chars().count()).unwrap_or(u32::MAX);
            }
        }
        Ok(len)
    }

    // -- Name parsing --

    /// Parses a name: a name-start character followed by name characters.
    pub fn parse_name(&mut self) -> Result<String, Error> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);

        while let Some(ch) = self.peek_char() {
            if is_name_char(ch) {
                self.advance_char(ch);
            } else {
                break;
            }
        }

        let name = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.fatal("invalid UTF-8 in name"))?;
        Ok(name.to_string())
    }

    // -- Reference parsing --

    /// Parses an entity or character reference (`&...;`).
    ///
    /// Handles the five built-in entities (`amp`, `lt`, `gt`, `apos`,
    /// `quot`) and decimal/hexadecimal character references. Any other
    /// entity reference is malformed input (there is no DTD layer to
    /// declare more).
    pub fn parse_reference(&mut self) -> Result<String, Error> {
        self.expect_byte(b'&')?;

        if self.peek() == Some(b'#') {
            self.advance(1);
            let value = if self.peek() == Some(b'x') {
                self.advance(1);
                let hex = self.take_while(|b| b.is_ascii_hexdigit());
                if hex.is_empty() {
                    return Err(self.fatal("empty hex character reference"));
                }
                u32::from_str_radix(&hex, 16)
                    .map_err(|_| self.fatal("invalid hex character reference"))?
            } else {
                let dec = self.take_while(|b| b.is_ascii_digit());
                if dec.is_empty() {
                    return Err(self.fatal("empty decimal character reference"));
                }
                dec.parse::<u32>()
                    .map_err(|_| self.fatal("invalid decimal character reference"))?
            };
            self.expect_byte(b';')?;

            let ch = char::from_u32(value)
                .ok_or_else(|| self.fatal(format!("invalid character reference: U+{value:04X}")))?;
            Ok(ch.to_string())
        } else {
            let name = self.parse_name()?;
            self.expect_byte(b';')?;

            match name.as_str() {
                "amp" => Ok("&".to_string()),
                "lt" => Ok("<".to_string()),
                "gt" => Ok(">".to_string()),
                "apos" => Ok("'".to_string()),
                "quot" => Ok("\"".to_string()),
                _ => Err(self.fatal(format!("unknown entity reference: &{name};"))),
            }
        }
    }

    // -- Attribute values --

    /// Parses a quoted attribute value, resolving references and
    /// normalizing embedded whitespace to spaces.
    pub fn parse_attribute_value(&mut self) -> Result<String, Error> {
        let quote = self
            .peek()
            .ok_or_else(|| self.fatal("unexpected end of input in attribute"))?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("attribute value must be quoted"));
        }
        self.advance(1);

        let mut value = String::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(self.fatal("unexpected end of input in attribute value"));
            };
            if b == quote {
                self.advance(1);
                break;
            }
            if b == b'&' {
                value.push_str(&self.parse_reference()?);
            } else if b == b'<' {
                return Err(self.fatal("'<' not allowed in attribute values"));
            } else {
                let ch = self.next_char()?;
                if ch == '\r' || ch == '\n' || ch == '\t' {
                    value.push(' ');
                } else {
                    value.push(ch);
                }
            }
        }

        Ok(value)
    }

    /// Parses a simple quoted value (no reference resolution).
    pub fn parse_quoted_value(&mut self) -> Result<String, Error> {
        let quote = self
            .peek()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("expected quoted value"));
        }
        self.advance(1);
        let start = self.pos;
        while !self.at_end() && self.peek() != Some(quote) {
            self.advance(1);
        }
        let value = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.fatal("invalid UTF-8 in quoted value"))?
            .to_string();
        self.expect_byte(quote)?;
        Ok(value)
    }
}

fn bytecount_newlines(bytes: &[u8]) -> u32 {
    u32::try_from(memchr::memchr_iter(b'\n', bytes).count()).unwrap_or(u32::MAX)
}

/// Returns `true` for a valid name-start character (XML 1.0 §2.3).
fn is_name_start_char(ch: char) -> bool {
    matches!(ch,
        ':' | '_'
        | 'A'..='Z' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// Returns `true` for a valid name character (XML 1.0 §2.3).
fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch)
        || matches!(ch,
            '-' | '.' | '0'..='9'
            | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}
