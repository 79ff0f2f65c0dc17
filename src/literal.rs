//! Restricted literal parser for list, tuple and mapping tokens.
//!
//! Accepts numbers, quoted strings, `True`/`False`/`None` (and the JSON
//! spellings `true`/`false`/`null`), lists, tuples and mappings, nested to
//! [`MAX_DEPTH`]. Anything else is rejected; nothing is ever evaluated.

use crate::error::{LiteralError, LiteralErrorKind};
use crate::value::Value;

/// Deepest container nesting accepted before the parser gives up.
pub const MAX_DEPTH: usize = 64;

/// Parse a complete literal.
///
/// A bare top-level comma list such as `1, 2` is a tuple, as is `1,`.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    LiteralParser::new(input).parse_top()
}

struct LiteralParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_top(&mut self) -> Result<Value, LiteralError> {
        let first = self.parse_expr()?;
        self.skip_whitespace();
        match self.peek() {
            None => Ok(first),
            Some(',') => {
                let mut items = vec![first];
                while self.peek() == Some(',') {
                    self.bump();
                    self.skip_whitespace();
                    if self.peek().is_none() {
                        break;
                    }
                    items.push(self.parse_expr()?);
                    self.skip_whitespace();
                }
                match self.peek() {
                    None => Ok(Value::Tuple(items)),
                    Some(ch) => Err(self.error(LiteralErrorKind::UnexpectedChar(ch))),
                }
            }
            Some(_) => Err(self.error(LiteralErrorKind::TrailingCharacters)),
        }
    }

    fn parse_expr(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        let Some(ch) = self.peek() else {
            return Err(self.error(LiteralErrorKind::UnexpectedEnd));
        };

        match ch {
            '[' => self.nested(Self::parse_list),
            '(' => self.nested(Self::parse_parenthesized),
            '{' => self.nested(Self::parse_mapping),
            '"' | '\'' => self.parse_string(ch).map(Value::String),
            '+' | '-' | '.' | '0'..='9' => self.parse_number(),
            ch if ch.is_ascii_alphabetic() || ch == '_' => self.parse_name(),
            ch => Err(self.error(LiteralErrorKind::UnexpectedChar(ch))),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(LiteralErrorKind::TooDeep));
        }
        self.depth += 1;
        let value = parse(self)?;
        self.depth -= 1;
        Ok(value)
    }

    fn parse_list(&mut self) -> Result<Value, LiteralError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.bump();
                break;
            }
            items.push(self.parse_expr()?);
            if self.separator(']')? {
                break;
            }
        }
        Ok(Value::List(items))
    }

    fn parse_parenthesized(&mut self) -> Result<Value, LiteralError> {
        self.bump();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(Value::Tuple(Vec::new()));
        }

        let first = self.parse_expr()?;
        self.skip_whitespace();
        if self.peek() == Some(')') {
            // `(x)` only groups; it takes a comma to make a tuple.
            self.bump();
            return Ok(first);
        }

        let mut items = vec![first];
        if !self.separator(')')? {
            loop {
                self.skip_whitespace();
                if self.peek() == Some(')') {
                    self.bump();
                    break;
                }
                items.push(self.parse_expr()?);
                if self.separator(')')? {
                    break;
                }
            }
        }
        Ok(Value::Tuple(items))
    }

    fn parse_mapping(&mut self) -> Result<Value, LiteralError> {
        self.bump();
        let mut pairs: Vec<(Value, Value)> = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                break;
            }

            let key_offset = self.pos;
            let key = self.parse_expr()?;
            if !key.is_hashable() {
                return Err(LiteralError::new(key_offset, LiteralErrorKind::UnhashableKey));
            }
            self.skip_whitespace();
            match self.peek() {
                Some(':') => self.bump(),
                Some(ch) => return Err(self.error(LiteralErrorKind::UnexpectedChar(ch))),
                None => return Err(self.error(LiteralErrorKind::UnexpectedEnd)),
            }
            let value = self.parse_expr()?;

            if let Some(existing) = pairs.iter_mut().find(|(candidate, _)| *candidate == key) {
                existing.1 = value;
            } else {
                pairs.push((key, value));
            }

            if self.separator('}')? {
                break;
            }
        }
        Ok(Value::Map(pairs))
    }

    /// Consume `,` or the closing delimiter after an element.
    ///
    /// Returns `true` once the closing delimiter has been consumed.
    fn separator(&mut self, close: char) -> Result<bool, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some(',') => {
                self.bump();
                Ok(false)
            }
            Some(ch) if ch == close => {
                self.bump();
                Ok(true)
            }
            Some(ch) => Err(self.error(LiteralErrorKind::UnexpectedChar(ch))),
            None => Err(self.error(LiteralErrorKind::UnexpectedEnd)),
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let Some(ch) = self.advance() else {
                return Err(LiteralError::new(start, LiteralErrorKind::UnterminatedString));
            };
            match ch {
                ch if ch == quote => return Ok(out),
                '\n' => {
                    return Err(LiteralError::new(start, LiteralErrorKind::UnterminatedString));
                }
                '\\' => self.parse_escape(start, &mut out)?,
                ch => out.push(ch),
            }
        }
    }

    fn parse_escape(&mut self, start: usize, out: &mut String) -> Result<(), LiteralError> {
        let escape_offset = self.pos - 1;
        let Some(ch) = self.advance() else {
            return Err(LiteralError::new(start, LiteralErrorKind::UnterminatedString));
        };
        match ch {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0'..='7' => out.push(self.octal_escape(ch)),
            '\\' | '\'' | '"' => out.push(ch),
            '\n' => {}
            'x' => out.push(self.hex_escape(2, escape_offset)?),
            'u' => out.push(self.hex_escape(4, escape_offset)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// Up to three octal digits, the first already consumed.
    fn octal_escape(&mut self, first: char) -> char {
        let mut code = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            let Some(digit) = self.peek().and_then(|ch| ch.to_digit(8)) else {
                break;
            };
            self.bump();
            code = code * 8 + digit;
        }
        // At most 0o777, always a valid scalar value.
        char::from_u32(code).unwrap_or('\0')
    }

    fn hex_escape(&mut self, digits: usize, escape_offset: usize) -> Result<char, LiteralError> {
        let invalid = LiteralError::new(escape_offset, LiteralErrorKind::InvalidEscape);
        let end = self.pos + digits;
        let Some(hex) = self.input.get(self.pos..end) else {
            return Err(invalid);
        };
        if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid);
        }
        let code = u32::from_str_radix(hex, 16).map_err(|_| invalid.clone())?;
        self.pos = end;
        char::from_u32(code).ok_or(invalid)
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let invalid = LiteralError::new(start, LiteralErrorKind::InvalidNumber);

        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        let int_start = self.pos;
        let int_digits = self.eat_digits();
        let int_text = &self.input[int_start..self.pos];
        let leading_zero = int_text.starts_with('0') && int_text.contains(|ch: char| ch != '0');
        let mut is_float = false;
        if self.peek() == Some('.') {
            self.bump();
            is_float = true;
            let frac_digits = self.eat_digits();
            if int_digits == 0 && frac_digits == 0 {
                return Err(invalid);
            }
        } else if int_digits == 0 {
            return Err(invalid);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.eat_digits() == 0 {
                return Err(invalid);
            }
            is_float = true;
        }

        let text = &self.input[start..self.pos];
        // `01` is not an integer literal; `00`, `01.5` and `01e2` are fine.
        if !is_float && leading_zero {
            return Err(invalid);
        }
        if is_float {
            text.parse::<f64>().map(Value::Float).map_err(|_| invalid)
        } else {
            text.parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| LiteralError::new(start, LiteralErrorKind::IntegerOverflow))
        }
    }

    fn parse_name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_') {
            self.bump();
        }
        match &self.input[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            other => Err(LiteralError::new(
                start,
                LiteralErrorKind::UnknownName(other.to_owned()),
            )),
        }
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.bump();
        }
        self.pos - start
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn bump(&mut self) {
        self.advance();
    }

    fn error(&self, kind: LiteralErrorKind) -> LiteralError {
        LiteralError::new(self.pos, kind)
    }
}
