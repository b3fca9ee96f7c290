//! Textual literal form of domains.
//!
//! Domains are often persisted as text in the host framework's literal
//! syntax, e.g. `[('state', '=', 'done'), '|', ('x', 'in', (1, 2)), ('y', '!=', False)]`.
//! This module reads that subset (lists, tuples, dicts with string keys,
//! quoted strings, numbers, `True`/`False`/`None`) into [`serde_json::Value`].
//! JSON text is a subset of what is accepted (`true`/`false`/`null` too),
//! so the same entry point reads both.

use crate::errors::{DomainError, DomainResult};
use serde_json::{Map, Number, Value};

/// Parse literal (or JSON) text into a value.
pub fn parse_literal(text: &str) -> DomainResult<Value> {
    let mut parser = LiteralParser::new(text);
    let value = parser.parse_value(0)?;
    parser.skip_whitespace();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Print a value in literal syntax. Arrays print as lists; use
/// [`to_literal_tuple`] where a tuple reads better (domain leaves).
pub fn to_literal(value: &Value) -> String {
    let mut out = String::new();
    write_literal(value, &mut out);
    out
}

/// Print an array as a tuple, e.g. `('x', '=', 1)`.
pub fn to_literal_tuple(items: &[Value]) -> String {
    let mut out = String::from("(");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_literal(item, &mut out);
    }
    if items.len() == 1 {
        out.push(',');
    }
    out.push(')');
    out
}

fn write_literal(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_quoted(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(key, out);
                out.push_str(": ");
                write_literal(item, out);
            }
            out.push('}');
        }
    }
}

fn write_quoted(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Nested containers beyond this are rejected rather than recursed into.
const MAX_LITERAL_NESTING: usize = 512;

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> DomainError {
        DomainError::Literal {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, wanted: char) -> DomainResult<()> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", wanted, c))),
            None => Err(self.error(format!("expected '{}', found end of input", wanted))),
        }
    }

    fn parse_value(&mut self, depth: usize) -> DomainResult<Value> {
        if depth > MAX_LITERAL_NESTING {
            return Err(self.error("literal nested too deeply"));
        }
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.bump();
                let (items, _) = self.parse_sequence(']', depth)?;
                Ok(Value::Array(items))
            }
            Some('(') => {
                self.bump();
                let (mut items, trailing_comma) = self.parse_sequence(')', depth)?;
                // `(x)` is a parenthesized value, `(x,)` a one-element tuple
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::Array(items))
                }
            }
            Some('{') => {
                self.bump();
                self.parse_dict(depth)
            }
            Some('\'') | Some('"') => Ok(Value::String(self.parse_string()?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    /// Comma separated values up to `close`. Returns whether the last value
    /// was followed by a comma.
    fn parse_sequence(&mut self, close: char, depth: usize) -> DomainResult<(Vec<Value>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, trailing_comma));
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => trailing_comma = true,
                Some(c) if c == close => return Ok((items, false)),
                Some(c) => {
                    return Err(self.error(format!("expected ',' or '{}', found '{}'", close, c)))
                }
                None => return Err(self.error(format!("unclosed '{}'", close))),
            }
        }
    }

    fn parse_dict(&mut self, depth: usize) -> DomainResult<Value> {
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = match self.parse_value(depth + 1)? {
                Value::String(key) => key,
                other => return Err(self.error(format!("dict keys must be strings, found {}", other))),
            };
            self.expect(':')?;
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Value::Object(map)),
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{}'", c))),
                None => return Err(self.error("unclosed '{'")),
            }
        }
    }

    fn parse_string(&mut self) -> DomainResult<String> {
        let quote = self.bump().ok_or_else(|| self.error("expected a string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
                    match escaped {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' | '/' => out.push(escaped),
                        'u' => out.push(self.parse_unicode_escape()?),
                        other => {
                            // unknown escapes are kept verbatim, like the host does
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> DomainResult<char> {
        let start = self.pos;
        let end = start + 4;
        let hex = self
            .src
            .get(start..end)
            .ok_or_else(|| self.error("truncated \\u escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid \\u escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode code point"))
    }

    fn parse_number(&mut self) -> DomainResult<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' | 'e' | 'E' => is_float = true,
                '-' | '+' if matches!(self.src[..self.pos].chars().last(), Some('e') | Some('E')) => {}
                _ => break,
            }
            self.bump();
        }
        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let number = if is_float {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else {
            text.parse::<i64>()
                .ok()
                .map(Number::from)
                .or_else(|| text.parse::<u64>().ok().map(Number::from))
        };
        number.map(Value::Number).ok_or_else(|| DomainError::Literal {
            position: start,
            message: format!("invalid number '{}'", text),
        })
    }

    fn parse_word(&mut self) -> DomainResult<Value> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.src[start..self.pos];
        match word {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            // legacy unicode string prefix: u'text'
            "u" | "U" if matches!(self.peek(), Some('\'') | Some('"')) => {
                Ok(Value::String(self.parse_string()?))
            }
            _ => Err(DomainError::Literal {
                position: start,
                message: format!("unsupported name '{}'", word),
            }),
        }
    }
}
