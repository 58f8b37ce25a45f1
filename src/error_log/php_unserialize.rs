//! Decoder for PHP `serialize()` payloads stored in the watchdog `variables` column.
//!
//! Scalars, strings and arrays are decoded. Objects, custom-serialized
//! classes, enums and references are skipped over and surface as
//! [`PhpValue::Ignored`] instead of failing the decode.

use std::collections::HashMap;

/// Marker substituted for values that are not decoded
pub const IGNORED_MARKER: &str = "[ignored]";

/// Deepest array/object nesting accepted before the payload is rejected
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<(PhpValue, PhpValue)>),
    Ignored,
}

impl PhpValue {
    /// String form used when splicing the value into a message, following
    /// PHP's string conversion for scalars.
    #[must_use]
    pub fn to_display(&self) -> String {
        match self {
            Self::Null | Self::Bool(false) => String::new(),
            Self::Bool(true) => "1".to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
            Self::Array(_) => "Array".to_string(),
            Self::Ignored => IGNORED_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnserializeError {
    #[error("Unexpected end of payload at byte {0}")]
    UnexpectedEnd(usize),

    #[error("Unexpected byte '{found}' at {pos}, expected {expected}")]
    Unexpected {
        pos: usize,
        found: char,
        expected: &'static str,
    },

    #[error("Invalid number at byte {0}")]
    InvalidNumber(usize),

    #[error("Unknown type tag '{tag}' at byte {pos}")]
    UnknownTag { pos: usize, tag: char },

    #[error("Trailing data after byte {0}")]
    TrailingData(usize),

    #[error("Nesting too deep at byte {0}")]
    TooDeep(usize),
}

/// Decode a complete payload.
pub fn unserialize(input: &[u8]) -> Result<PhpValue, UnserializeError> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    if parser.pos != input.len() {
        return Err(UnserializeError::TrailingData(parser.pos));
    }
    Ok(value)
}

/// Decode a payload into a placeholder map (`"@name" -> "value"`).
///
/// An empty payload, `N;` or a non-array value yields an empty map.
pub fn placeholder_map(input: &[u8]) -> Result<HashMap<String, String>, UnserializeError> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }
    let PhpValue::Array(entries) = unserialize(input)? else {
        return Ok(HashMap::new());
    };
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key.to_display(), value.to_display()))
        .collect())
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Result<u8, UnserializeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(UnserializeError::UnexpectedEnd(self.pos))
    }

    fn next(&mut self) -> Result<u8, UnserializeError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, wanted: u8, expected: &'static str) -> Result<(), UnserializeError> {
        let pos = self.pos;
        let found = self.next()?;
        if found == wanted {
            Ok(())
        } else {
            Err(UnserializeError::Unexpected {
                pos,
                found: char::from(found),
                expected,
            })
        }
    }

    /// Bytes up to (not including) `terminator`, consuming the terminator
    fn until(&mut self, terminator: u8) -> Result<&[u8], UnserializeError> {
        let start = self.pos;
        let len = self.input[start..]
            .iter()
            .position(|&b| b == terminator)
            .ok_or(UnserializeError::UnexpectedEnd(self.input.len()))?;
        self.pos = start + len + 1;
        Ok(&self.input[start..start + len])
    }

    fn number<T: std::str::FromStr>(&mut self, terminator: u8) -> Result<T, UnserializeError> {
        let start = self.pos;
        let raw = self.until(terminator)?;
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(UnserializeError::InvalidNumber(start))
    }

    fn float(&mut self) -> Result<f64, UnserializeError> {
        let start = self.pos;
        let raw = self.until(b';')?;
        match raw {
            b"INF" => Ok(f64::INFINITY),
            b"-INF" => Ok(f64::NEG_INFINITY),
            b"NAN" => Ok(f64::NAN),
            _ => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or(UnserializeError::InvalidNumber(start)),
        }
    }

    /// `LEN:"bytes"` with LEN counted in bytes
    fn quoted(&mut self) -> Result<&[u8], UnserializeError> {
        let len: usize = self.number(b':')?;
        self.expect(b'"', "opening quote")?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or(UnserializeError::UnexpectedEnd(self.input.len()))?;
        self.pos = end;
        self.expect(b'"', "closing quote")?;
        Ok(&self.input[start..end])
    }

    fn value(&mut self) -> Result<PhpValue, UnserializeError> {
        let tag_pos = self.pos;
        let tag = self.next()?;
        if tag == b'N' {
            self.expect(b';', "';'")?;
            return Ok(PhpValue::Null);
        }
        self.expect(b':', "':'")?;

        match tag {
            b'b' => {
                let flag: u8 = self.number(b';')?;
                Ok(PhpValue::Bool(flag != 0))
            }
            b'i' => Ok(PhpValue::Int(self.number(b';')?)),
            b'd' => Ok(PhpValue::Float(self.float()?)),
            b's' => {
                let bytes = self.quoted()?;
                let text = String::from_utf8_lossy(bytes).into_owned();
                self.expect(b';', "';'")?;
                Ok(PhpValue::Str(text))
            }
            b'a' => {
                let count: usize = self.number(b':')?;
                let entries = self.members(count)?;
                Ok(PhpValue::Array(entries))
            }
            b'O' => {
                self.quoted()?;
                self.expect(b':', "':'")?;
                let count: usize = self.number(b':')?;
                self.members(count)?;
                Ok(PhpValue::Ignored)
            }
            b'C' => {
                self.quoted()?;
                self.expect(b':', "':'")?;
                let len: usize = self.number(b':')?;
                self.expect(b'{', "'{'")?;
                self.pos = self
                    .pos
                    .checked_add(len)
                    .filter(|&end| end <= self.input.len())
                    .ok_or(UnserializeError::UnexpectedEnd(self.input.len()))?;
                self.expect(b'}', "'}'")?;
                Ok(PhpValue::Ignored)
            }
            b'E' => {
                self.quoted()?;
                self.expect(b';', "';'")?;
                Ok(PhpValue::Ignored)
            }
            b'r' | b'R' => {
                let _: i64 = self.number(b';')?;
                Ok(PhpValue::Ignored)
            }
            other => Err(UnserializeError::UnknownTag {
                pos: tag_pos,
                tag: char::from(other),
            }),
        }
    }

    /// `{key value key value ...}` with `count` pairs
    fn members(&mut self, count: usize) -> Result<Vec<(PhpValue, PhpValue)>, UnserializeError> {
        self.expect(b'{', "'{'")?;
        if self.depth >= MAX_DEPTH {
            return Err(UnserializeError::TooDeep(self.pos));
        }
        self.depth += 1;
        let mut entries = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let key = self.value()?;
            let value = self.value()?;
            entries.push((key, value));
        }
        self.depth -= 1;
        self.expect(b'}', "'}'")?;
        Ok(entries)
    }
}
