//! Numeric token scanner
//!
//! Shared by path data, point lists, view boxes and transform arguments. Numbers
//! may be separated by whitespace, a comma, or nothing at all when the next number
//! starts with a sign or a second decimal point (`1-2.5.5` is `1, -2.5, 0.5`).
use crate::{Scalar, SvgError, utils::is_space};

/// Check whether byte belongs to the path command alphabet
#[inline]
pub(crate) fn is_command(byte: u8) -> bool {
    matches!(
        byte,
        b'M' | b'm'
            | b'Z'
            | b'z'
            | b'L'
            | b'l'
            | b'H'
            | b'h'
            | b'V'
            | b'v'
            | b'C'
            | b'c'
            | b'S'
            | b's'
            | b'Q'
            | b'q'
            | b'T'
            | b't'
            | b'A'
            | b'a'
    )
}

// bytes which end a number run
#[inline]
fn is_terminator(byte: u8) -> bool {
    is_command(byte) || byte == b')'
}

// bytes which can not be a part of garbage trailing a number
#[inline]
fn is_boundary(byte: u8) -> bool {
    is_space(byte)
        || is_terminator(byte)
        || matches!(byte, b',' | b'+' | b'-' | b'.' | b'0'..=b'9')
}

/// Cursor over a string that produces numbers on demand
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_offset(text, 0)
    }

    /// Start scanning from the specified byte offset
    pub fn with_offset(text: &'a str, offset: usize) -> Self {
        Self {
            text,
            offset: offset.min(text.len()),
        }
    }

    /// Byte offset from which scanning resumes
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Unconsumed part of the input
    pub fn rest(&self) -> &'a str {
        self.text.get(self.offset..).unwrap_or("")
    }

    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.offset).copied()
    }

    /// Consume single character
    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.rest().chars().next()?;
        self.offset += ch.len_utf8();
        Some(ch)
    }

    /// Skip whitespace
    pub fn skip_spaces(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.offset += 1;
        }
    }

    /// Skip whitespace and commas
    pub fn skip_separators(&mut self) {
        while self.peek().is_some_and(|byte| is_space(byte) || byte == b',') {
            self.offset += 1;
        }
    }

    /// Consume ASCII letters
    pub(crate) fn ident(&mut self) -> &'a str {
        let start = self.offset;
        while self.peek().is_some_and(|byte| byte.is_ascii_alphabetic()) {
            self.offset += 1;
        }
        &self.text[start..self.offset]
    }

    // end of the longest prefix matching `[+-]? digits? (. digits?)? ([eE] [+-]? digits)?`
    fn numeric_end(&self, start: usize) -> usize {
        let bytes = self.text.as_bytes();
        let digits = |mut end: usize| {
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
            end
        };
        let mut end = start;
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        end = digits(end);
        if bytes.get(end) == Some(&b'.') {
            end = digits(end + 1);
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_end = digits(exp);
            if exp_end > exp {
                end = exp_end;
            }
        }
        end
    }

    fn parse_token(&self, start: usize, end: usize) -> Result<Scalar, SvgError> {
        let token = &self.text.as_bytes()[start..end];
        lexical_core::parse::<Scalar>(token).map_err(|_| SvgError::InvalidNumber {
            offset: start,
            token: String::from_utf8_lossy(token).into_owned(),
        })
    }

    /// Scan next number
    ///
    /// Returns `None` once the input ends or a path command letter or a closing
    /// parenthesis is reached, the scanner is left pointing at that byte. A token
    /// that fails to parse is an error, unless it is the trailing remainder of the
    /// input in which case it is silently dropped.
    pub fn number(&mut self) -> Result<Option<Scalar>, SvgError> {
        self.skip_separators();
        let start = self.offset;
        match self.peek() {
            None => return Ok(None),
            Some(byte) if is_terminator(byte) => return Ok(None),
            Some(_) => {}
        }
        let bytes = self.text.as_bytes();
        let mut end = self.numeric_end(start).max(start + 1);
        while bytes.get(end).is_some_and(|byte| !is_boundary(*byte)) {
            end += 1;
        }
        match self.parse_token(start, end) {
            Ok(value) => {
                self.offset = end;
                Ok(Some(value))
            }
            Err(_) if end == bytes.len() => {
                tracing::debug!(remainder = &self.text[start..], "dropping trailing garbage");
                self.offset = end;
                Ok(None)
            }
            Err(error) => {
                self.offset = end;
                Err(error)
            }
        }
    }

    /// Scan next number which is mandatory
    pub fn expect_number(&mut self) -> Result<Scalar, SvgError> {
        let offset = self.offset;
        self.number()?
            .ok_or(SvgError::NumberExpected { offset })
    }

    /// Scan number immediately followed by optional alphabetic units suffix (`10deg`)
    pub fn number_units(&mut self) -> Result<Option<(Scalar, &'a str)>, SvgError> {
        self.skip_separators();
        let start = self.offset;
        match self.peek() {
            None => return Ok(None),
            Some(byte) if is_terminator(byte) => return Ok(None),
            Some(_) => {}
        }
        let end = self.numeric_end(start);
        if end == start {
            return Err(SvgError::NumberExpected { offset: start });
        }
        let value = self.parse_token(start, end)?;
        self.offset = end;
        Ok(Some((value, self.ident())))
    }

    /// Scan elliptic arc flag, flags do not require separators (`a1 1 0 01 5 5`)
    pub fn flag(&mut self) -> Result<bool, SvgError> {
        self.skip_separators();
        let offset = self.offset;
        let flag = match self.peek() {
            Some(b'0') => false,
            Some(b'1') => true,
            _ => return Err(SvgError::InvalidFlag { offset }),
        };
        self.offset += 1;
        Ok(flag)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Scalar, SvgError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.number().transpose()
    }
}

/// Result of scanning a run of numbers
#[derive(Debug, Clone, PartialEq)]
pub struct NumberScan {
    /// Numbers in the order of appearance
    pub numbers: Vec<Scalar>,
    /// Byte offset at which scanning stopped
    pub offset: usize,
}

/// Scan all numbers starting at `offset` until the input ends or a command letter
/// or a closing parenthesis is found.
pub fn scan_numbers(text: &str, offset: usize) -> Result<NumberScan, SvgError> {
    let mut scanner = Scanner::with_offset(text, offset);
    let numbers = scanner.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok(NumberScan {
        numbers,
        offset: scanner.offset(),
    })
}
