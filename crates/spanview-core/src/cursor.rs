//! Positional reader over one immutable buffer.
//!
//! The cursor always reports absolute offsets into the full buffer, even when
//! it has been narrowed with [`ByteCursor::bounded`] to a sub-region. Callers
//! rely on a lookahead-then-pushback idiom: [`ByteCursor::read_run`] lands
//! *after* its terminator, and whoever needs to re-inspect that byte must
//! call [`ByteCursor::seek_backward`] with 1 themselves.

use crate::error::{Error, Result};
use crate::span::ByteSpan;
use std::borrow::Cow;

/// PDF whitespace: NUL, TAB, LF, FF, CR, SPACE
pub const WHITESPACE: &[u8] = b"\x00\t\n\x0c\r ";

/// Terminators for a bare token (whitespace followed by delimiters)
pub const TOKEN_TERMINATORS: &[u8] = b"\x00\t\n\x0c\r ()<>[]{}/%";

/// Line terminators
pub const LINE_TERMINATORS: &[u8] = b"\r\n";

/// Returns `true` for PDF whitespace bytes
pub fn is_whitespace(byte: u8) -> bool {
    WHITESPACE.contains(&byte)
}

/// Find a subsequence within a byte slice
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// A run of bytes consumed by [`ByteCursor::read_run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    /// Offset of the first consumed byte
    pub start: usize,
    /// Bytes before the terminator
    pub bytes: &'a [u8],
    /// The terminator that stopped the run; `None` if the limit did
    pub terminator: Option<u8>,
}

impl<'a> Run<'a> {
    /// The run as text (lossy for non-UTF-8 input)
    pub fn text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }
}

/// One line as returned by [`ByteCursor::read_line`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Offset of the first byte of the line
    pub start: usize,
    /// Line content without its terminator
    pub content: &'a [u8],
    /// 2 for CRLF, 1 for a lone CR or LF, 0 at the limit
    pub terminator_len: usize,
}

impl Line<'_> {
    /// Span of the line including its terminator
    pub fn span(&self) -> ByteSpan {
        ByteSpan::new(self.start, self.content.len() + self.terminator_len)
    }

    /// Offset just past the terminator
    pub fn end(&self) -> usize {
        self.start + self.content.len() + self.terminator_len
    }
}

/// Sequential and random-access reader with an upper limit
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at offset 0 covering the whole buffer
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            limit: data.len(),
        }
    }

    /// Creates a cursor at `position` covering the whole buffer
    pub fn at(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position: position.min(data.len()),
            limit: data.len(),
        }
    }

    /// A copy of this cursor that cannot read at or past `limit`
    pub fn bounded(&self, limit: usize) -> ByteCursor<'a> {
        let limit = limit.min(self.limit);
        ByteCursor {
            data: self.data,
            position: self.position.min(limit),
            limit,
        }
    }

    /// The full underlying buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current absolute position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Offset the cursor cannot read past
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns `true` while at least one byte can be read
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Reads one byte and advances
    pub fn read_byte(&mut self) -> Result<u8> {
        if self.position >= self.limit {
            return Err(Error::end_of_input(self.position));
        }
        let byte = self.data[self.position];
        self.position += 1;
        Ok(byte)
    }

    /// The next byte without advancing
    pub fn peek_byte(&self) -> Option<u8> {
        if self.position < self.limit {
            Some(self.data[self.position])
        } else {
            None
        }
    }

    /// Consumes bytes until one of `terminators` or the limit.
    ///
    /// The terminator itself is consumed; the position lands after it.
    pub fn read_run(&mut self, terminators: &[u8]) -> Run<'a> {
        let start = self.position;
        while self.position < self.limit {
            let byte = self.data[self.position];
            self.position += 1;
            if terminators.contains(&byte) {
                return Run {
                    start,
                    bytes: &self.data[start..self.position - 1],
                    terminator: Some(byte),
                };
            }
        }
        Run {
            start,
            bytes: &self.data[start..self.position],
            terminator: None,
        }
    }

    /// Like [`read_run`](Self::read_run), returning the consumed text
    pub fn read_ascii_run(&mut self, terminators: &[u8]) -> (String, Option<u8>) {
        let run = self.read_run(terminators);
        (run.text().into_owned(), run.terminator)
    }

    /// Reads one line; CRLF counts as a single terminator
    pub fn read_line(&mut self) -> Option<Line<'a>> {
        if !self.has_remaining() {
            return None;
        }
        let run = self.read_run(LINE_TERMINATORS);
        let terminator_len = match run.terminator {
            Some(b'\r') if self.peek_byte() == Some(b'\n') => {
                self.position += 1;
                2
            }
            Some(_) => 1,
            None => 0,
        };
        Some(Line {
            start: run.start,
            content: run.bytes,
            terminator_len,
        })
    }

    /// Consumes bytes while `predicate` holds
    pub fn skip_while(&mut self, predicate: impl Fn(u8) -> bool) -> usize {
        let start = self.position;
        while let Some(byte) = self.peek_byte() {
            if !predicate(byte) {
                break;
            }
            self.position += 1;
        }
        self.position - start
    }

    /// Moves back `n` bytes, clamped at 0
    pub fn seek_backward(&mut self, n: usize) {
        self.position = self.position.saturating_sub(n);
    }

    /// Moves forward `n` bytes, clamped at the limit
    pub fn skip(&mut self, n: usize) {
        self.position = self.position.saturating_add(n).min(self.limit);
    }

    /// Jumps to an absolute position, clamped at the limit
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.limit);
    }

    /// Returns `true` if the bytes at the position equal `literal`
    pub fn starts_with(&self, literal: &[u8]) -> bool {
        self.data[self.position..self.limit].starts_with(literal)
    }

    /// Bytes from the position up to the limit
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.position..self.limit]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_subsequence() {
        let data = b"data\nendstream\nendobj";
        assert_eq!(find_subsequence(data, b"endstream"), Some(5));
        assert_eq!(find_subsequence(data, b"endobj"), Some(15));
        assert_eq!(find_subsequence(data, b"missing"), None);
        assert_eq!(find_subsequence(b"ab", b"abc"), None);
    }

    #[test]
    fn test_read_byte_end_of_input() {
        let mut cursor = ByteCursor::new(b"a");
        assert_eq!(cursor.read_byte().unwrap(), b'a');
        assert!(matches!(
            cursor.read_byte(),
            Err(Error::EndOfInput { offset: 1 })
        ));
    }

    #[test]
    fn test_read_run_lands_after_terminator() {
        let mut cursor = ByteCursor::new(b"/Type /Page");
        cursor.skip(1);
        let run = cursor.read_run(TOKEN_TERMINATORS);
        assert_eq!(run.bytes, b"Type");
        assert_eq!(run.terminator, Some(b' '));
        assert_eq!(cursor.position(), 6);

        cursor.seek_backward(1);
        assert_eq!(cursor.peek_byte(), Some(b' '));
    }

    #[test]
    fn test_read_run_at_limit_has_no_terminator() {
        let mut cursor = ByteCursor::new(b"12345");
        let (text, terminator) = cursor.read_ascii_run(TOKEN_TERMINATORS);
        assert_eq!(text, "12345");
        assert_eq!(terminator, None);
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn test_read_line_terminators() {
        let mut cursor = ByteCursor::new(b"one\r\ntwo\rthree\nfour");
        let lines: Vec<_> = std::iter::from_fn(|| cursor.read_line())
            .map(|l| (l.content.to_vec(), l.terminator_len))
            .collect();
        assert_eq!(
            lines,
            vec![
                (b"one".to_vec(), 2),
                (b"two".to_vec(), 1),
                (b"three".to_vec(), 1),
                (b"four".to_vec(), 0),
            ]
        );
    }

    #[test]
    fn test_seek_clamping() {
        let mut cursor = ByteCursor::new(b"abc");
        cursor.seek_backward(10);
        assert_eq!(cursor.position(), 0);
        cursor.skip(10);
        assert_eq!(cursor.position(), 3);
        assert!(!cursor.has_remaining());
    }

    #[test]
    fn test_bounded_cursor_keeps_absolute_offsets() {
        let mut outer = ByteCursor::new(b"0123456789");
        outer.skip(2);
        let mut inner = outer.bounded(5);
        assert_eq!(inner.position(), 2);
        assert_eq!(inner.rest(), b"234");
        let run = inner.read_run(b"x");
        assert_eq!(run.start, 2);
        assert_eq!(run.terminator, None);
        assert!(inner.read_byte().is_err());
    }
}
