//! Byte provenance for every parsed item.

use std::fmt;

/// A `(start, len)` window into the inspected buffer.
///
/// Every node, frame, payload and section carries one. Spans never reach
/// past the end of the buffer they were produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ByteSpan {
    /// Offset of the first byte (0-based, inclusive)
    pub start: usize,
    /// Number of bytes covered
    pub len: usize,
}

impl ByteSpan {
    /// Creates a span from a start offset and a length
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Creates a span from half-open `[start, end)` offsets
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end.saturating_sub(start),
        }
    }

    /// Offset one past the last byte
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns `true` if this span has zero length
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Smallest span covering both `self` and `other`
    pub fn cover(&self, other: &ByteSpan) -> ByteSpan {
        ByteSpan::from_bounds(self.start.min(other.start), self.end().max(other.end()))
    }

    /// The bytes this span covers, or an empty slice if it lies outside `data`
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        data.get(self.start..self.end()).unwrap_or(&[])
    }
}

impl fmt::Display for ByteSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}+{}", self.start, self.len)
    }
}

/// Returns `true` if `spans`, sorted by start, cover `whole` exactly once.
///
/// Used by tests to check that children tile their parent.
pub fn tiles(whole: ByteSpan, spans: impl IntoIterator<Item = ByteSpan>) -> bool {
    let mut spans: Vec<ByteSpan> = spans.into_iter().filter(|s| !s.is_empty()).collect();
    spans.sort_by_key(|s| s.start);

    let mut expected = whole.start;
    for span in spans {
        if span.start != expected {
            return false;
        }
        expected = span.end();
    }
    expected == whole.end()
}
