//! Binary payload extraction.
//!
//! A frame hands every line ending in the extractor's keyword to
//! [`PayloadExtractor::extract`]. The extractor decides how far the payload
//! reaches; the frame never tokenizes those bytes.

use crate::cursor::{find_subsequence, ByteCursor};
use crate::error::{Error, Result};
use crate::span::ByteSpan;
use tracing::{debug, warn};

const STREAM: &[u8] = b"stream";
const END_STREAM: &[u8] = b"endstream";

/// An embedded binary payload inside an indirect object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Whole payload, keyword through `trailer`
    pub span: ByteSpan,
    /// The start keyword
    pub keyword: ByteSpan,
    /// Line terminator after the keyword (may be empty)
    pub line_end: ByteSpan,
    /// Raw payload bytes
    pub data: ByteSpan,
    /// The end keyword, if one was found
    pub end_keyword: Option<ByteSpan>,
    /// Remaining bytes up to the payload's limit
    pub trailer: ByteSpan,
}

impl Payload {
    /// The raw payload bytes
    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        self.data.slice(data)
    }
}

/// Locates and bounds embedded payloads
pub trait PayloadExtractor: Send + Sync {
    /// The keyword a payload's start line ends with
    fn keyword(&self) -> &[u8];

    /// Offset of the keyword within `line`, if the line starts a payload
    fn keyword_offset(&self, line: &[u8]) -> Option<usize> {
        let keyword = self.keyword();
        line.ends_with(keyword).then(|| line.len() - keyword.len())
    }

    /// Extracts the payload whose keyword starts at `keyword_start`.
    ///
    /// The returned payload must span `[keyword_start, limit)` exactly.
    fn extract(&self, data: &[u8], keyword_start: usize, limit: usize) -> Result<Payload>;
}

/// Extractor for PDF `stream ... endstream` payloads
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamExtractor;

impl PayloadExtractor for StreamExtractor {
    fn keyword(&self) -> &[u8] {
        STREAM
    }

    fn keyword_offset(&self, line: &[u8]) -> Option<usize> {
        if line.ends_with(END_STREAM) {
            return None;
        }
        line.ends_with(STREAM).then(|| line.len() - STREAM.len())
    }

    fn extract(&self, data: &[u8], keyword_start: usize, limit: usize) -> Result<Payload> {
        let mut cursor = ByteCursor::at(data, keyword_start).bounded(limit);
        if !cursor.starts_with(STREAM) {
            return Err(Error::signature_mismatch(keyword_start, "stream keyword"));
        }
        cursor.skip(STREAM.len());
        let keyword = ByteSpan::new(keyword_start, STREAM.len());

        let eol_start = cursor.position();
        if cursor.starts_with(b"\r\n") {
            cursor.skip(2);
        } else if matches!(cursor.peek_byte(), Some(b'\r' | b'\n')) {
            cursor.skip(1);
        }
        let line_end = ByteSpan::from_bounds(eol_start, cursor.position());

        let data_start = cursor.position();
        let payload = match find_subsequence(cursor.rest(), END_STREAM) {
            Some(relative) => {
                let end_start = data_start + relative;
                let end_keyword = ByteSpan::new(end_start, END_STREAM.len());
                Payload {
                    span: ByteSpan::from_bounds(keyword_start, limit),
                    keyword,
                    line_end,
                    data: ByteSpan::from_bounds(data_start, end_start),
                    end_keyword: Some(end_keyword),
                    trailer: ByteSpan::from_bounds(end_keyword.end(), limit),
                }
            }
            None => {
                warn!("Stream at {} has no endstream before {}", keyword_start, limit);
                Payload {
                    span: ByteSpan::from_bounds(keyword_start, limit),
                    keyword,
                    line_end,
                    data: ByteSpan::from_bounds(data_start, limit),
                    end_keyword: None,
                    trailer: ByteSpan::new(limit, 0),
                }
            }
        };

        debug!(
            "Stream at {}: {} data bytes",
            keyword_start, payload.data.len
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::tiles;

    #[test]
    fn test_keyword_offset() {
        let extractor = StreamExtractor;
        assert_eq!(extractor.keyword_offset(b"stream"), Some(0));
        assert_eq!(extractor.keyword_offset(b"<</Length 5>>stream"), Some(13));
        assert_eq!(extractor.keyword_offset(b"endstream"), None);
        assert_eq!(extractor.keyword_offset(b"streams"), None);
    }

    #[test]
    fn test_extract_with_crlf() {
        let data = b"stream\r\nhello\r\nendstream\r\n";
        let payload = StreamExtractor.extract(data, 0, data.len()).unwrap();

        assert_eq!(payload.keyword, ByteSpan::new(0, 6));
        assert_eq!(payload.line_end, ByteSpan::new(6, 2));
        assert_eq!(payload.bytes(data), b"hello\r\n");
        assert_eq!(payload.end_keyword, Some(ByteSpan::new(15, 9)));
        assert_eq!(payload.trailer, ByteSpan::new(24, 2));
        assert!(tiles(
            payload.span,
            [
                payload.keyword,
                payload.line_end,
                payload.data,
                payload.end_keyword.unwrap(),
                payload.trailer,
            ]
        ));
    }

    #[test]
    fn test_extract_without_endstream() {
        let data = b"xxstream\nbinary\x00\xff";
        let payload = StreamExtractor.extract(data, 2, data.len()).unwrap();
        assert_eq!(payload.line_end, ByteSpan::new(8, 1));
        assert_eq!(payload.data, ByteSpan::from_bounds(9, data.len()));
        assert!(payload.end_keyword.is_none());
        assert!(payload.trailer.is_empty());
    }

    #[test]
    fn test_extract_respects_limit() {
        let data = b"stream\nabc\nendstream\nmore";
        let payload = StreamExtractor.extract(data, 0, 10).unwrap();
        assert_eq!(payload.span, ByteSpan::new(0, 10));
        assert!(payload.end_keyword.is_none());
    }

    #[test]
    fn test_extract_signature_mismatch() {
        assert!(matches!(
            StreamExtractor.extract(b"strem", 0, 5),
            Err(Error::StructuralSignatureMismatch { .. })
        ));
    }
}
