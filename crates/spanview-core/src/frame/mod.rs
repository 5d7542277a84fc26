//! Indirect object frames: `N G obj ... endobj`.
//!
//! A frame is parsed in three passes over its byte range:
//!
//! 1. the start signature (`N G obj` plus its line terminator) and the
//!    `endobj` line that closes the frame,
//! 2. a line scan of the interior for payload start lines, each payload
//!    bounded by the next one or by the interior end,
//! 3. generic tokenizing of the interior prefix before the first payload.
//!
//! Payloads are appended to the body after all tokens, so body order is parse
//! order rather than byte order. The start signature, every body entry and
//! the end signature still tile the frame exactly.

mod payload;

use crate::cursor::{is_whitespace, ByteCursor, Line, WHITESPACE};
use crate::error::{Error, Result};
use crate::node::{Node, NodeKind};
use crate::object::{skip_unrecognized, ObjectParser};
use crate::span::ByteSpan;
use tracing::{debug, trace, warn};

pub use payload::{Payload, PayloadExtractor, StreamExtractor};

const OBJ: &[u8] = b"obj";
const ENDOBJ: &[u8] = b"endobj";

/// One entry of a frame body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyEntry {
    /// A token produced by the object parser
    Token(Node),
    /// A payload isolated before tokenizing
    Payload(Payload),
}

impl BodyEntry {
    /// Bytes covered by this entry
    pub fn span(&self) -> ByteSpan {
        match self {
            BodyEntry::Token(node) => node.span,
            BodyEntry::Payload(payload) => payload.span,
        }
    }
}

/// A parsed `N G obj ... endobj` unit
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObjectFrame {
    /// Object number
    pub object_number: u32,
    /// Generation number
    pub generation: u16,
    /// Whole frame
    pub span: ByteSpan,
    /// `N G obj` and the line terminator consumed after it
    pub start_signature: ByteSpan,
    /// Tokens in parse order followed by payloads
    pub body: Vec<BodyEntry>,
    /// The `endobj` line, `None` if the frame was never closed
    pub end_signature: Option<ByteSpan>,
}

impl IndirectObjectFrame {
    /// Parses a frame whose start signature begins at the cursor.
    ///
    /// On success the cursor is left just past the end signature. A missing
    /// `endobj` is not an error: the frame then runs to the next frame
    /// boundary outside a payload, or the cursor's limit.
    pub fn parse(
        cursor: &mut ByteCursor<'_>,
        parser: &ObjectParser,
        extractor: &dyn PayloadExtractor,
    ) -> Result<Self> {
        let start = cursor.position();
        let (object_number, generation) = read_header(cursor)?;
        consume_signature_terminator(cursor);
        let start_signature = ByteSpan::from_bounds(start, cursor.position());

        let (interior_end, end_signature) = find_end(cursor, extractor);
        if end_signature.is_none() {
            warn!(
                "Object {} {} at {} has no endobj line",
                object_number, generation, start
            );
        }

        let payloads = extract_payloads(cursor, extractor, interior_end)?;
        let token_limit = payloads.first().map_or(interior_end, |p| p.span.start);

        let mut tokens = Vec::new();
        let mut region = cursor.bounded(token_limit);
        loop {
            let token_start = region.position();
            match parser.parse_object(&mut region, &mut tokens) {
                Ok(Some(_)) => {}
                Ok(None) => skip_unrecognized(&mut region, &mut tokens),
                Err(Error::EndOfInput { .. }) => break,
                Err(e) => {
                    warn!("{}", e);
                    region.seek(token_start);
                    skip_unrecognized(&mut region, &mut tokens);
                }
            }
        }

        let mut body: Vec<BodyEntry> = tokens.into_iter().map(BodyEntry::Token).collect();
        body.extend(payloads.into_iter().map(BodyEntry::Payload));

        let end = end_signature.map_or(interior_end, |s| s.end());
        cursor.seek(end);

        debug!(
            "Object {} {} at {}: {} body entries",
            object_number,
            generation,
            start,
            body.len()
        );

        Ok(Self {
            object_number,
            generation,
            span: ByteSpan::from_bounds(start, end),
            start_signature,
            body,
            end_signature,
        })
    }

    /// Body tokens, in parse order
    pub fn tokens(&self) -> impl Iterator<Item = &Node> + '_ {
        self.body.iter().filter_map(|entry| match entry {
            BodyEntry::Token(node) => Some(node),
            BodyEntry::Payload(_) => None,
        })
    }

    /// Body payloads, in parse order
    pub fn payloads(&self) -> impl Iterator<Item = &Payload> + '_ {
        self.body.iter().filter_map(|entry| match entry {
            BodyEntry::Payload(payload) => Some(payload),
            BodyEntry::Token(_) => None,
        })
    }

    /// The first non-filler token
    pub fn value(&self) -> Option<&Node> {
        self.tokens().find(|node| !node.is_filler())
    }

    /// The `/Type` name of the object's dictionary, if it has one
    pub fn type_name(&self) -> Option<&str> {
        let NodeKind::Dictionary(dict) = &self.value()?.kind else {
            return None;
        };
        match &dict.get("Type")?.kind {
            NodeKind::Name(name) => Some(name),
            _ => None,
        }
    }
}

/// Reads `N G obj`, leaving the cursor just past `obj`
fn read_header(cursor: &mut ByteCursor<'_>) -> Result<(u32, u16)> {
    let object_number = read_integer(cursor, "object number")?;
    let generation = read_integer(cursor, "generation number")?;
    if !cursor.starts_with(OBJ) {
        return Err(Error::signature_mismatch(cursor.position(), "'obj' keyword"));
    }
    cursor.skip(OBJ.len());
    Ok((object_number, generation))
}

/// Reads a whitespace-delimited decimal integer and the whitespace after it
fn read_integer<T: std::str::FromStr>(
    cursor: &mut ByteCursor<'_>,
    expected: &'static str,
) -> Result<T> {
    let offset = cursor.position();
    let run = cursor.read_run(WHITESPACE);
    if run.terminator.is_none()
        || run.bytes.is_empty()
        || !run.bytes.iter().all(u8::is_ascii_digit)
    {
        return Err(Error::signature_mismatch(offset, expected));
    }
    let value = run
        .text()
        .parse()
        .map_err(|_| Error::signature_mismatch(offset, expected))?;
    cursor.skip_while(is_whitespace);
    Ok(value)
}

/// Consumes the line terminator after `obj` with exact byte counts.
///
/// CRLF consumes two bytes, a lone CR or LF one; otherwise nothing is
/// consumed. Two bytes are peeked and any over-read is pushed back.
fn consume_signature_terminator(cursor: &mut ByteCursor<'_>) {
    let first = cursor.read_byte().ok();
    let second = cursor.read_byte().ok();
    match (first, second) {
        (Some(b'\r'), Some(b'\n')) => {}
        (Some(b'\r' | b'\n'), Some(_)) => cursor.seek_backward(1),
        (Some(b'\r' | b'\n'), None) => {}
        (Some(_), Some(_)) => cursor.seek_backward(2),
        (Some(_), None) => cursor.seek_backward(1),
        (None, _) => {}
    }
}

/// Finds the `endobj` line; returns the interior end and the end signature.
///
/// Payload bytes are stepped over, so neither `endobj` nor a boundary line
/// inside a stream ends the frame.
fn find_end(
    cursor: &ByteCursor<'_>,
    extractor: &dyn PayloadExtractor,
) -> (usize, Option<ByteSpan>) {
    let mut lines = cursor.clone();
    while let Some(line) = lines.read_line() {
        if let Some(offset) = extractor.keyword_offset(line.content) {
            let keyword_start = line.start + offset;
            match extractor.extract(cursor.data(), keyword_start, cursor.limit()) {
                Ok(Payload {
                    end_keyword: Some(end_keyword),
                    ..
                }) => {
                    trace!("Frame search skipped payload at {}", keyword_start);
                    lines.seek(end_keyword.end());
                }
                Ok(_) => {}
                Err(e) => debug!("{}", e),
            }
            continue;
        }
        if line.content.eq_ignore_ascii_case(ENDOBJ) {
            return (line.start, Some(line.span()));
        }
        if is_frame_boundary(&line) {
            trace!("Frame search stopped at boundary line {}", line.start);
            return (line.start, None);
        }
    }
    (cursor.limit(), None)
}

/// Lines that can only start a new top-level record
fn is_frame_boundary(line: &Line<'_>) -> bool {
    let content = line.content;
    content == b"xref"
        || content.starts_with(b"trailer")
        || content == b"startxref"
        || is_object_header(content)
}

/// Returns `true` if `line` begins with `N G obj`
pub fn is_object_header(line: &[u8]) -> bool {
    let mut cursor = ByteCursor::new(line);
    read_header(&mut cursor).is_ok()
}

/// Locates payload start lines in `[cursor, interior_end)` and extracts them
fn extract_payloads(
    cursor: &ByteCursor<'_>,
    extractor: &dyn PayloadExtractor,
    interior_end: usize,
) -> Result<Vec<Payload>> {
    let mut starts = Vec::new();
    let mut lines = cursor.bounded(interior_end);

    while let Some(line) = lines.read_line() {
        let Some(offset) = extractor.keyword_offset(line.content) else {
            continue;
        };
        let keyword_start = line.start + offset;
        trace!("Payload keyword at {}", keyword_start);
        starts.push(keyword_start);

        // Skip the payload bytes so they are never scanned as lines.
        let probe = extractor.extract(cursor.data(), keyword_start, interior_end)?;
        match probe.end_keyword {
            Some(end_keyword) => lines.seek(end_keyword.end()),
            None => break,
        }
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let limit = starts.get(i + 1).copied().unwrap_or(interior_end);
            extractor.extract(cursor.data(), start, limit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::tiles;
    use pretty_assertions::assert_eq;

    fn parse(input: &[u8]) -> (IndirectObjectFrame, usize) {
        let mut cursor = ByteCursor::new(input);
        let frame =
            IndirectObjectFrame::parse(&mut cursor, &ObjectParser::new(), &StreamExtractor)
                .unwrap();
        (frame, cursor.position())
    }

    fn assert_tiles(frame: &IndirectObjectFrame) {
        let spans = std::iter::once(frame.start_signature)
            .chain(frame.body.iter().map(BodyEntry::span))
            .chain(frame.end_signature);
        assert!(tiles(frame.span, spans), "{:#?}", frame);
    }

    #[test]
    fn test_crlf_frame() {
        let input = b"1 0 obj\r\n42\r\nendobj";
        let (frame, pos) = parse(input);

        assert_eq!(frame.object_number, 1);
        assert_eq!(frame.generation, 0);
        assert_eq!(frame.start_signature, ByteSpan::new(0, "1 0 obj".len() + 2));
        assert_eq!(frame.end_signature, Some(ByteSpan::new(13, 6)));
        assert_eq!(frame.span, ByteSpan::new(0, input.len()));
        assert_eq!(pos, input.len());

        let labels: Vec<_> = frame.tokens().map(Node::label).collect();
        assert_eq!(labels, vec!["42", "NewLine", "NewLine"]);
        assert_tiles(&frame);
    }

    #[test]
    fn test_signature_terminators() {
        let (frame, _) = parse(b"2 0 obj\n<<>>\nendobj\n");
        assert_eq!(frame.start_signature, ByteSpan::new(0, 8));
        assert_eq!(frame.end_signature, Some(ByteSpan::new(13, 7)));

        let (frame, _) = parse(b"3 0 obj\r(x)\rendobj");
        assert_eq!(frame.start_signature, ByteSpan::new(0, 8));

        let (frame, _) = parse(b"4 0 obj<</A 1>>\nendobj");
        assert_eq!(frame.start_signature, ByteSpan::new(0, 7));
        assert_eq!(frame.value().map(Node::label), Some("Dictionary (1 entries)".to_string()));
        assert_tiles(&frame);
    }

    #[test]
    fn test_endobj_case_insensitive() {
        let (frame, _) = parse(b"5 1 obj\ntrue\nENDOBJ\n");
        assert_eq!(frame.generation, 1);
        assert!(frame.end_signature.is_some());
    }

    #[test]
    fn test_stream_payload_is_appended_last() {
        let input = b"6 0 obj\n<</Length 5>>\nstream\nhello\nendstream\nendobj\n";
        let (frame, pos) = parse(input);
        assert_eq!(pos, input.len());

        let last = frame.body.last().unwrap();
        let BodyEntry::Payload(payload) = last else {
            panic!("payload should come last");
        };
        assert_eq!(payload.bytes(input), b"hello\n");
        assert!(frame.tokens().all(|n| n.span.end() <= payload.span.start));
        assert_eq!(frame.payloads().count(), 1);
        assert_tiles(&frame);
    }

    #[test]
    fn test_payload_bytes_are_never_tokenized() {
        let input = b"7 0 obj\n<</Type /XObject>>stream\r\n[<</R R>>(\r\nendstream\r\nendobj\r\n";
        let (frame, _) = parse(input);
        assert_eq!(frame.type_name(), Some("XObject"));
        assert!(frame.tokens().all(|n| !n.is_error()));
        assert_tiles(&frame);
    }

    #[test]
    fn test_two_payloads_keep_parse_order() {
        let input = b"8 0 obj\n1\nstream\na\nendstream\nstream\nb\nendstream\nendobj\n";
        let (frame, _) = parse(input);
        let payloads: Vec<_> = frame.payloads().collect();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].bytes(input), b"a\n");
        assert_eq!(payloads[1].bytes(input), b"b\n");
        assert_eq!(payloads[0].span.end(), payloads[1].span.start);
        assert_tiles(&frame);
    }

    #[test]
    fn test_missing_endobj_stops_at_next_object() {
        let input = b"9 0 obj\n(a)\n10 0 obj\n(b)\nendobj\n";
        let (frame, pos) = parse(input);
        assert!(frame.end_signature.is_none());
        assert_eq!(pos, 12);
        assert_tiles(&frame);
    }

    #[test]
    fn test_record_lines_inside_stream_do_not_close_frame() {
        let input = b"1 0 obj\n<</Length 10>>\nstream\nxref\ntrailer\nendstream\nendobj\n";
        let (frame, pos) = parse(input);
        assert_eq!(pos, input.len());
        assert_eq!(frame.span, ByteSpan::new(0, input.len()));
        assert_eq!(frame.end_signature, Some(ByteSpan::new(53, 7)));

        let payload = frame.payloads().next().unwrap();
        assert_eq!(payload.bytes(input), b"xref\ntrailer\n");
        assert!(payload.end_keyword.is_some());
        assert_tiles(&frame);
    }

    #[test]
    fn test_object_header_inside_stream_does_not_close_frame() {
        let input = b"1 0 obj\n<<>>\nstream\n2 0 obj\nstartxref\nendobj\nendstream\nendobj\n";
        let (frame, pos) = parse(input);
        assert_eq!(pos, input.len());
        assert!(frame.end_signature.is_some());
        assert_eq!(
            frame.payloads().next().unwrap().bytes(input),
            b"2 0 obj\nstartxref\nendobj\n"
        );
        assert_tiles(&frame);
    }

    #[test]
    fn test_stream_without_endstream_falls_back_to_line_scan() {
        let input = b"9 0 obj\nstream\nabc\n10 0 obj\n1\nendobj\n";
        let (frame, pos) = parse(input);
        assert!(frame.end_signature.is_none());
        assert_eq!(pos, 19);
        assert_tiles(&frame);
    }

    #[test]
    fn test_unrecognized_interior_bytes_are_kept() {
        let input = b"11 0 obj\n%c\nendobj";
        let (frame, _) = parse(input);
        let labels: Vec<_> = frame.tokens().map(Node::label).collect();
        assert_eq!(
            labels,
            vec!["Unrecognized 0x25", "Unrecognized 0x63", "NewLine"]
        );
        assert_tiles(&frame);
    }

    #[test]
    fn test_header_mismatch() {
        let mut cursor = ByteCursor::new(b"1 0 ob\n");
        let result =
            IndirectObjectFrame::parse(&mut cursor, &ObjectParser::new(), &StreamExtractor);
        assert!(matches!(
            result,
            Err(Error::StructuralSignatureMismatch { offset: 4, .. })
        ));
    }

    #[test]
    fn test_is_object_header() {
        assert!(is_object_header(b"12 0 obj"));
        assert!(is_object_header(b"12 0 obj<</A 1>>"));
        assert!(!is_object_header(b"12 obj"));
        assert!(!is_object_header(b"x 0 obj"));
        assert!(!is_object_header(b"0000000009 00000 n"));
    }
}
