//! Fixed-grammar records that bracket the object sequence.
//!
//! Unlike the object parser these are strict: each returns
//! [`Error::StructuralSignatureMismatch`] when its keyword is absent, and the
//! scanner then falls back to treating the line as unparsed.

use crate::cursor::{ByteCursor, Line};
use crate::error::{Error, Result};
use crate::node::{Node, NodeKind};
use crate::object::ObjectParser;
use crate::span::ByteSpan;
use tracing::{debug, trace};

const HEADER_PREFIX: &[u8] = b"%PDF-";
const XREF: &[u8] = b"xref";
const TRAILER: &[u8] = b"trailer";
const STARTXREF: &[u8] = b"startxref";

fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

fn read_line<'a>(cursor: &mut ByteCursor<'a>) -> Result<Line<'a>> {
    cursor
        .read_line()
        .ok_or_else(|| Error::end_of_input(cursor.position()))
}

/// Whitespace-separated fields of a line
fn fields(content: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    content
        .split(|b| b.is_ascii_whitespace())
        .filter(|f| !f.is_empty())
}

/// Parses an unsigned decimal with no sign or fraction
fn parse_digits<T: std::str::FromStr>(bytes: &[u8]) -> Option<T> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

/// `%PDF-x.y` header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The line including its terminator
    pub span: ByteSpan,
    /// Version text after `%PDF-`
    pub version: String,
}

impl Header {
    /// Parses the header line at the cursor
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let line = read_line(cursor)?;
        let Some(version) = line.content.strip_prefix(HEADER_PREFIX) else {
            return Err(Error::signature_mismatch(line.start, "%PDF- header"));
        };
        Ok(Self {
            span: line.span(),
            version: String::from_utf8_lossy(trim_end(version)).into_owned(),
        })
    }
}

/// A `%` comment line (including `%%EOF`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The line including its terminator
    pub span: ByteSpan,
    /// Comment text after the `%`
    pub text: String,
}

impl Comment {
    /// Parses the comment line at the cursor
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let line = read_line(cursor)?;
        let Some(text) = line.content.strip_prefix(b"%") else {
            return Err(Error::signature_mismatch(line.start, "'%' comment"));
        };
        Ok(Self {
            span: line.span(),
            text: String::from_utf8_lossy(text).into_owned(),
        })
    }

    /// Returns `true` for the `%%EOF` marker
    pub fn is_eof_marker(&self) -> bool {
        self.text.trim_end() == "%EOF"
    }
}

/// One `oooooooooo ggggg n` line of a cross-reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefEntry {
    /// The line including its terminator
    pub span: ByteSpan,
    /// Object number implied by the subsection position
    pub object_number: u32,
    /// Byte offset (in-use entries) or next free object (free entries)
    pub offset: u64,
    /// Generation number
    pub generation: u16,
    /// `n` entries are in use, `f` entries are free
    pub in_use: bool,
}

impl XrefEntry {
    fn parse(line: &Line<'_>, object_number: u32) -> Option<Self> {
        let mut fields = fields(line.content);
        let offset = parse_digits(fields.next()?)?;
        let generation = parse_digits(fields.next()?)?;
        let in_use = match fields.next()? {
            b"n" => true,
            b"f" => false,
            _ => return None,
        };
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            span: line.span(),
            object_number,
            offset,
            generation,
            in_use,
        })
    }
}

/// A `first count` header and its entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefSubsection {
    /// Header line through the last entry
    pub span: ByteSpan,
    /// The `first count` line
    pub header: ByteSpan,
    /// First object number
    pub first: u32,
    /// Declared entry count
    pub count: u32,
    /// Entries actually parsed (fewer than `count` if the table is short)
    pub entries: Vec<XrefEntry>,
}

fn parse_subsection_header(content: &[u8]) -> Option<(u32, u32)> {
    let mut fields = fields(content);
    let first = parse_digits(fields.next()?)?;
    let count = parse_digits(fields.next()?)?;
    fields.next().is_none().then_some((first, count))
}

/// Classic `xref` cross-reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReferenceTable {
    /// Whole table
    pub span: ByteSpan,
    /// The `xref` line
    pub keyword: ByteSpan,
    /// Subsections in file order
    pub subsections: Vec<XrefSubsection>,
}

impl CrossReferenceTable {
    /// Parses the table at the cursor, stopping at the first line that is
    /// neither a subsection header nor an expected entry
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.position();
        let line = read_line(cursor)?;
        if trim_end(line.content) != XREF {
            return Err(Error::signature_mismatch(line.start, "xref keyword"));
        }
        let keyword = line.span();

        let mut subsections = Vec::new();
        loop {
            let mut probe = cursor.clone();
            let Some(header_line) = probe.read_line() else {
                break;
            };
            let Some((first, count)) = parse_subsection_header(header_line.content) else {
                break;
            };
            *cursor = probe;

            let mut entries = Vec::new();
            for index in 0..count {
                let mut probe = cursor.clone();
                let entry = probe
                    .read_line()
                    .and_then(|l| XrefEntry::parse(&l, first.saturating_add(index)));
                match entry {
                    Some(entry) => {
                        entries.push(entry);
                        *cursor = probe;
                    }
                    None => {
                        debug!(
                            "Subsection {} {} ended after {} entries",
                            first,
                            count,
                            entries.len()
                        );
                        break;
                    }
                }
            }

            trace!("Subsection {} {} at {}", first, count, header_line.start);
            subsections.push(XrefSubsection {
                span: ByteSpan::from_bounds(header_line.start, cursor.position()),
                header: header_line.span(),
                first,
                count,
                entries,
            });
        }

        Ok(Self {
            span: ByteSpan::from_bounds(start, cursor.position()),
            keyword,
            subsections,
        })
    }

    /// All entries across subsections
    pub fn entries(&self) -> impl Iterator<Item = &XrefEntry> + '_ {
        self.subsections.iter().flat_map(|s| s.entries.iter())
    }
}

/// `trailer` keyword followed by its dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    /// Keyword through the fillers after the dictionary
    pub span: ByteSpan,
    /// The `trailer` keyword
    pub keyword: ByteSpan,
    /// Fillers and the dictionary, in parse order
    pub body: Vec<Node>,
}

impl Trailer {
    /// Parses the trailer at the cursor
    pub fn parse(cursor: &mut ByteCursor<'_>, parser: &ObjectParser) -> Result<Self> {
        let start = cursor.position();
        if !cursor.starts_with(TRAILER) {
            return Err(Error::signature_mismatch(start, "trailer keyword"));
        }
        cursor.skip(TRAILER.len());
        let keyword = ByteSpan::new(start, TRAILER.len());

        let mut body = Vec::new();
        let mut seen_dictionary = false;
        loop {
            let token_start = cursor.position();
            if seen_dictionary && !matches!(cursor.peek_byte(), Some(b'\r' | b'\n' | b' ')) {
                break;
            }
            match parser.parse_object(cursor, &mut body) {
                Ok(Some(node)) => {
                    if matches!(node.kind, NodeKind::Dictionary(_)) {
                        seen_dictionary = true;
                    } else if !node.is_filler() {
                        // Anything but whitespace before the dictionary ends the record.
                        body.pop();
                        cursor.seek(token_start);
                        break;
                    }
                }
                Ok(None) | Err(_) => {
                    cursor.seek(token_start);
                    break;
                }
            }
        }

        Ok(Self {
            span: ByteSpan::from_bounds(start, cursor.position()),
            keyword,
            body,
        })
    }

    /// The trailer dictionary, if one was found
    pub fn dictionary(&self) -> Option<&Node> {
        self.body
            .iter()
            .find(|n| matches!(n.kind, NodeKind::Dictionary(_)))
    }
}

/// `startxref` keyword followed by the offset line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartXref {
    /// Keyword line through the offset line
    pub span: ByteSpan,
    /// The `startxref` line
    pub keyword: ByteSpan,
    /// The offset line, if present
    pub offset_line: Option<ByteSpan>,
    /// The declared offset
    pub offset: Option<u64>,
}

impl StartXref {
    /// Parses the record at the cursor
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.position();
        let line = read_line(cursor)?;
        if trim_end(line.content) != STARTXREF {
            return Err(Error::signature_mismatch(line.start, "startxref keyword"));
        }

        let mut probe = cursor.clone();
        let (offset_line, offset) = match probe
            .read_line()
            .and_then(|l| parse_digits::<u64>(trim_end(l.content)).map(|o| (l, o)))
        {
            Some((l, offset)) => {
                *cursor = probe;
                (Some(l.span()), Some(offset))
            }
            None => (None, None),
        };

        Ok(Self {
            span: ByteSpan::from_bounds(start, cursor.position()),
            keyword: line.span(),
            offset_line,
            offset,
        })
    }
}
