//! Document scanning: splitting a whole file into top-level sections.
//!
//! The scanner walks the buffer line by line. A line that opens a known
//! record (header, comment, indirect object, `xref`, `trailer`, `startxref`)
//! hands the cursor to that record's parser; anything else accumulates into
//! an [`Section::Unparsed`] run. Sections always tile the whole file.
//!
//! ## Extensibility
//!
//! The [`ScanStrategy`] trait allows alternative scanners:
//!
//! ```no_run
//! use spanview_core::document::{Document, ScanStrategy};
//! use spanview_core::Result;
//!
//! struct WholeFileAsOneSection;
//!
//! impl ScanStrategy for WholeFileAsOneSection {
//!     fn scan(&self, data: &[u8]) -> Result<Document> {
//!         Ok(Document::unparsed(data.len()))
//!     }
//! }
//! ```

mod framing;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::frame::{is_object_header, IndirectObjectFrame, PayloadExtractor, StreamExtractor};
use crate::object::{ObjectParser, ParserConfig};
use crate::span::ByteSpan;
use tracing::{debug, trace, warn};

pub use framing::{
    Comment, CrossReferenceTable, Header, StartXref, Trailer, XrefEntry, XrefSubsection,
};

/// One top-level record of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// `%PDF-x.y`
    Header(Header),
    /// `%...` line
    Comment(Comment),
    /// `N G obj ... endobj`
    Object(IndirectObjectFrame),
    /// `xref` table
    CrossReference(CrossReferenceTable),
    /// `trailer << ... >>`
    Trailer(Trailer),
    /// `startxref` and its offset
    StartXref(StartXref),
    /// Bytes no record parser accepted
    Unparsed(ByteSpan),
}

impl Section {
    /// Bytes covered by this section
    pub fn span(&self) -> ByteSpan {
        match self {
            Section::Header(h) => h.span,
            Section::Comment(c) => c.span,
            Section::Object(o) => o.span,
            Section::CrossReference(x) => x.span,
            Section::Trailer(t) => t.span,
            Section::StartXref(s) => s.span,
            Section::Unparsed(span) => *span,
        }
    }
}

/// A scanned document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Sections in file order
    pub sections: Vec<Section>,
    /// Length of the scanned buffer
    pub len: usize,
}

impl Document {
    /// A document whose bytes are a single unparsed section
    pub fn unparsed(len: usize) -> Self {
        let sections = if len == 0 {
            Vec::new()
        } else {
            vec![Section::Unparsed(ByteSpan::new(0, len))]
        };
        Self { sections, len }
    }

    /// Span of the whole buffer
    pub fn span(&self) -> ByteSpan {
        ByteSpan::new(0, self.len)
    }

    /// The PDF version from the header, if present
    pub fn version(&self) -> Option<&str> {
        self.sections.iter().find_map(|s| match s {
            Section::Header(h) => Some(h.version.as_str()),
            _ => None,
        })
    }

    /// Indirect objects in file order
    pub fn objects(&self) -> impl Iterator<Item = &IndirectObjectFrame> + '_ {
        self.sections.iter().filter_map(|s| match s {
            Section::Object(frame) => Some(frame),
            _ => None,
        })
    }

    /// The last object with the given numbers (later revisions win)
    pub fn object(&self, object_number: u32, generation: u16) -> Option<&IndirectObjectFrame> {
        self.objects()
            .filter(|f| f.object_number == object_number && f.generation == generation)
            .last()
    }

    /// The last trailer in the file
    pub fn trailer(&self) -> Option<&Trailer> {
        self.sections.iter().rev().find_map(|s| match s {
            Section::Trailer(t) => Some(t),
            _ => None,
        })
    }
}

/// Configuration for the scanner
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    /// Maximum number of sections to parse (0 = unlimited); the remainder
    /// becomes one unparsed section
    pub max_sections: usize,
    /// Object parser configuration
    pub parser: ParserConfig,
}

impl ScannerConfig {
    /// Creates a new scanner config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of sections to parse
    pub fn max_sections(mut self, max: usize) -> Self {
        self.max_sections = max;
        self
    }

    /// Sets the object parser configuration
    pub fn parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

/// Trait for implementing custom scanning strategies
pub trait ScanStrategy: Send + Sync {
    /// Scan the provided buffer into a document
    fn scan(&self, data: &[u8]) -> Result<Document>;
}

/// Line-driven PDF document scanner
#[derive(Debug, Clone)]
pub struct Scanner<E = StreamExtractor> {
    config: ScannerConfig,
    parser: ObjectParser,
    extractor: E,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Creates a new scanner with default configuration
    pub fn new() -> Self {
        Self::with_config(ScannerConfig::default())
    }

    /// Creates a new scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            parser: ObjectParser::with_config(config.parser.clone()),
            config,
            extractor: StreamExtractor,
        }
    }
}

impl<E: PayloadExtractor> Scanner<E> {
    /// Replaces the payload extractor
    pub fn with_extractor<F: PayloadExtractor>(self, extractor: F) -> Scanner<F> {
        Scanner {
            config: self.config,
            parser: self.parser,
            extractor,
        }
    }

    /// Parses the record starting on `line`, if the line opens one
    fn parse_section(&self, cursor: &mut ByteCursor<'_>, line: &[u8]) -> Result<Option<Section>> {
        let section = if line.starts_with(b"%PDF-") {
            Section::Header(Header::parse(cursor)?)
        } else if line.starts_with(b"%") {
            Section::Comment(Comment::parse(cursor)?)
        } else if line.starts_with(b"xref") {
            Section::CrossReference(CrossReferenceTable::parse(cursor)?)
        } else if line.starts_with(b"trailer") {
            Section::Trailer(Trailer::parse(cursor, &self.parser)?)
        } else if line.starts_with(b"startxref") {
            Section::StartXref(StartXref::parse(cursor)?)
        } else if is_object_header(line) {
            Section::Object(IndirectObjectFrame::parse(
                cursor,
                &self.parser,
                &self.extractor,
            )?)
        } else {
            return Ok(None);
        };
        Ok(Some(section))
    }
}

impl<E: PayloadExtractor> ScanStrategy for Scanner<E> {
    fn scan(&self, data: &[u8]) -> Result<Document> {
        let mut sections = Vec::new();
        let mut cursor = ByteCursor::new(data);
        let mut gap_start: Option<usize> = None;

        debug!("Starting scan of {} bytes", data.len());

        while cursor.has_remaining() {
            if self.config.max_sections > 0 && sections.len() >= self.config.max_sections {
                debug!("Section limit {} reached", self.config.max_sections);
                break;
            }

            let line_start = cursor.position();
            let mut probe = cursor.clone();
            let Some(line) = probe.read_line() else {
                break;
            };

            let mut attempt = cursor.clone();
            match self.parse_section(&mut attempt, line.content) {
                Ok(Some(section)) if attempt.position() > line_start => {
                    if let Some(start) = gap_start.take() {
                        sections.push(Section::Unparsed(ByteSpan::from_bounds(start, line_start)));
                    }
                    trace!("Section at {}", section.span());
                    sections.push(section);
                    cursor = attempt;
                    continue;
                }
                Ok(Some(section)) => {
                    warn!(
                        "{}",
                        Error::internal(format!("section {} consumed no input", section.span()))
                    );
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    debug!("Line at {} not parsed: {}", line_start, e);
                }
                Err(e) => {
                    warn!(
                        "Falling back to unparsed at {}: {}",
                        e.offset().unwrap_or(line_start),
                        e
                    );
                }
            }

            gap_start.get_or_insert(line_start);
            cursor.seek(line.end());
        }

        let rest_start = gap_start.unwrap_or(cursor.position());
        if rest_start < data.len() {
            sections.push(Section::Unparsed(ByteSpan::from_bounds(rest_start, data.len())));
        }

        debug!("Scan complete: {} sections", sections.len());
        Ok(Document {
            sections,
            len: data.len(),
        })
    }
}

/// Scan a file into a document
///
/// This is a convenience function that reads the file and scans it.
pub fn scan_file(path: impl AsRef<std::path::Path>) -> Result<Document> {
    scan_file_with_config(path, ScannerConfig::default())
}

/// Scan a file with custom configuration
pub fn scan_file_with_config(
    path: impl AsRef<std::path::Path>,
    config: ScannerConfig,
) -> Result<Document> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Scanner::with_config(config).scan(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::BodyEntry;
    use crate::span::tiles;
    use pretty_assertions::assert_eq;

    const MINIMAL: &[u8] = b"%PDF-1.4\n\
%\xe2\xe3\xcf\xd3\n\
1 0 obj\n\
<</Type /Catalog /Pages 2 0 R>>\n\
endobj\n\
2 0 obj\n\
<</Type /Pages /Kids [3 0 R] /Count 1>>\n\
endobj\n\
3 0 obj\n\
<</Type /Page /Parent 2 0 R /Contents 4 0 R>>\n\
endobj\n\
4 0 obj\n\
<</Length 11>>\n\
stream\n\
BT /F1 Tf ET\n\
endstream\n\
endobj\n\
xref\n\
0 5\n\
0000000000 65535 f \n\
0000000015 00000 n \n\
0000000074 00000 n \n\
0000000136 00000 n \n\
0000000213 00000 n \n\
trailer\n\
<</Size 5 /Root 1 0 R>>\n\
startxref\n\
300\n\
%%EOF\n";

    fn section_names(document: &Document) -> Vec<&'static str> {
        document
            .sections
            .iter()
            .map(|s| match s {
                Section::Header(_) => "header",
                Section::Comment(_) => "comment",
                Section::Object(_) => "object",
                Section::CrossReference(_) => "xref",
                Section::Trailer(_) => "trailer",
                Section::StartXref(_) => "startxref",
                Section::Unparsed(_) => "unparsed",
            })
            .collect()
    }

    #[test]
    fn test_scanner_config_builder() {
        let config = ScannerConfig::new()
            .max_sections(10)
            .parser(ParserConfig::new().max_depth(8));

        assert_eq!(config.max_sections, 10);
        assert_eq!(config.parser.max_depth, 8);
    }

    #[test]
    fn test_minimal_document() {
        let document = Scanner::new().scan(MINIMAL).unwrap();
        assert_eq!(
            section_names(&document),
            vec![
                "header", "comment", "object", "object", "object", "object", "xref", "trailer",
                "startxref", "comment",
            ]
        );
        assert_eq!(document.version(), Some("1.4"));
        assert!(tiles(document.span(), document.sections.iter().map(Section::span)));

        let catalog = document.object(1, 0).unwrap();
        assert_eq!(catalog.type_name(), Some("Catalog"));

        let contents = document.object(4, 0).unwrap();
        let payload = contents.payloads().next().unwrap();
        assert_eq!(payload.bytes(MINIMAL), b"BT /F1 Tf ET\n");
        assert!(matches!(contents.body.last(), Some(BodyEntry::Payload(_))));

        assert!(document.trailer().and_then(|t| t.dictionary()).is_some());
    }

    #[test]
    fn test_empty_input() {
        let document = Scanner::new().scan(&[]).unwrap();
        assert!(document.sections.is_empty());
    }

    #[test]
    fn test_garbage_becomes_one_unparsed_section() {
        let data = b"this is not\na pdf at all\n";
        let document = Scanner::new().scan(data).unwrap();
        assert_eq!(
            document.sections,
            vec![Section::Unparsed(ByteSpan::new(0, data.len()))]
        );
    }

    #[test]
    fn test_gaps_between_sections() {
        let data = b"%PDF-2.0\n\njunk\n1 0 obj\nnull\nendobj\n  \n";
        let document = Scanner::new().scan(data).unwrap();
        assert_eq!(
            section_names(&document),
            vec!["header", "unparsed", "object", "unparsed"]
        );
        assert_eq!(document.sections[1].span(), ByteSpan::new(9, 6));
        assert!(tiles(document.span(), document.sections.iter().map(Section::span)));
    }

    #[test]
    fn test_bad_xref_falls_back_to_unparsed() {
        let data = b"xrefx\n1 0 obj\n1\nendobj\n";
        let document = Scanner::new().scan(data).unwrap();
        assert_eq!(section_names(&document), vec!["unparsed", "object"]);
    }

    #[test]
    fn test_stream_data_stays_inside_its_object() {
        let data = b"1 0 obj\n<</Length 10>>\nstream\nxref\ntrailer\nendstream\nendobj\n";
        let document = Scanner::new().scan(data).unwrap();
        assert_eq!(section_names(&document), vec!["object"]);

        let data = b"1 0 obj\n<<>>\nstream\n2 0 obj\nendstream\nendobj\n";
        let document = Scanner::new().scan(data).unwrap();
        assert_eq!(document.objects().count(), 1);
        assert!(document.object(1, 0).unwrap().end_signature.is_some());
    }

    #[test]
    fn test_max_sections() {
        let scanner = Scanner::with_config(ScannerConfig::new().max_sections(2));
        let document = scanner.scan(MINIMAL).unwrap();
        assert_eq!(
            section_names(&document),
            vec!["header", "comment", "unparsed"]
        );
        assert!(tiles(document.span(), document.sections.iter().map(Section::span)));
    }

    #[test]
    fn test_scan_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.pdf");
        std::fs::write(&path, MINIMAL).unwrap();

        let document = scan_file(&path).unwrap();
        assert_eq!(document.objects().count(), 4);

        let missing = scan_file(dir.path().join("missing.pdf"));
        assert!(matches!(missing, Err(Error::FileRead { .. })));
    }
}
