//! Strict validation over a lenient parse.
//!
//! Parsing never fails on malformed object syntax; it records the damage in
//! the tree instead. [`collect`] walks a scanned [`Document`] and reports
//! every such record with its span.

use crate::cursor::is_whitespace;
use crate::document::{Document, Section};
use crate::error::Error;
use crate::frame::{BodyEntry, IndirectObjectFrame};
use crate::node::{Filler, Node, NodeKind};
use crate::span::ByteSpan;
use std::fmt;

/// What kind of problem a [`Diagnostic`] reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A byte no dispatch rule matched
    UnrecognizedByte(u8),
    /// `[` without a matching `]`
    UnclosedArray,
    /// `<<` without a matching `>>`
    UnclosedDictionary,
    /// String without its closing delimiter
    UnterminatedString,
    /// Dictionary key that is not a Name
    NonNameKey,
    /// Dictionary key with no value
    DanglingKey,
    /// Indirect object without `endobj`
    MissingEndobj {
        /// Object number
        object_number: u32,
        /// Generation number
        generation: u16,
    },
    /// Stream without `endstream`
    MissingEndstream,
    /// Bytes outside any recognized record
    UnparsedBytes,
}

/// One problem found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the problem is
    pub span: ByteSpan,
    /// What the problem is
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.span)?;
        match &self.kind {
            DiagnosticKind::UnrecognizedByte(byte) => {
                write!(f, "{}", Error::unrecognized_byte(self.span.start, *byte))
            }
            DiagnosticKind::UnclosedArray => write!(f, "array is never closed"),
            DiagnosticKind::UnclosedDictionary => write!(f, "dictionary is never closed"),
            DiagnosticKind::UnterminatedString => write!(f, "string is never terminated"),
            DiagnosticKind::NonNameKey => write!(f, "dictionary key is not a name"),
            DiagnosticKind::DanglingKey => write!(f, "dictionary key has no value"),
            DiagnosticKind::MissingEndobj {
                object_number,
                generation,
            } => write!(
                f,
                "object {} {} has no endobj",
                object_number, generation
            ),
            DiagnosticKind::MissingEndstream => write!(f, "stream has no endstream"),
            DiagnosticKind::UnparsedBytes => write!(f, "bytes outside any record"),
        }
    }
}

/// Collects every problem recorded in `document`, in file order.
///
/// `data` is the buffer the document was scanned from; unparsed sections
/// consisting only of whitespace are not reported.
pub fn collect(document: &Document, data: &[u8]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for section in &document.sections {
        match section {
            Section::Object(frame) => collect_frame(frame, &mut diagnostics),
            Section::Trailer(trailer) => {
                trailer
                    .body
                    .iter()
                    .for_each(|node| collect_node(node, &mut diagnostics));
            }
            Section::Unparsed(span) => {
                if !span.slice(data).iter().all(|&b| is_whitespace(b)) {
                    diagnostics.push(Diagnostic {
                        span: *span,
                        kind: DiagnosticKind::UnparsedBytes,
                    });
                }
            }
            _ => {}
        }
    }
    diagnostics.sort_by_key(|d| d.span.start);
    diagnostics
}

fn collect_frame(frame: &IndirectObjectFrame, out: &mut Vec<Diagnostic>) {
    if frame.end_signature.is_none() {
        out.push(Diagnostic {
            span: frame.span,
            kind: DiagnosticKind::MissingEndobj {
                object_number: frame.object_number,
                generation: frame.generation,
            },
        });
    }
    for entry in &frame.body {
        match entry {
            BodyEntry::Token(node) => collect_node(node, out),
            BodyEntry::Payload(payload) if payload.end_keyword.is_none() => out.push(Diagnostic {
                span: payload.span,
                kind: DiagnosticKind::MissingEndstream,
            }),
            BodyEntry::Payload(_) => {}
        }
    }
}

fn collect_node(node: &Node, out: &mut Vec<Diagnostic>) {
    let mut push = |span, kind| out.push(Diagnostic { span, kind });
    match &node.kind {
        NodeKind::Filler(Filler::Unrecognized(byte)) => {
            push(node.span, DiagnosticKind::UnrecognizedByte(*byte));
        }
        NodeKind::StringLiteral(s) | NodeKind::StringHexadecimal(s) if !s.terminated => {
            push(node.span, DiagnosticKind::UnterminatedString);
        }
        NodeKind::Array(array) if !array.closed => {
            push(node.span, DiagnosticKind::UnclosedArray);
        }
        NodeKind::Dictionary(dict) => {
            if !dict.closed {
                push(node.span, DiagnosticKind::UnclosedDictionary);
            }
            for entry in dict.entries() {
                let key = dict.children[entry.key].span;
                if !entry.key_is_name {
                    push(key, DiagnosticKind::NonNameKey);
                }
                if entry.value.is_none() {
                    push(key, DiagnosticKind::DanglingKey);
                }
            }
        }
        _ => {}
    }

    for child in node.children() {
        collect_node(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ScanStrategy, Scanner};
    use pretty_assertions::assert_eq;

    fn diagnose(data: &[u8]) -> Vec<Diagnostic> {
        let document = Scanner::new().scan(data).unwrap();
        collect(&document, data)
    }

    #[test]
    fn test_clean_document() {
        let data = b"%PDF-1.4\n1 0 obj\n<</A [1 2]>>\nendobj\n\n%%EOF\n";
        assert_eq!(diagnose(data), vec![]);
    }

    #[test]
    fn test_object_level_problems() {
        let data = b"1 0 obj\n<</A 1 2 3 /B>>\nendobj\n2 0 obj\n[ ~ ]\nendobj\n";
        let kinds: Vec<_> = diagnose(data).into_iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::NonNameKey,
                DiagnosticKind::DanglingKey,
                DiagnosticKind::UnrecognizedByte(b'~'),
            ]
        );
    }

    #[test]
    fn test_missing_endobj_and_endstream() {
        let data = b"1 0 obj\n<<>>\nstream\nabc";
        let diagnostics = diagnose(data);
        assert_eq!(
            diagnostics.iter().map(|d| &d.kind).collect::<Vec<_>>(),
            vec![
                &DiagnosticKind::MissingEndobj {
                    object_number: 1,
                    generation: 0
                },
                &DiagnosticKind::MissingEndstream,
            ]
        );
        assert_eq!(diagnostics[1].span, ByteSpan::new(13, 10));
    }

    #[test]
    fn test_unparsed_bytes() {
        let data = b"%PDF-1.4\ngarbage\n  \n";
        let diagnostics = diagnose(data);
        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                span: ByteSpan::new(9, 11),
                kind: DiagnosticKind::UnparsedBytes,
            }]
        );
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic {
            span: ByteSpan::new(16, 1),
            kind: DiagnosticKind::UnrecognizedByte(0x7e),
        };
        let text = diagnostic.to_string();
        assert!(text.starts_with("0x00000010+1: "));
        assert!(text.contains("0x7e"));
    }
}
