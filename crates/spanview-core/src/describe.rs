//! Description lookup for outline items.
//!
//! Descriptions are supplied by an explicit [`DescriptionProvider`] handed to
//! outline construction. Implement the trait to localize or extend the text.

use std::borrow::Cow;

/// Every kind of item that can appear in an outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    /// Whole document
    Document,
    /// `%PDF-x.y` header line
    Header,
    /// `%` comment line
    Comment,
    /// `N G obj ... endobj`
    IndirectObject,
    /// Frame start signature
    ObjectStart,
    /// Frame end signature
    ObjectEnd,
    /// Embedded binary payload
    Payload,
    /// Raw payload bytes
    PayloadData,
    /// Cross-reference table
    CrossReference,
    /// Cross-reference subsection header
    CrossReferenceSubsection,
    /// Cross-reference entry
    CrossReferenceEntry,
    /// `trailer` record
    Trailer,
    /// `startxref` record
    StartXref,
    /// Bytes matching no record
    Unparsed,
    /// Keyword bytes inside a record
    Keyword,
    /// Boolean token
    Boolean,
    /// Null token
    Null,
    /// Numeric token
    Numeric,
    /// Name token
    Name,
    /// Literal string token
    StringLiteral,
    /// Hexadecimal string token
    StringHexadecimal,
    /// Array container
    Array,
    /// Dictionary container
    Dictionary,
    /// Indirect reference
    Reference,
    /// Whitespace and skipped bytes
    Filler,
}

/// Supplies optional descriptions keyed by item kind
pub trait DescriptionProvider {
    /// Description for items of `kind`
    fn describe(&self, kind: ItemKind) -> Option<Cow<'_, str>>;
}

/// A provider that never describes anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDescriptions;

impl DescriptionProvider for NoDescriptions {
    fn describe(&self, _kind: ItemKind) -> Option<Cow<'_, str>> {
        None
    }
}

/// Built-in English descriptions
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDescriptions;

impl DescriptionProvider for StandardDescriptions {
    fn describe(&self, kind: ItemKind) -> Option<Cow<'_, str>> {
        let text = match kind {
            ItemKind::Document => "PDF document",
            ItemKind::Header => "File header declaring the PDF version",
            ItemKind::Comment => "Comment line starting with '%'",
            ItemKind::IndirectObject => {
                "Indirect object, addressable by object and generation number"
            }
            ItemKind::ObjectStart => "Object number, generation number and 'obj' keyword",
            ItemKind::ObjectEnd => "'endobj' keyword closing the indirect object",
            ItemKind::Payload => "Stream: binary payload between 'stream' and 'endstream'",
            ItemKind::PayloadData => "Raw, possibly encoded stream bytes",
            ItemKind::CrossReference => "Cross-reference table mapping objects to byte offsets",
            ItemKind::CrossReferenceSubsection => "First object number and entry count",
            ItemKind::CrossReferenceEntry => {
                "10-digit offset, 5-digit generation, 'n' (in use) or 'f' (free)"
            }
            ItemKind::Trailer => "Trailer dictionary locating the catalog and xref data",
            ItemKind::StartXref => "Byte offset of the last cross-reference section",
            ItemKind::Unparsed => return None,
            ItemKind::Keyword => return None,
            ItemKind::Boolean => "Boolean object",
            ItemKind::Null => "Null object",
            ItemKind::Numeric => "Integer or real number",
            ItemKind::Name => "Name object, an atomic symbol introduced by '/'",
            ItemKind::StringLiteral => "Literal string enclosed in parentheses",
            ItemKind::StringHexadecimal => "Hexadecimal string enclosed in angle brackets",
            ItemKind::Array => "Array: ordered collection of objects",
            ItemKind::Dictionary => "Dictionary: key/value pairs keyed by names",
            ItemKind::Reference => "Indirect reference 'object generation R'",
            ItemKind::Filler => return None,
        };
        Some(Cow::Borrowed(text))
    }
}
