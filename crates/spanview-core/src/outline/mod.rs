//! Outline trees for display.
//!
//! Every parsed structure converts into an [`Outline`]: a byte span, a short
//! label, an optional description and ordered children. Outlines are what the
//! CLI renders; they carry no references back into the parse tree.
//!
//! Descriptions come from the [`DescriptionProvider`] passed to
//! [`ToOutline::to_outline`], so the same document can be rendered with
//! [`StandardDescriptions`](crate::describe::StandardDescriptions) or with
//! none at all.

mod visitor;

use crate::describe::{DescriptionProvider, ItemKind};
use crate::document::{
    Comment, CrossReferenceTable, Document, Header, Section, StartXref, Trailer, XrefEntry,
    XrefSubsection,
};
use crate::frame::{BodyEntry, IndirectObjectFrame, Payload};
use crate::node::{Node, NodeKind};
use crate::span::ByteSpan;
use std::fmt::{self, Write as FmtWrite};

pub use visitor::{walk, NullVisitor, OutlineVisitor, StatsVisitor};

/// Maximum number of characters of a comment shown in its label
const COMMENT_LABEL_CHARS: usize = 60;

/// One displayable item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    /// What the item is
    pub kind: ItemKind,
    /// Bytes the item covers
    pub span: ByteSpan,
    /// Short label
    pub label: String,
    /// Longer explanation from the description provider
    pub description: Option<String>,
    /// `true` if the item itself records malformed input
    pub error: bool,
    /// Nested items in display order
    pub children: Vec<Outline>,
}

impl Outline {
    /// Creates a childless item with no description
    pub fn new(kind: ItemKind, span: ByteSpan, label: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            label: label.into(),
            description: None,
            error: false,
            children: Vec::new(),
        }
    }

    fn described(mut self, provider: &dyn DescriptionProvider) -> Self {
        self.description = provider.describe(self.kind).map(|d| d.into_owned());
        self
    }

    fn with_children(mut self, children: Vec<Outline>) -> Self {
        self.children = children;
        self
    }

    fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// Returns `true` if this item or any descendant is flagged as an error
    pub fn has_errors(&self) -> bool {
        self.error || self.children.iter().any(Outline::has_errors)
    }
}

/// Conversion into an [`Outline`]
pub trait ToOutline {
    /// Builds the outline, looking descriptions up in `provider`
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline;
}

fn keyword(span: ByteSpan, text: &str) -> Outline {
    Outline::new(ItemKind::Keyword, span, text)
}

impl ToOutline for Node {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let (open, close) = match &self.kind {
            NodeKind::Array(a) => (Some("["), a.closed.then_some("]")),
            NodeKind::Dictionary(d) => (Some("<<"), d.closed.then_some(">>")),
            _ => (None, None),
        };

        let mut children = Vec::new();
        if let Some(open) = open {
            children.push(keyword(ByteSpan::new(self.span.start, open.len()), open));
        }
        children.extend(self.children().iter().map(|child| child.to_outline(provider)));
        if let Some(close) = close {
            let start = self.span.end().saturating_sub(close.len());
            children.push(keyword(ByteSpan::new(start, close.len()), close));
        }
        if let NodeKind::Reference(reference) = &self.kind {
            children.push(keyword(reference.marker, "R"));
        }

        Outline::new(self.item_kind(), self.span, self.label())
            .described(provider)
            .with_error(self.is_error())
            .with_children(children)
    }
}

impl ToOutline for Payload {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let mut children = vec![keyword(self.keyword, "stream")];
        if !self.line_end.is_empty() {
            children.push(Outline::new(ItemKind::Filler, self.line_end, "NewLine"));
        }
        children.push(
            Outline::new(
                ItemKind::PayloadData,
                self.data,
                format!("{} bytes", self.data.len),
            )
            .described(provider),
        );
        if let Some(end) = self.end_keyword {
            children.push(keyword(end, "endstream"));
        }
        if !self.trailer.is_empty() {
            children.push(Outline::new(ItemKind::Filler, self.trailer, "Filler"));
        }

        Outline::new(ItemKind::Payload, self.span, "Stream")
            .described(provider)
            .with_error(self.end_keyword.is_none())
            .with_children(children)
    }
}

impl ToOutline for IndirectObjectFrame {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let number = format!("{} {}", self.object_number, self.generation);
        let label = match self.type_name() {
            Some(type_name) => format!("Object {} ({})", number, type_name),
            None => format!("Object {}", number),
        };

        let mut children = vec![Outline::new(
            ItemKind::ObjectStart,
            self.start_signature,
            format!("{} obj", number),
        )
        .described(provider)];
        children.extend(self.body.iter().map(|entry| match entry {
            BodyEntry::Token(node) => node.to_outline(provider),
            BodyEntry::Payload(payload) => payload.to_outline(provider),
        }));
        if let Some(end) = self.end_signature {
            children.push(Outline::new(ItemKind::ObjectEnd, end, "endobj").described(provider));
        }

        Outline::new(ItemKind::IndirectObject, self.span, label)
            .described(provider)
            .with_error(self.end_signature.is_none())
            .with_children(children)
    }
}

impl ToOutline for Header {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        Outline::new(ItemKind::Header, self.span, format!("PDF-{}", self.version))
            .described(provider)
    }
}

impl ToOutline for Comment {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let text: String = self.text.trim_end().chars().take(COMMENT_LABEL_CHARS).collect();
        Outline::new(ItemKind::Comment, self.span, format!("%{}", text)).described(provider)
    }
}

impl ToOutline for XrefEntry {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let label = if self.in_use {
            format!(
                "Object {} {} at offset {}",
                self.object_number, self.generation, self.offset
            )
        } else {
            format!("Object {} {} free", self.object_number, self.generation)
        };
        Outline::new(ItemKind::CrossReferenceEntry, self.span, label).described(provider)
    }
}

impl ToOutline for XrefSubsection {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let mut children = vec![keyword(
            self.header,
            &format!("{} {}", self.first, self.count),
        )];
        children.extend(self.entries.iter().map(|e| e.to_outline(provider)));

        Outline::new(
            ItemKind::CrossReferenceSubsection,
            self.span,
            format!("Objects {}..{}", self.first, self.first.saturating_add(self.count)),
        )
        .described(provider)
        .with_error(self.entries.len() as u64 != u64::from(self.count))
        .with_children(children)
    }
}

impl ToOutline for CrossReferenceTable {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let mut children = vec![keyword(self.keyword, "xref")];
        children.extend(self.subsections.iter().map(|s| s.to_outline(provider)));

        Outline::new(
            ItemKind::CrossReference,
            self.span,
            format!("Cross-reference table ({} entries)", self.entries().count()),
        )
        .described(provider)
        .with_children(children)
    }
}

impl ToOutline for Trailer {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let mut children = vec![keyword(self.keyword, "trailer")];
        children.extend(self.body.iter().map(|node| node.to_outline(provider)));

        Outline::new(ItemKind::Trailer, self.span, "Trailer")
            .described(provider)
            .with_children(children)
    }
}

impl ToOutline for StartXref {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let mut children = vec![keyword(self.keyword, "startxref")];
        if let (Some(span), Some(offset)) = (self.offset_line, self.offset) {
            children.push(
                Outline::new(ItemKind::Numeric, span, offset.to_string()).described(provider),
            );
        }

        let label = match self.offset {
            Some(offset) => format!("startxref {}", offset),
            None => "startxref".to_string(),
        };
        Outline::new(ItemKind::StartXref, self.span, label)
            .described(provider)
            .with_error(self.offset.is_none())
            .with_children(children)
    }
}

impl ToOutline for Section {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        match self {
            Section::Header(header) => header.to_outline(provider),
            Section::Comment(comment) => comment.to_outline(provider),
            Section::Object(frame) => frame.to_outline(provider),
            Section::CrossReference(table) => table.to_outline(provider),
            Section::Trailer(trailer) => trailer.to_outline(provider),
            Section::StartXref(record) => record.to_outline(provider),
            Section::Unparsed(span) => {
                Outline::new(ItemKind::Unparsed, *span, format!("{} unparsed bytes", span.len))
                    .described(provider)
            }
        }
    }
}

impl ToOutline for Document {
    fn to_outline(&self, provider: &dyn DescriptionProvider) -> Outline {
        let label = match self.version() {
            Some(version) => format!("PDF document, version {}", version),
            None => "PDF document".to_string(),
        };
        Outline::new(ItemKind::Document, self.span(), label)
            .described(provider)
            .with_children(
                self.sections
                    .iter()
                    .map(|section| section.to_outline(provider))
                    .collect(),
            )
    }
}

/// Configuration for text rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Indentation string per nesting level (default: 2 spaces)
    pub indent_str: String,
    /// Render filler items
    pub show_fillers: bool,
    /// Append descriptions to labels
    pub show_descriptions: bool,
    /// Deepest level rendered (0 = unlimited)
    pub max_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_str: "  ".to_string(),
            show_fillers: true,
            show_descriptions: true,
            max_depth: 0,
        }
    }
}

impl RenderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets whether filler items are rendered
    pub fn show_fillers(mut self, show: bool) -> Self {
        self.show_fillers = show;
        self
    }

    /// Sets whether descriptions are rendered
    pub fn show_descriptions(mut self, show: bool) -> Self {
        self.show_descriptions = show;
        self
    }

    /// Sets the deepest rendered level
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Writes an outline as an indented text tree.
///
/// Each item is one line: `<span> <label>`, prefixed with `!` when the item
/// is flagged as an error and followed by ` -- <description>` when enabled.
pub struct TreeRenderer<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a RenderConfig,
}

impl<'a, W: FmtWrite> TreeRenderer<'a, W> {
    /// Creates a renderer writing to `writer`
    pub fn new(writer: &'a mut W, config: &'a RenderConfig) -> Self {
        Self { writer, config }
    }

    /// Renders the whole tree
    pub fn render(&mut self, outline: &Outline) -> fmt::Result {
        walk(outline, self)
    }

    fn is_visible(&self, item: &Outline, depth: usize) -> bool {
        (self.config.show_fillers || item.kind != ItemKind::Filler)
            && (self.config.max_depth == 0 || depth <= self.config.max_depth)
    }

    fn write_indent(&mut self, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            write!(self.writer, "{}", self.config.indent_str)?;
        }
        Ok(())
    }
}

impl<W: FmtWrite> OutlineVisitor for TreeRenderer<'_, W> {
    fn enter(&mut self, item: &Outline, depth: usize) -> fmt::Result {
        if !self.is_visible(item, depth) {
            return Ok(());
        }
        self.write_indent(depth)?;
        if item.error {
            write!(self.writer, "! ")?;
        }
        write!(self.writer, "{} {}", item.span, item.label)?;
        if self.config.show_descriptions {
            if let Some(description) = &item.description {
                write!(self.writer, " -- {}", description)?;
            }
        }
        writeln!(self.writer)
    }
}

/// Renders an outline to a string
pub fn render_to_string(outline: &Outline, config: &RenderConfig) -> String {
    let mut output = String::new();
    let _ = TreeRenderer::new(&mut output, config).render(outline);
    output
}
