//! The closed set of object-model nodes.
//!
//! Nodes are created in a single pass and never mutated afterwards. The one
//! piece of derived state, a dictionary's key/value view, is computed once
//! when the dictionary is constructed.

use crate::describe::ItemKind;
use crate::span::ByteSpan;

/// Maximum number of characters shown for string previews in labels
const PREVIEW_CHARS: usize = 40;

/// One classified, byte-provenanced token of the object grammar
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Bytes this node was parsed from
    pub span: ByteSpan,
    /// What kind of token it is
    pub kind: NodeKind,
}

/// Node variants
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
    /// Integer or real, kept as written
    Numeric(String),
    /// Name without its leading `/`
    Name(String),
    /// `( ... )`
    StringLiteral(StringToken),
    /// `< ... >`
    StringHexadecimal(StringToken),
    /// `[ ... ]`
    Array(Array),
    /// `<< ... >>`
    Dictionary(Dictionary),
    /// `N G R` after the merge heuristic
    Reference(Reference),
    /// Structurally insignificant bytes kept for exact reconstruction
    Filler(Filler),
}

/// Filler flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filler {
    /// A single CR or LF
    NewLine,
    /// A single space
    Space,
    /// A byte no dispatch rule matched, skipped to keep making progress
    Unrecognized(u8),
}

/// Raw contents of a literal or hexadecimal string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToken {
    /// Bytes between the delimiters, escapes left as written
    pub raw: Vec<u8>,
    /// `false` if the input ended before the closing delimiter
    pub terminated: bool,
}

/// Ordered array children
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// Children in parse order, fillers included
    pub children: Vec<Node>,
    /// `false` if the input ended before `]`
    pub closed: bool,
}

/// One positional key/value pairing inside a [`Dictionary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictEntry {
    /// Index of the key in [`Dictionary::children`]
    pub key: usize,
    /// Index of the value, `None` for a dangling trailing key
    pub value: Option<usize>,
    /// Whether the key node is a Name
    pub key_is_name: bool,
}

/// Dictionary with its flat child list and the derived entry view
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    /// Children in parse order, fillers included
    pub children: Vec<Node>,
    /// `false` if the input ended before `>>`
    pub closed: bool,
    entries: Vec<DictEntry>,
}

impl Dictionary {
    /// Builds the dictionary and pairs every two non-filler children.
    ///
    /// Pairing is strictly positional: a non-Name key is recorded but does
    /// not shift the pairing of later children.
    pub fn new(children: Vec<Node>, closed: bool) -> Self {
        let significant: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.is_filler())
            .map(|(i, _)| i)
            .collect();

        let entries = significant
            .chunks(2)
            .map(|pair| DictEntry {
                key: pair[0],
                value: pair.get(1).copied(),
                key_is_name: matches!(children[pair[0]].kind, NodeKind::Name(_)),
            })
            .collect();

        Self {
            children,
            closed,
            entries,
        }
    }

    /// The positional entries
    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    /// Iterates `(key, value)` node pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&Node, Option<&Node>)> + '_ {
        self.entries
            .iter()
            .map(|e| (&self.children[e.key], e.value.map(|v| &self.children[v])))
    }

    /// Value of the first entry whose key is the Name `name`
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.pairs()
            .find(|(key, _)| matches!(&key.kind, NodeKind::Name(n) if n == name))
            .and_then(|(_, value)| value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An indirect reference built from the `R` marker and the siblings it absorbed
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// The `R` byte
    pub marker: ByteSpan,
    /// Siblings moved out of the parent list, in their original order
    pub former_components: Vec<Node>,
}

impl Reference {
    /// Span from the earliest moved component through the marker
    pub fn span(&self) -> ByteSpan {
        match self.former_components.first() {
            Some(first) => first.span.cover(&self.marker),
            None => self.marker,
        }
    }

    fn numeric_components(&self) -> Option<(&str, &str)> {
        let mut numbers = self.former_components.iter().filter(|n| !n.is_filler());
        match (numbers.next(), numbers.next(), numbers.next()) {
            (
                Some(Node {
                    kind: NodeKind::Numeric(object),
                    ..
                }),
                Some(Node {
                    kind: NodeKind::Numeric(generation),
                    ..
                }),
                None,
            ) => Some((object, generation)),
            _ => None,
        }
    }

    /// Object number, when the absorbed components are two integers
    pub fn object_number(&self) -> Option<u32> {
        self.numeric_components()?.0.parse().ok()
    }

    /// Generation number, when the absorbed components are two integers
    pub fn generation(&self) -> Option<u16> {
        self.numeric_components()?.1.parse().ok()
    }
}

impl Node {
    /// Creates a node
    pub fn new(span: ByteSpan, kind: NodeKind) -> Self {
        Self { span, kind }
    }

    /// Creates a 1-byte filler node
    pub fn filler(offset: usize, filler: Filler) -> Self {
        Self::new(ByteSpan::new(offset, 1), NodeKind::Filler(filler))
    }

    /// Returns `true` for filler nodes
    pub fn is_filler(&self) -> bool {
        matches!(self.kind, NodeKind::Filler(_))
    }

    /// Returns `true` if this node itself records malformed input
    pub fn is_error(&self) -> bool {
        match &self.kind {
            NodeKind::Filler(Filler::Unrecognized(_)) => true,
            NodeKind::StringLiteral(s) | NodeKind::StringHexadecimal(s) => !s.terminated,
            NodeKind::Array(a) => !a.closed,
            NodeKind::Dictionary(d) => {
                !d.closed
                    || d
                        .entries()
                        .iter()
                        .any(|e| !e.key_is_name || e.value.is_none())
            }
            _ => false,
        }
    }

    /// Nested nodes: container children or absorbed reference components
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Array(a) => &a.children,
            NodeKind::Dictionary(d) => &d.children,
            NodeKind::Reference(r) => &r.former_components,
            _ => &[],
        }
    }

    /// Lookup key for descriptions
    pub fn item_kind(&self) -> ItemKind {
        match &self.kind {
            NodeKind::Boolean(_) => ItemKind::Boolean,
            NodeKind::Null => ItemKind::Null,
            NodeKind::Numeric(_) => ItemKind::Numeric,
            NodeKind::Name(_) => ItemKind::Name,
            NodeKind::StringLiteral(_) => ItemKind::StringLiteral,
            NodeKind::StringHexadecimal(_) => ItemKind::StringHexadecimal,
            NodeKind::Array(_) => ItemKind::Array,
            NodeKind::Dictionary(_) => ItemKind::Dictionary,
            NodeKind::Reference(_) => ItemKind::Reference,
            NodeKind::Filler(_) => ItemKind::Filler,
        }
    }

    /// Short display label
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Boolean(value) => value.to_string(),
            NodeKind::Null => "null".to_string(),
            NodeKind::Numeric(text) => text.clone(),
            NodeKind::Name(name) => format!("/{}", name),
            NodeKind::StringLiteral(s) => format!("({})", preview(&s.raw)),
            NodeKind::StringHexadecimal(s) => format!("<{}>", preview(&s.raw)),
            NodeKind::Array(a) => {
                let count = a.children.iter().filter(|n| !n.is_filler()).count();
                format!("Array ({} items)", count)
            }
            NodeKind::Dictionary(d) => format!("Dictionary ({} entries)", d.len()),
            NodeKind::Reference(r) => match (r.object_number(), r.generation()) {
                (Some(object), Some(generation)) => format!("{} {} R", object, generation),
                _ => "R".to_string(),
            },
            NodeKind::Filler(Filler::NewLine) => "NewLine".to_string(),
            NodeKind::Filler(Filler::Space) => "Space".to_string(),
            NodeKind::Filler(Filler::Unrecognized(byte)) => {
                format!("Unrecognized 0x{:02x}", byte)
            }
        }
    }
}

/// Printable, truncated rendering of raw string bytes
fn preview(raw: &[u8]) -> String {
    let mut out = String::new();
    for (i, &byte) in raw.iter().enumerate() {
        if i == PREVIEW_CHARS {
            out.push_str("...");
            break;
        }
        match byte {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\x{:02x}", byte)),
        }
    }
    out
}
