//! Object-model tokenizer.
//!
//! [`ObjectParser::parse_object`] looks at exactly one byte to decide what
//! token starts at the cursor, builds that node and appends it to the list it
//! was handed. Containers recurse with their own child list; the `R` marker
//! reaches back into the list it is about to join and absorbs its
//! two non-filler predecessors.
//!
//! ## Dispatch table
//!
//! | first byte        | node                                   |
//! |-------------------|----------------------------------------|
//! | CR, LF            | `Filler::NewLine`                      |
//! | SPACE             | `Filler::Space`                        |
//! | `(`               | `StringLiteral`                        |
//! | `<<`              | `Dictionary`                           |
//! | `<`               | `StringHexadecimal`                    |
//! | `/`               | `Name`                                 |
//! | `[`               | `Array`                                |
//! | `+` `-` `0`..`9`  | `Numeric`                              |
//! | `t` `f`           | `Boolean`                              |
//! | `n`               | `Null`                                 |
//! | `R`               | `Reference`                            |
//!
//! Anything else is "no match": the cursor is rewound onto the byte so the
//! caller can test it as a closing delimiter or skip it.

mod container;
mod reference;

use crate::cursor::{ByteCursor, TOKEN_TERMINATORS};
use crate::error::{Error, Result};
use crate::node::{Filler, Node, NodeKind, StringToken};
use crate::span::ByteSpan;
use tracing::{trace, warn};

/// Configuration for the object parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Deepest container nesting that is parsed as a container
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl ParserConfig {
    /// Creates a new parser config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum container nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Single-lookahead recursive-descent parser for PDF object syntax
#[derive(Debug, Clone, Default)]
pub struct ObjectParser {
    config: ParserConfig,
}

impl ObjectParser {
    /// Creates a parser with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom configuration
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parses one token at the cursor and appends it to `list`.
    ///
    /// `list` is the caller's own ordered sibling list, not a copy: a
    /// Reference may remove trailing siblings from it before appending
    /// itself. Returns `Ok(None)` with the cursor rewound when the byte starts
    /// no token, and `Err(EndOfInput)` when the cursor is already at its limit.
    pub fn parse_object<'l>(
        &self,
        cursor: &mut ByteCursor<'_>,
        list: &'l mut Vec<Node>,
    ) -> Result<Option<&'l Node>> {
        self.parse_nested(cursor, list, 0)
    }

    pub(crate) fn parse_nested<'l>(
        &self,
        cursor: &mut ByteCursor<'_>,
        list: &'l mut Vec<Node>,
        depth: usize,
    ) -> Result<Option<&'l Node>> {
        let start = cursor.position();
        let byte = cursor.read_byte()?;

        let node = match byte {
            b'\r' | b'\n' => Node::filler(start, Filler::NewLine),
            b' ' => Node::filler(start, Filler::Space),
            b'(' => literal_string(cursor, start),
            b'<' if cursor.peek_byte() == Some(b'<') => {
                if depth >= self.config.max_depth {
                    self.too_deep(cursor, start);
                    return Ok(None);
                }
                cursor.skip(1);
                container::parse_dictionary(self, cursor, start, depth + 1)
            }
            b'<' => hexadecimal_string(cursor, start),
            b'/' => {
                let name = bare_token(cursor);
                Node::new(
                    ByteSpan::from_bounds(start, cursor.position()),
                    NodeKind::Name(name),
                )
            }
            b'[' => {
                if depth >= self.config.max_depth {
                    self.too_deep(cursor, start);
                    return Ok(None);
                }
                container::parse_array(self, cursor, start, depth + 1)
            }
            b'+' | b'-' | b'0'..=b'9' => {
                let mut text = String::from(byte as char);
                text.push_str(&bare_token(cursor));
                Node::new(
                    ByteSpan::from_bounds(start, cursor.position()),
                    NodeKind::Numeric(text),
                )
            }
            b't' => keyword(cursor, start, "true", NodeKind::Boolean(true))?,
            b'f' => keyword(cursor, start, "false", NodeKind::Boolean(false))?,
            b'n' => keyword(cursor, start, "null", NodeKind::Null)?,
            b'R' => return Ok(reference::merge(list, ByteSpan::new(start, 1))),
            _ => {
                trace!("No token starts with 0x{:02x} at {}", byte, start);
                cursor.seek_backward(1);
                return Ok(None);
            }
        };

        trace!("{} at {}", node.label(), node.span);
        list.push(node);
        Ok(list.last())
    }

    fn too_deep(&self, cursor: &mut ByteCursor<'_>, start: usize) {
        warn!(
            "Container at {} exceeds nesting depth {}, skipping its opening byte",
            start, self.config.max_depth
        );
        cursor.seek(start);
    }
}

/// Skips the byte at the cursor, recording it as an unrecognized filler.
///
/// This is the uniform "log and advance by one" fallback that guarantees
/// every loop over the object grammar terminates.
pub(crate) fn skip_unrecognized(cursor: &mut ByteCursor<'_>, list: &mut Vec<Node>) {
    let offset = cursor.position();
    if let Ok(byte) = cursor.read_byte() {
        warn!("{}", Error::unrecognized_byte(offset, byte));
        list.push(Node::filler(offset, Filler::Unrecognized(byte)));
    }
}

/// Reads the rest of a name or number, leaving the terminator unconsumed
fn bare_token(cursor: &mut ByteCursor<'_>) -> String {
    let (text, terminator) = cursor.read_ascii_run(TOKEN_TERMINATORS);
    if terminator.is_some() {
        cursor.seek_backward(1);
    }
    text
}

/// Matches a fixed keyword whose first byte has already been consumed
fn keyword(
    cursor: &mut ByteCursor<'_>,
    start: usize,
    literal: &'static str,
    kind: NodeKind,
) -> Result<Node> {
    cursor.seek(start);
    if !cursor.starts_with(literal.as_bytes()) {
        return Err(Error::malformed_token(start, literal));
    }
    cursor.skip(literal.len());
    Ok(Node::new(ByteSpan::new(start, literal.len()), kind))
}

/// Balanced-parenthesis scan; `\` skips the following byte unconditionally
fn literal_string(cursor: &mut ByteCursor<'_>, start: usize) -> Node {
    let mut depth = 1usize;
    let mut terminated = false;

    while let Ok(byte) = cursor.read_byte() {
        match byte {
            b'\\' => {
                let _ = cursor.read_byte();
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    terminated = true;
                    break;
                }
            }
            _ => {}
        }
    }

    let end = cursor.position();
    let content_end = if terminated { end - 1 } else { end };
    let raw = cursor.data()[start + 1..content_end].to_vec();
    Node::new(
        ByteSpan::from_bounds(start, end),
        NodeKind::StringLiteral(StringToken { raw, terminated }),
    )
}

fn hexadecimal_string(cursor: &mut ByteCursor<'_>, start: usize) -> Node {
    let run = cursor.read_run(b">");
    let token = StringToken {
        raw: run.bytes.to_vec(),
        terminated: run.terminator.is_some(),
    };
    Node::new(
        ByteSpan::from_bounds(start, cursor.position()),
        NodeKind::StringHexadecimal(token),
    )
}
