//! Array and dictionary loops.

use super::{skip_unrecognized, ObjectParser};
use crate::cursor::ByteCursor;
use crate::error::Error;
use crate::node::{Array, Dictionary, Node, NodeKind};
use crate::span::ByteSpan;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
enum Closer {
    Array,
    Dictionary,
}

impl Closer {
    fn delimiter(self) -> &'static [u8] {
        match self {
            Closer::Array => b"]",
            Closer::Dictionary => b">>",
        }
    }
}

/// Parses an array; the `[` at `start` has been consumed
pub(super) fn parse_array(
    parser: &ObjectParser,
    cursor: &mut ByteCursor<'_>,
    start: usize,
    depth: usize,
) -> Node {
    let mut children = Vec::new();
    let closed = fill(parser, cursor, &mut children, depth, Closer::Array);
    Node::new(
        ByteSpan::from_bounds(start, cursor.position()),
        NodeKind::Array(Array { children, closed }),
    )
}

/// Parses a dictionary; the `<<` at `start` has been consumed
pub(super) fn parse_dictionary(
    parser: &ObjectParser,
    cursor: &mut ByteCursor<'_>,
    start: usize,
    depth: usize,
) -> Node {
    let mut children = Vec::new();
    let closed = fill(parser, cursor, &mut children, depth, Closer::Dictionary);
    let dictionary = Dictionary::new(children, closed);

    for entry in dictionary.entries().iter().filter(|e| !e.key_is_name) {
        let key = &dictionary.children[entry.key];
        warn!("Dictionary key at {} is not a name: {}", key.span, key.label());
    }

    Node::new(
        ByteSpan::from_bounds(start, cursor.position()),
        NodeKind::Dictionary(dictionary),
    )
}

/// Parses children until the closing delimiter; returns whether it was seen
fn fill(
    parser: &ObjectParser,
    cursor: &mut ByteCursor<'_>,
    children: &mut Vec<Node>,
    depth: usize,
    closer: Closer,
) -> bool {
    loop {
        let token_start = cursor.position();
        match parser.parse_nested(cursor, children, depth) {
            Ok(Some(_)) => {}
            Ok(None) => {
                if cursor.starts_with(closer.delimiter()) {
                    cursor.skip(closer.delimiter().len());
                    return true;
                }
                skip_unrecognized(cursor, children);
            }
            Err(Error::EndOfInput { offset }) => {
                debug!("{:?} left open at end of input ({})", closer, offset);
                return false;
            }
            Err(e) => {
                warn!("{}", e);
                cursor.seek(token_start);
                skip_unrecognized(cursor, children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cursor::ByteCursor;
    use crate::node::{Filler, Node, NodeKind};
    use crate::object::{ObjectParser, ParserConfig};
    use crate::span::{tiles, ByteSpan};
    use pretty_assertions::assert_eq;

    fn parse(input: &[u8]) -> Node {
        parse_with(ObjectParser::new(), input)
    }

    fn parse_with(parser: ObjectParser, input: &[u8]) -> Node {
        let mut cursor = ByteCursor::new(input);
        let mut list = Vec::new();
        parser
            .parse_object(&mut cursor, &mut list)
            .unwrap()
            .unwrap()
            .clone()
    }

    fn significant(node: &Node) -> Vec<&Node> {
        node.children().iter().filter(|n| !n.is_filler()).collect()
    }

    #[test]
    fn test_nested_array() {
        let input = b"[1 2 [3 4] 5]";
        let array = parse(input);
        assert_eq!(array.span, ByteSpan::new(0, input.len()));

        let items = significant(&array);
        assert_eq!(items.len(), 4);
        assert_eq!(items[2].span, ByteSpan::new(5, 5));
        let inner = significant(items[2]);
        assert_eq!(inner.len(), 2);
        assert!(inner
            .iter()
            .all(|n| matches!(n.kind, NodeKind::Numeric(_))));
    }

    #[test]
    fn test_array_children_tile_interior() {
        let input = b"[/A (x) <<>> true]";
        let array = parse(input);
        let interior = ByteSpan::from_bounds(1, input.len() - 1);
        assert!(tiles(interior, array.children().iter().map(|n| n.span)));
    }

    #[test]
    fn test_dictionary_round_trip() {
        let input = b"<</Type /Page\r\n/Kids [3 0 R] /Count 1>>";
        let dict = parse(input);
        assert_eq!(dict.span, ByteSpan::new(0, input.len()));

        let mut rebuilt = b"<<".to_vec();
        for child in dict.children() {
            rebuilt.extend_from_slice(child.span.slice(input));
        }
        rebuilt.extend_from_slice(b">>");
        assert_eq!(rebuilt, input.to_vec());

        let NodeKind::Dictionary(d) = &dict.kind else {
            panic!("expected dictionary");
        };
        assert_eq!(d.len(), 3);
        assert_eq!(d.get("Count").map(Node::label), Some("1".to_string()));
        assert_eq!(d.get("Kids").map(Node::label), Some("Array (1 items)".to_string()));
    }

    #[test]
    fn test_dictionary_non_name_key_spans_whole_range() {
        let input = b"<</A 1 2 /B>>";
        let dict = parse(input);
        assert_eq!(dict.span, ByteSpan::new(0, input.len()));
        assert!(dict.is_error());

        let NodeKind::Dictionary(d) = &dict.kind else {
            panic!("expected dictionary");
        };
        assert_eq!(d.len(), 2);
        assert!(!d.entries()[1].key_is_name);
    }

    #[test]
    fn test_hex_string_inside_dictionary() {
        let input = b"<</ID <AB01>>>";
        let dict = parse(input);
        assert_eq!(dict.span, ByteSpan::new(0, input.len()));
        assert_eq!(significant(&dict)[1].label(), "<AB01>");
    }

    #[test]
    fn test_unrecognized_bytes_are_skipped() {
        let input = b"[1 % 2 ) 3]";
        let array = parse(input);
        assert_eq!(array.span, ByteSpan::new(0, input.len()));

        let skipped: Vec<_> = array
            .children()
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Filler(Filler::Unrecognized(_))))
            .map(|n| n.span.start)
            .collect();
        assert_eq!(skipped, vec![3, 7]);
        assert_eq!(significant(&array).len(), 3);
    }

    #[test]
    fn test_malformed_keyword_is_skipped_one_byte() {
        let input = b"[trux]";
        let array = parse(input);
        assert_eq!(array.span, ByteSpan::new(0, input.len()));
        let labels: Vec<_> = array.children().iter().map(Node::label).collect();
        assert_eq!(
            labels,
            vec![
                "Unrecognized 0x74",
                "Unrecognized 0x72",
                "Unrecognized 0x75",
                "Unrecognized 0x78",
            ]
        );
    }

    #[test]
    fn test_lone_greater_than_in_dictionary() {
        let input = b"<</A > 1>>";
        let dict = parse(input);
        assert_eq!(dict.span, ByteSpan::new(0, input.len()));
        assert!(dict
            .children()
            .iter()
            .any(|n| n.kind == NodeKind::Filler(Filler::Unrecognized(b'>'))));
    }

    #[test]
    fn test_unclosed_container() {
        let input = b"[1 [2";
        let array = parse(input);
        assert_eq!(array.span, ByteSpan::new(0, input.len()));
        assert!(array.is_error());
        let inner = significant(&array)[1];
        assert!(inner.is_error());
    }

    #[test]
    fn test_depth_limit() {
        let parser = ObjectParser::with_config(ParserConfig::new().max_depth(2));
        let outer = parse_with(parser, b"[[[1]]]");

        // The third `[` is skipped, so its `]` closes the middle array early.
        assert_eq!(outer.span, ByteSpan::new(0, 6));
        let middle = &outer.children()[0];
        let labels: Vec<_> = middle.children().iter().map(Node::label).collect();
        assert_eq!(labels, vec!["Unrecognized 0x5b", "1"]);
    }
}
