//! Retroactive grouping of `N G R` into one Reference node.
//!
//! The three pieces of an indirect reference are tokenized independently, so
//! by the time `R` is seen the object and generation numbers are already
//! siblings in the list. The merge walks back from the tail until it has seen
//! two non-filler nodes and moves everything from there onwards, fillers
//! included, into the Reference. With fewer than two candidates nothing moves
//! and the Reference covers only its marker byte.

use crate::node::{Node, NodeKind, Reference};
use crate::span::ByteSpan;
use tracing::{debug, trace};

/// Number of non-filler siblings an `R` absorbs
const COMPONENTS: usize = 2;

/// Builds the Reference for `marker`, absorbing the tail of `list`
pub(super) fn merge(list: &mut Vec<Node>, marker: ByteSpan) -> Option<&Node> {
    let split = list
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, node)| !node.is_filler())
        .nth(COMPONENTS - 1)
        .map(|(i, _)| i);

    let former_components = match split {
        Some(index) => list.split_off(index),
        None => {
            debug!("Reference marker at {} has nothing to absorb", marker.start);
            Vec::new()
        }
    };

    let reference = Reference {
        marker,
        former_components,
    };
    let node = Node::new(reference.span(), NodeKind::Reference(reference));
    trace!("{} at {}", node.label(), node.span);

    list.push(node);
    list.last()
}
