//! Extensible outline traversal.
//!
//! This module provides the [`OutlineVisitor`] trait for consuming an
//! [`Outline`] tree without writing the recursion yourself.

use super::Outline;
use crate::describe::ItemKind;
use std::collections::BTreeMap;
use std::fmt::Result;

/// Callbacks invoked by [`walk`] in depth-first order.
///
/// Both methods default to no-ops, so implementors only override what they
/// need.
///
/// # Example
///
/// ```
/// use spanview_core::outline::{walk, Outline, OutlineVisitor};
/// use spanview_core::{ByteSpan, ItemKind};
///
/// struct DeepestLevel(usize);
///
/// impl OutlineVisitor for DeepestLevel {
///     fn enter(&mut self, _item: &Outline, depth: usize) -> std::fmt::Result {
///         self.0 = self.0.max(depth);
///         Ok(())
///     }
/// }
///
/// let outline = Outline::new(ItemKind::Document, ByteSpan::new(0, 0), "empty");
/// let mut visitor = DeepestLevel(0);
/// walk(&outline, &mut visitor).unwrap();
/// assert_eq!(visitor.0, 0);
/// ```
pub trait OutlineVisitor {
    /// Called before an item's children are visited
    fn enter(&mut self, item: &Outline, depth: usize) -> Result {
        let _ = (item, depth);
        Ok(())
    }

    /// Called after an item's children are visited
    fn leave(&mut self, item: &Outline, depth: usize) -> Result {
        let _ = (item, depth);
        Ok(())
    }
}

/// Visits `outline` and all its descendants, the root at depth 0
pub fn walk<V: OutlineVisitor + ?Sized>(outline: &Outline, visitor: &mut V) -> Result {
    walk_at(outline, visitor, 0)
}

fn walk_at<V: OutlineVisitor + ?Sized>(outline: &Outline, visitor: &mut V, depth: usize) -> Result {
    visitor.enter(outline, depth)?;
    for child in &outline.children {
        walk_at(child, visitor, depth + 1)?;
    }
    visitor.leave(outline, depth)
}

/// A no-op visitor
pub struct NullVisitor;

impl OutlineVisitor for NullVisitor {}

/// A visitor that collects statistics about an outline
#[derive(Debug, Default)]
pub struct StatsVisitor {
    /// Number of items per kind
    pub counts: BTreeMap<ItemKind, usize>,
    /// Number of items flagged as errors
    pub error_count: usize,
    /// Total payload data bytes
    pub payload_bytes: usize,
    /// Deepest level seen
    pub max_depth: usize,
}

impl StatsVisitor {
    /// Number of items of `kind`
    pub fn count(&self, kind: ItemKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total number of items visited
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl OutlineVisitor for StatsVisitor {
    fn enter(&mut self, item: &Outline, depth: usize) -> Result {
        *self.counts.entry(item.kind).or_insert(0) += 1;
        if item.error {
            self.error_count += 1;
        }
        if item.kind == ItemKind::PayloadData {
            self.payload_bytes += item.span.len;
        }
        self.max_depth = self.max_depth.max(depth);
        Ok(())
    }
}
