//! # spanview-core
//!
//! A library for byte-accurate structural inspection of PDF files.
//!
//! This crate provides the core functionality for:
//! - Tokenizing the PDF object grammar into a tree where every node knows
//!   exactly which bytes it came from
//! - Framing indirect objects and isolating their binary stream payloads
//! - Splitting a whole file into header, objects, cross-reference table,
//!   trailer and unparsed gaps that tile it completely
//! - Rendering the result as an annotated outline and reporting malformed input
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`cursor`]: Positional reader with absolute offsets
//! - [`object`]: Single-lookahead object parser, containers and references
//! - [`frame`]: `N G obj ... endobj` frames and stream payloads
//! - [`document`]: Whole-file scanning and the framing records
//! - [`outline`]: Display trees, visitors and the text renderer
//! - [`diagnostics`]: Strict validation over the lenient parse
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use spanview_core::outline::{render_to_string, RenderConfig, ToOutline};
//! use spanview_core::{ScanStrategy, Scanner, StandardDescriptions};
//! use std::fs;
//!
//! let data = fs::read("document.pdf")?;
//! let document = Scanner::new().scan(&data)?;
//!
//! let outline = document.to_outline(&StandardDescriptions);
//! println!("{}", render_to_string(&outline, &RenderConfig::default()));
//!
//! for diagnostic in spanview_core::diagnostics::collect(&document, &data) {
//!     eprintln!("{}", diagnostic);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! The library provides several traits for customization:
//!
//! - [`ScanStrategy`]: Customize how a file is split into sections
//! - [`PayloadExtractor`]: Customize how embedded payloads are bounded
//! - [`DescriptionProvider`]: Supply or localize item descriptions
//! - [`OutlineVisitor`]: Consume outline trees
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod cursor;
pub mod describe;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod frame;
pub mod node;
pub mod object;
pub mod outline;
pub mod span;

// Re-export primary types for convenience
pub use cursor::ByteCursor;
pub use describe::{DescriptionProvider, ItemKind, NoDescriptions, StandardDescriptions};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use document::{Document, ScanStrategy, Scanner, ScannerConfig, Section};
pub use error::{Error, Result};
pub use frame::{BodyEntry, IndirectObjectFrame, Payload, PayloadExtractor, StreamExtractor};
pub use node::{Node, NodeKind};
pub use object::{ObjectParser, ParserConfig};
pub use outline::{Outline, OutlineVisitor, RenderConfig, StatsVisitor, ToOutline, TreeRenderer};
pub use span::ByteSpan;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
