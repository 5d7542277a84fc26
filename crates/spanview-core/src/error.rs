//! Error types for the spanview-core library.
//!
//! The object-model parser treats most of these as soft signals: it logs
//! them and keeps going so a partial tree is always produced. Only the
//! fixed-grammar framing records surface them as real failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spanview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all spanview operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The cursor reached the end of its readable region
    #[error("unexpected end of input at offset {offset}")]
    EndOfInput {
        /// Position of the cursor when the read was attempted
        offset: usize,
    },

    /// A keyword literal did not spell what its first byte announced
    #[error("malformed token at offset {offset}: expected '{expected}'")]
    MalformedToken {
        /// Offset of the token's first byte
        offset: usize,
        /// The literal that was expected
        expected: &'static str,
    },

    /// No dispatch rule matched the byte
    #[error("unrecognized byte 0x{byte:02x} at offset {offset}")]
    UnrecognizedByte {
        /// Offset of the byte
        offset: usize,
        /// The byte itself
        byte: u8,
    },

    /// An expected record or frame signature was absent
    #[error("structural signature mismatch at offset {offset}: expected {expected}")]
    StructuralSignatureMismatch {
        /// Offset where the signature was expected
        offset: usize,
        /// Description of the expected signature
        expected: &'static str,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new end-of-input error
    pub fn end_of_input(offset: usize) -> Self {
        Self::EndOfInput { offset }
    }

    /// Creates a new malformed token error
    pub fn malformed_token(offset: usize, expected: &'static str) -> Self {
        Self::MalformedToken { offset, expected }
    }

    /// Creates a new unrecognized byte error
    pub fn unrecognized_byte(offset: usize, byte: u8) -> Self {
        Self::UnrecognizedByte { offset, byte }
    }

    /// Creates a new signature mismatch error
    pub fn signature_mismatch(offset: usize, expected: &'static str) -> Self {
        Self::StructuralSignatureMismatch { offset, expected }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the parser recovers from this error by skipping ahead
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EndOfInput { .. } | Self::MalformedToken { .. } | Self::UnrecognizedByte { .. }
        )
    }

    /// Byte offset the error refers to, if any
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::EndOfInput { offset }
            | Self::MalformedToken { offset, .. }
            | Self::UnrecognizedByte { offset, .. }
            | Self::StructuralSignatureMismatch { offset, .. } => Some(*offset),
            Self::FileRead { .. } | Self::Internal(_) => None,
        }
    }
}
