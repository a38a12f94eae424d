//! Error types for layoutdoc library.

use std::io;
use thiserror::Error;

use crate::model::{BlockType, EntityType};

/// Result type alias for layoutdoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading or navigating a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading input files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a document object nor an array of documents.
    #[error("Failed to decode {input}: {source}")]
    Decode {
        /// Name of the file or stream being decoded
        input: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The input stream could not be rewound to retry as a single document.
    #[error("Failed to decode {input}: stream cannot be rewound ({source})")]
    Rewind {
        /// Name of the file or stream being decoded
        input: String,
        /// Underlying seek error
        #[source]
        source: io::Error,
    },

    /// The input decoded fine but holds no documents.
    #[error("No documents found in {0}")]
    EmptyInput(String),

    /// A block of the wrong type was handed to a constructor.
    #[error("Block {id} has type {found}, expected {expected}")]
    UnexpectedBlockType {
        /// Identifier of the offending block
        id: String,
        /// Block type the constructor requires
        expected: BlockType,
        /// Block type actually found
        found: BlockType,
    },

    /// A block lacks the entity tag its role requires (e.g. KEY for a field key).
    #[error("Block {id} is missing entity type {expected}")]
    MissingEntityType {
        /// Identifier of the offending block
        id: String,
        /// Entity type the constructor requires
        expected: EntityType,
    },

    /// A table cell sits outside the grid a table may occupy.
    #[error("Cell {id} at ({row}, {column}) lies outside the table grid limit of {limit}")]
    CellPositionTooLarge {
        /// Identifier of the offending cell
        id: String,
        /// Declared row index
        row: usize,
        /// Declared column index
        column: usize,
        /// Largest allowed row or column count
        limit: usize,
    },

    /// A block record in the input is `null`.
    #[error("Block record {0} is null")]
    NullBlock(usize),

    /// Page index is out of range.
    #[error("Page index {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Table row index is out of range.
    #[error("Row {0} is out of range (table has {1} rows)")]
    RowOutOfRange(usize, usize),

    /// Table cell position is out of range.
    #[error("Cell ({row}, {column}) is out of range (table is {rows}x{columns})")]
    CellOutOfRange {
        /// Requested row
        row: usize,
        /// Requested column
        column: usize,
        /// Table row count
        rows: usize,
        /// Table column count
        columns: usize,
    },

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading the input failed
    Io,
    /// The input could not be parsed as one document or an array of documents
    Decode,
    /// A constructor received a block of the wrong shape
    Structural,
    /// An index-based accessor was outside its bound
    Range,
    /// Output rendering failed
    Render,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Decode { .. } | Error::Rewind { .. } | Error::EmptyInput(_) => {
                ErrorKind::Decode
            }
            Error::UnexpectedBlockType { .. }
            | Error::MissingEntityType { .. }
            | Error::CellPositionTooLarge { .. }
            | Error::NullBlock(_) => ErrorKind::Structural,
            Error::PageOutOfRange(..) | Error::RowOutOfRange(..) | Error::CellOutOfRange { .. } => {
                ErrorKind::Range
            }
            Error::Render(_) => ErrorKind::Render,
        }
    }

    /// Check if this is a structural-mismatch error.
    pub fn is_structural(&self) -> bool {
        self.kind() == ErrorKind::Structural
    }

    /// Check if this is a range error.
    pub fn is_range(&self) -> bool {
        self.kind() == ErrorKind::Range
    }

    /// Check if this is a decode error.
    pub fn is_decode(&self) -> bool {
        self.kind() == ErrorKind::Decode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page index 10 is out of range (document has 5 pages)"
        );

        let err = Error::UnexpectedBlockType {
            id: "c1".to_string(),
            expected: BlockType::Cell,
            found: BlockType::Word,
        };
        assert_eq!(err.to_string(), "Block c1 has type WORD, expected CELL");

        let err = Error::MissingEntityType {
            id: "k1".to_string(),
            expected: EntityType::Key,
        };
        assert_eq!(err.to_string(), "Block k1 is missing entity type KEY");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::NullBlock(3).kind(), ErrorKind::Structural);
        let err = Error::CellPositionTooLarge {
            id: "c9".to_string(),
            row: 5000,
            column: 0,
            limit: 1000,
        };
        assert!(err.is_structural());
        assert!(err.to_string().contains("c9"));
        assert!(Error::RowOutOfRange(4, 2).is_range());
        assert!(Error::EmptyInput("stdin".into()).is_decode());
        assert!(!Error::Render("x".into()).is_structural());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
