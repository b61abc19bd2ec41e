//! Error type for index loading and validation.

use thiserror::Error;

/// Index error types
#[derive(Error, Debug)]
pub enum IndexError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File length is not a whole number of records
    #[error("malformed index: {len} bytes is not a multiple of {record_len}")]
    MalformedIndex {
        /// Byte length of the rejected input
        len: usize,
        /// Expected record width
        record_len: usize,
    },

    /// Record at `position` does not sort strictly after its predecessor
    #[error("index not sorted at record {position}")]
    Unsorted {
        /// Zero-based record number
        position: usize,
    },

    /// Identifier text could not be parsed
    #[error("invalid object id: {0}")]
    InvalidId(String),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;
