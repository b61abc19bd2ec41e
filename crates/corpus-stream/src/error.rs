use std::io;

use thiserror::Error;

/// Errors raised while fetching, decoding or walking archives.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Transport failure talking to an HTTP location
    #[error("fetch {location}: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP location answered with a non-success status
    #[error("fetch {location}: HTTP {status}")]
    Status { location: String, status: u16 },

    /// Local read failure
    #[error("read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },

    /// Archive body is not valid gzip
    #[error("gunzip {location}: {source}")]
    Decompress {
        location: String,
        #[source]
        source: io::Error,
    },

    /// Decompressed body or manifest is not UTF-8
    #[error("{location} is not valid UTF-8: {source}")]
    Utf8 {
        location: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Index points past the end of an archive
    #[error("offset {offset} out of range in {location} ({lines} lines)")]
    OffsetOutOfRange {
        location: String,
        offset: u32,
        lines: usize,
    },

    /// Archive file name filter did not compile
    #[error("invalid archive pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type StreamResult<T> = std::result::Result<T, StreamError>;
