//! Record streams over the S2 corpus
//!
//! The corpus is a set of gzip'd newline-delimited JSON archives. Records are
//! reached either by walking every archive in manifest order
//! ([`SequentialProvider`]) or by visiting only the lines an index points at
//! ([`IndexedProvider`]). Both feed the same [`Driver`], which keeps going
//! when a single record fails to process.

pub mod archive;
pub mod driver;
pub mod error;
pub mod indexed;
pub mod manifest;
pub mod provider;
pub mod record;
pub mod sequential;

pub use archive::{ArchiveLines, DEFAULT_TIMEOUT, Fetch, Fetcher};
pub use driver::{DriveSummary, Driver, JsonHandler, ObjectHandler, drive};
pub use error::{StreamError, StreamResult};
pub use indexed::{IndexedProvider, fetch_object};
pub use manifest::archive_urls;
pub use provider::ObjectProvider;
pub use record::ObjectRecord;
pub use sequential::SequentialProvider;
