//! Sorted binary index over the S2 corpus
//!
//! An index file is a flat run of fixed 28-byte records (20-byte object id,
//! big-endian archive number, big-endian line offset), sorted by id. This
//! crate loads such a file and answers point lookups and per-archive
//! aggregates over it.

#![warn(missing_docs)]

pub mod error;
pub mod format;
pub mod index;

pub use error::{IndexError, Result};
pub use format::{ID_LEN, IndexRecord, Location, ObjectId, RECORD_LEN};
pub use index::IndexStore;
