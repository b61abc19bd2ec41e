use std::sync::Arc;

/// One record pulled from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Raw JSON text of the line.
    pub payload: String,
    /// Location of the archive the line came from.
    pub source: Arc<str>,
    /// Zero-based line number within that archive.
    pub offset: u32,
    /// Archive number, when the record was reached through the index.
    pub archive: Option<u32>,
}
