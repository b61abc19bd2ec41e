//! On-disk record layout and the id / location types.

use std::fmt;
use std::str::FromStr;

use crate::IndexError;

/// Width of the identifier field.
pub const ID_LEN: usize = 20;

/// Width of one index record: id, archive number, offset.
pub const RECORD_LEN: usize = ID_LEN + 4 + 4;

/// Opaque 20-byte object identifier.
///
/// Ordering is unsigned lexicographic over the raw bytes, which is the order
/// index files are sorted in.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub [u8; ID_LEN]);

impl ObjectId {
    /// Raw id bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl From<[u8; ID_LEN]> for ObjectId {
    #[inline]
    fn from(bytes: [u8; ID_LEN]) -> Self {
        ObjectId(bytes)
    }
}

impl FromStr for ObjectId {
    type Err = IndexError;

    /// Parses the 40-character hex form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; ID_LEN];
        hex::decode_to_slice(s.trim(), &mut out)
            .map_err(|e| IndexError::InvalidId(format!("{s:?}: {e}")))?;
        Ok(ObjectId(out))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", hex::encode(self.0))
    }
}

/// Where an object lives: archive number and zero-based line within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Archive number, mapped to a shard file name by the reader.
    pub archive: u32,
    /// Zero-based line number in the decompressed archive.
    pub offset: u32,
}

/// One decoded 28-byte index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// Sort key.
    pub id: ObjectId,
    /// Target of the key.
    pub location: Location,
}

impl IndexRecord {
    /// Decode from exactly `RECORD_LEN` bytes.
    #[inline]
    pub fn decode(raw: &[u8; RECORD_LEN]) -> Self {
        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(&raw[..ID_LEN]);
        Self {
            id: ObjectId(id),
            location: decode_location(raw),
        }
    }

    /// Big-endian on-disk form.
    #[inline]
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[..ID_LEN].copy_from_slice(&self.id.0);
        out[ID_LEN..ID_LEN + 4].copy_from_slice(&self.location.archive.to_be_bytes());
        out[ID_LEN + 4..].copy_from_slice(&self.location.offset.to_be_bytes());
        out
    }
}

#[inline(always)]
pub(crate) fn decode_archive(raw: &[u8]) -> u32 {
    u32::from_be_bytes([raw[ID_LEN], raw[ID_LEN + 1], raw[ID_LEN + 2], raw[ID_LEN + 3]])
}

#[inline(always)]
pub(crate) fn decode_offset(raw: &[u8]) -> u32 {
    u32::from_be_bytes([
        raw[ID_LEN + 4],
        raw[ID_LEN + 5],
        raw[ID_LEN + 6],
        raw[ID_LEN + 7],
    ])
}

#[inline(always)]
pub(crate) fn decode_location(raw: &[u8]) -> Location {
    Location {
        archive: decode_archive(raw),
        offset: decode_offset(raw),
    }
}
