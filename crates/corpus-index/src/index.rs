//! Loading and querying an index file.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use tracing::debug;

use crate::format::{ID_LEN, RECORD_LEN, decode_archive, decode_location, decode_offset};
use crate::{IndexError, IndexRecord, Location, ObjectId, Result};

/// In-memory view of a sorted index file.
///
/// The raw bytes are owned and never mutated after load. Records are assumed
/// to be sorted ascending by id; `lookup` silently returns wrong answers if
/// they are not. Call [`IndexStore::verify_sorted`] to check explicitly.
#[derive(Debug, Clone)]
pub struct IndexStore {
    data: Vec<u8>,
    count: usize,
}

impl IndexStore {
    /// Read the whole index file.
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path)?;
        let len_bytes = f.metadata()?.len() as usize;

        let mut data = Vec::with_capacity(len_bytes);
        BufReader::with_capacity(64 << 20, f).read_to_end(&mut data)?;

        let store = Self::from_bytes(data)?;
        debug!(
            "loaded index {} ({} records)",
            path.display(),
            store.count
        );
        Ok(store)
    }

    /// Wrap bytes already in memory. Same length check as `load`.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !data.len().is_multiple_of(RECORD_LEN) {
            return Err(IndexError::MalformedIndex {
                len: data.len(),
                record_len: RECORD_LEN,
            });
        }
        let count = data.len() / RECORD_LEN;
        Ok(Self { data, count })
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when the index holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Raw bytes of the i-th record.
    #[inline(always)]
    fn raw(&self, i: usize) -> &[u8] {
        &self.data[i * RECORD_LEN..(i + 1) * RECORD_LEN]
    }

    #[inline(always)]
    fn key(&self, i: usize) -> &[u8] {
        &self.raw(i)[..ID_LEN]
    }

    /// Decoded i-th record, if in range.
    pub fn record(&self, i: usize) -> Option<IndexRecord> {
        if i >= self.count {
            return None;
        }
        let raw: &[u8; RECORD_LEN] = self.raw(i).try_into().ok()?;
        Some(IndexRecord::decode(raw))
    }

    /// Records in file order.
    pub fn iter(&self) -> impl Iterator<Item = IndexRecord> + '_ {
        self.data.chunks_exact(RECORD_LEN).map(|raw| {
            let mut a = [0u8; RECORD_LEN];
            a.copy_from_slice(raw);
            IndexRecord::decode(&a)
        })
    }

    /// Binary search on the id field.
    ///
    /// Ids are unique by construction. If duplicates exist, whichever one the
    /// search path hits first is returned.
    pub fn lookup(&self, id: &ObjectId) -> Option<Location> {
        let needle: &[u8] = id.as_bytes();

        // inclusive bounds, shifted by one so `hi` never underflows
        let mut lo = 0usize;
        let mut hi = self.count;
        while lo < hi {
            let mid = (lo + hi - 1) / 2;
            match self.key(mid).cmp(needle) {
                Ordering::Equal => return Some(decode_location(self.raw(mid))),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        None
    }

    /// Record count per archive number, ascending by archive.
    pub fn span(&self) -> BTreeMap<u32, u64> {
        let mut out = BTreeMap::new();
        for raw in self.data.chunks_exact(RECORD_LEN) {
            *out.entry(decode_archive(raw)).or_insert(0) += 1;
        }
        out
    }

    /// Offsets of every record in `archive`, in index (id) order.
    ///
    /// Not sorted by offset.
    pub fn all_offsets(&self, archive: u32) -> Vec<u32> {
        self.data
            .chunks_exact(RECORD_LEN)
            .filter(|raw| decode_archive(raw) == archive)
            .map(decode_offset)
            .collect()
    }

    /// Check that ids are strictly ascending.
    pub fn verify_sorted(&self) -> Result<()> {
        for i in 1..self.count {
            if self.key(i - 1) >= self.key(i) {
                return Err(IndexError::Unsorted { position: i });
            }
        }
        Ok(())
    }
}
