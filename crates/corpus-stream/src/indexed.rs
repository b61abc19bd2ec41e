use std::collections::VecDeque;

use corpus_index::{IndexStore, ObjectId};
use tracing::debug;

use crate::{
    ObjectProvider, ObjectRecord,
    archive::{ArchiveLines, Fetch, archive_location, load_archive},
    error::{StreamError, StreamResult as Result},
};

/// Visits exactly the (archive, offset) pairs listed in an index.
///
/// Archives are opened in ascending archive number. Within an archive,
/// offsets are taken from the back of the index-order list, so records come
/// out in reverse index order. Fetch and decode failures are returned as
/// errors rather than ending the stream quietly.
pub struct IndexedProvider<'a, F> {
    index: &'a IndexStore,
    root: String,
    fetcher: F,
    archives: VecDeque<u32>,
    current: Option<(u32, ArchiveLines)>,
    offsets: Vec<u32>,
}

impl<'a, F: Fetch> IndexedProvider<'a, F> {
    pub fn new(index: &'a IndexStore, root: impl Into<String>, fetcher: F) -> Self {
        let archives: VecDeque<u32> = index.span().into_keys().collect();
        debug!("indexed walk over {} archives", archives.len());
        Self {
            index,
            root: root.into(),
            fetcher,
            archives,
            current: None,
            offsets: Vec::new(),
        }
    }

    /// Archives not yet opened.
    #[inline]
    pub fn pending(&self) -> usize {
        self.archives.len()
    }
}

impl<F: Fetch> ObjectProvider for IndexedProvider<'_, F> {
    fn next_object(&mut self) -> Result<Option<ObjectRecord>> {
        while self.offsets.is_empty() {
            // release the exhausted archive before fetching the next
            self.current = None;

            let Some(archive) = self.archives.pop_front() else {
                return Ok(None);
            };
            let location = archive_location(&self.root, archive);
            let lines = load_archive(&self.fetcher, &location)?;
            self.offsets = self.index.all_offsets(archive);
            self.current = Some((archive, lines));
        }

        let (Some(offset), Some((archive, lines))) = (self.offsets.pop(), self.current.as_ref())
        else {
            return Ok(None);
        };
        record_at(*archive, lines, offset).map(Some)
    }
}

fn record_at(archive: u32, lines: &ArchiveLines, offset: u32) -> Result<ObjectRecord> {
    let line = lines
        .get(offset as usize)
        .ok_or_else(|| StreamError::OffsetOutOfRange {
            location: lines.source().to_string(),
            offset,
            lines: lines.len(),
        })?;
    Ok(ObjectRecord {
        payload: line.to_string(),
        source: lines.source().clone(),
        offset,
        archive: Some(archive),
    })
}

/// Resolve one id through the index and fetch only its archive.
///
/// `Ok(None)` when the id is not in the index.
pub fn fetch_object<F: Fetch + ?Sized>(
    index: &IndexStore,
    root: &str,
    fetcher: &F,
    id: &ObjectId,
) -> Result<Option<ObjectRecord>> {
    let Some(loc) = index.lookup(id) else {
        return Ok(None);
    };
    let lines = load_archive(fetcher, &archive_location(root, loc.archive))?;
    record_at(loc.archive, &lines, loc.offset).map(Some)
}
