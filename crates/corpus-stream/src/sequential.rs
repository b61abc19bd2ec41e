use std::collections::VecDeque;

use tracing::error;

use crate::{
    ObjectProvider, ObjectRecord,
    archive::{ArchiveLines, Fetch, load_archive},
    error::StreamResult as Result,
};

enum Cursor {
    /// Nothing loaded yet, or the last archive ran out.
    Idle,
    Loaded {
        lines: ArchiveLines,
        position: usize,
    },
    Done,
}

/// Walks every line of every archive, in the order given.
///
/// A failure to fetch or gunzip an archive is logged and ends the stream:
/// archives still pending after the failing one are not visited.
pub struct SequentialProvider<F> {
    pending: VecDeque<String>,
    cursor: Cursor,
    fetcher: F,
}

impl<F: Fetch> SequentialProvider<F> {
    pub fn new<I>(locations: I, fetcher: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            pending: locations.into_iter().map(Into::into).collect(),
            cursor: Cursor::Idle,
            fetcher,
        }
    }

    /// Archives not yet opened.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Open the next pending archive, or finish.
    fn advance(&mut self) {
        let Some(location) = self.pending.pop_front() else {
            self.cursor = Cursor::Done;
            return;
        };

        self.cursor = match load_archive(&self.fetcher, &location) {
            Ok(lines) => Cursor::Loaded { lines, position: 0 },
            Err(e) => {
                error!("Unexpected failure in archive {}: {}", location, e);
                Cursor::Done
            }
        };
    }
}

impl<F: Fetch> ObjectProvider for SequentialProvider<F> {
    fn next_object(&mut self) -> Result<Option<ObjectRecord>> {
        loop {
            if let Cursor::Loaded { lines, position } = &mut self.cursor {
                if let Some(line) = lines.get(*position) {
                    let Some(offset) = line_offset(*position) else {
                        error!(
                            "{}: line {} does not fit a u32 offset",
                            lines.source(),
                            position
                        );
                        self.cursor = Cursor::Done;
                        return Ok(None);
                    };
                    let record = ObjectRecord {
                        payload: line.to_string(),
                        source: lines.source().clone(),
                        offset,
                        archive: None,
                    };
                    *position += 1;
                    return Ok(Some(record));
                }
                // exhausted, drop it before opening the next one
                self.cursor = Cursor::Idle;
            }

            if matches!(self.cursor, Cursor::Done) {
                return Ok(None);
            }
            self.advance();
        }
    }
}

/// Offsets are u32 on disk; a position past that range cannot be addressed.
#[inline]
fn line_offset(position: usize) -> Option<u32> {
    u32::try_from(position).ok()
}
