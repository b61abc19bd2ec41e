use std::{fs, io::Read, ops::Range, sync::Arc, time::Duration};

use flate2::read::MultiGzDecoder;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::{StreamError, StreamResult as Result};

/// Default per-request timeout for archive downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Source of raw archive bytes.
pub trait Fetch {
    fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    #[inline]
    fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        (**self).fetch(location)
    }
}

/// Fetches `http(s)://` locations over a blocking HTTP client and anything
/// else (optionally prefixed with `file://`) from the local filesystem.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| StreamError::Http {
                location: "<client>".to_string(),
                source,
            })?;
        Ok(Self { client })
    }

    fn fetch_http(&self, location: &str) -> Result<Vec<u8>> {
        let http_err = |source| StreamError::Http {
            location: location.to_string(),
            source,
        };

        let resp = self.client.get(location).send().map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StreamError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().map_err(http_err)?;
        Ok(body.to_vec())
    }
}

impl Fetch for Fetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if is_remote(location) {
            return self.fetch_http(location);
        }
        let path = location.strip_prefix("file://").unwrap_or(location);
        fs::read(path).map_err(|source| StreamError::Io {
            location: location.to_string(),
            source,
        })
    }
}

#[inline]
fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Join a corpus root and a file name with exactly one `/` between them.
pub fn join_root(root: &str, name: &str) -> String {
    if root.ends_with('/') {
        format!("{root}{name}")
    } else {
        format!("{root}/{name}")
    }
}

/// Shard file name for an archive number: three digits below 1000, four
/// from 1000 up.
pub fn archive_file_name(archive: u32) -> String {
    if archive < 1000 {
        format!("s2-corpus-{archive:03}.gz")
    } else {
        format!("s2-corpus-{archive:04}.gz")
    }
}

/// Full location of an archive under `root`.
#[inline]
pub fn archive_location(root: &str, archive: u32) -> String {
    join_root(root, &archive_file_name(archive))
}

/// One decompressed archive, split on `\n`.
///
/// Holds the text once plus line bounds; a single empty segment after a
/// final newline is not counted as a line.
#[derive(Debug)]
pub struct ArchiveLines {
    source: Arc<str>,
    text: String,
    bounds: Vec<Range<usize>>,
}

impl ArchiveLines {
    pub fn from_text(source: impl Into<Arc<str>>, text: String) -> Self {
        let mut bounds = Vec::new();
        let mut start = 0usize;
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                bounds.push(start..i);
                start = i + 1;
            }
        }
        if start < text.len() {
            bounds.push(start..text.len());
        }

        Self {
            source: source.into(),
            text,
            bounds,
        }
    }

    #[inline]
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    #[inline]
    pub fn get(&self, line: usize) -> Option<&str> {
        self.bounds.get(line).map(|r| &self.text[r.clone()])
    }
}

/// Gunzip an archive body into text.
pub fn decompress(location: &str, body: &[u8]) -> Result<String> {
    let mut raw = Vec::with_capacity(body.len() * 4);
    MultiGzDecoder::new(body)
        .read_to_end(&mut raw)
        .map_err(|source| StreamError::Decompress {
            location: location.to_string(),
            source,
        })?;
    String::from_utf8(raw).map_err(|source| StreamError::Utf8 {
        location: location.to_string(),
        source,
    })
}

/// Fetch, gunzip and split one archive.
pub fn load_archive<F: Fetch + ?Sized>(fetcher: &F, location: &str) -> Result<ArchiveLines> {
    info!("Iterating over {} ...", location);
    let body = fetcher.fetch(location)?;
    let text = decompress(location, &body)?;
    let lines = ArchiveLines::from_text(location, text);
    debug!(
        "{}: {} compressed bytes, {} lines",
        location,
        body.len(),
        lines.len()
    );
    Ok(lines)
}
