use regex::Regex;
use tracing::info;

use crate::{
    archive::{Fetch, join_root},
    error::{StreamError, StreamResult as Result},
};

pub const MANIFEST_NAME: &str = "manifest.txt";

/// Archive locations under `root` whose manifest entry matches `pattern`,
/// in manifest order.
pub fn archive_urls<F: Fetch + ?Sized>(
    fetcher: &F,
    root: &str,
    pattern: &str,
) -> Result<Vec<String>> {
    let re = Regex::new(pattern)?;
    let location = join_root(root, MANIFEST_NAME);

    let raw = fetcher.fetch(&location)?;
    let text = String::from_utf8(raw).map_err(|source| StreamError::Utf8 {
        location: location.clone(),
        source,
    })?;

    let urls = select_archives(&text, root, &re);
    info!("{}: {} archives match {:?}", location, urls.len(), pattern);
    Ok(urls)
}

/// Filter manifest lines with `re` (unanchored) and join them to `root`.
pub fn select_archives(manifest: &str, root: &str, re: &Regex) -> Vec<String> {
    manifest
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty() && re.is_match(name))
        .map(|name| join_root(root, name))
        .collect()
}
