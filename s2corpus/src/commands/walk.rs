use anyhow::{Context, Result};
use corpus_index::ObjectId;
use corpus_stream::{
    DriveSummary, Driver, Fetcher, IndexedProvider, JsonHandler, ObjectHandler, ObjectProvider,
    ObjectRecord, SequentialProvider, archive_urls, fetch_object,
};
use serde::de::IgnoredAny;
use std::{
    io::{self, BufWriter, Write},
    time::Instant,
};
use tracing::info;

use crate::Cli;

pub fn scan(cli: &Cli, pattern: &str, limit: Option<u64>) -> Result<()> {
    let root = cli.root()?;
    let fetcher = Fetcher::new(cli.timeout())?;

    let urls = archive_urls(&fetcher, root, pattern).context("resolve manifest")?;
    info!("scan: {} archives under {}", urls.len(), root);

    let mut provider = SequentialProvider::new(urls, &fetcher);
    print_all(cli, &mut provider, limit)
}

pub fn walk_index(cli: &Cli, limit: Option<u64>) -> Result<()> {
    let root = cli.root()?;
    let index = cli.load_index()?;
    let fetcher = Fetcher::new(cli.timeout())?;

    info!("walk-index: {} records under {}", index.len(), root);
    let mut provider = IndexedProvider::new(&index, root, &fetcher);
    print_all(cli, &mut provider, limit)
}

pub fn fetch(cli: &Cli, ids: &[String]) -> Result<()> {
    let root = cli.root()?;
    let index = cli.load_index()?;
    let fetcher = Fetcher::new(cli.timeout())?;
    let mut out = BufWriter::new(io::stdout().lock());

    for raw in ids {
        let id: ObjectId = raw.parse()?;
        match fetch_object(&index, root, &fetcher, &id)? {
            Some(rec) => write_record(&mut out, &rec)?,
            None => writeln!(out, "{id}\tnot-found")?,
        }
    }
    out.flush().context("flush stdout")
}

/// `source<TAB>offset<TAB>payload`, payload exactly as stored.
fn write_record<W: Write>(out: &mut W, r: &ObjectRecord) -> io::Result<()> {
    writeln!(out, "{}\t{}\t{}", r.source, r.offset, r.payload)
}

/// Checks that a payload is well-formed JSON, then writes it verbatim.
fn record_writer<W: Write>(out: &mut W) -> impl ObjectHandler + '_ {
    JsonHandler::new(move |_: IgnoredAny, r: &ObjectRecord| {
        write_record(&mut *out, r)?;
        Ok(())
    })
}

/// Print every well-formed record, one per line.
fn print_all<P: ObjectProvider>(cli: &Cli, provider: &mut P, limit: Option<u64>) -> Result<()> {
    let start = Instant::now();
    let mut out = BufWriter::with_capacity(1 << 20, io::stdout().lock());

    let mut handler = record_writer(&mut out);
    let summary = Driver::new()
        .progress_every(cli.progress_every)
        .limit(limit)
        .run(provider, &mut handler)?;
    drop(handler);
    out.flush().context("flush stdout")?;

    report(&summary, start);
    Ok(())
}

fn report(summary: &DriveSummary, start: Instant) {
    info!(
        "done: {} objects, {} failed, {:.1}s",
        summary.delivered,
        summary.failed,
        start.elapsed().as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(payload: &str) -> ObjectRecord {
        ObjectRecord {
            payload: payload.to_string(),
            source: Arc::from("s2-corpus-000.gz"),
            offset: 7,
            archive: Some(0),
        }
    }

    #[test]
    fn payload_is_written_verbatim() {
        let payload =
            r#"{"paperId":"x","year":2020,"score":1.10000000000000000001,"big":123456789012345678901234567890}"#;
        let mut out = Vec::new();
        record_writer(&mut out).handle(&record(payload)).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("s2-corpus-000.gz\t7\t{payload}\n"));
    }

    #[test]
    fn malformed_payload_is_rejected_and_not_written() {
        let mut out = Vec::new();
        {
            let mut handler = record_writer(&mut out);
            assert!(handler.handle(&record("{\"paperId\":")).is_err());
            handler.handle(&record("{\"z\":1,\"a\":2}")).unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "s2-corpus-000.gz\t7\t{\"z\":1,\"a\":2}\n"
        );
    }
}
