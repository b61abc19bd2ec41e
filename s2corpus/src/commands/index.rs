use anyhow::{Context, Result};
use corpus_index::ObjectId;
use std::io::{self, BufWriter, Write};
use tracing::info;

use crate::Cli;

pub fn lookup(cli: &Cli, ids: &[String]) -> Result<()> {
    let index = cli.load_index()?;
    let mut out = BufWriter::new(io::stdout().lock());

    for raw in ids {
        let id: ObjectId = raw.parse()?;
        match index.lookup(&id) {
            Some(loc) => writeln!(out, "{id}\t{}\t{}", loc.archive, loc.offset)?,
            None => writeln!(out, "{id}\tnot-found")?,
        }
    }
    out.flush().context("flush stdout")
}

pub fn span(cli: &Cli) -> Result<()> {
    let index = cli.load_index()?;
    let span = index.span();
    let mut out = BufWriter::new(io::stdout().lock());

    for (archive, count) in &span {
        writeln!(out, "{archive}\t{count}")?;
    }
    out.flush().context("flush stdout")?;

    info!(
        "{} archives, {} records",
        span.len(),
        span.values().sum::<u64>()
    );
    Ok(())
}

pub fn offsets(cli: &Cli, archive: u32) -> Result<()> {
    let index = cli.load_index()?;
    let mut out = BufWriter::new(io::stdout().lock());

    let offsets = index.all_offsets(archive);
    for o in &offsets {
        writeln!(out, "{o}")?;
    }
    out.flush().context("flush stdout")?;

    info!("archive {}: {} offsets", archive, offsets.len());
    Ok(())
}

pub fn verify(cli: &Cli) -> Result<()> {
    let index = cli.load_index()?;
    index.verify_sorted()?;
    info!("index ok: {} records, sorted", index.len());
    Ok(())
}
