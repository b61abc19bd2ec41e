use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpus_index::IndexStore;
use std::{path::PathBuf, time::Duration};
use tracing::Level;

mod commands;

#[derive(Parser)]
#[command(name = "s2corpus")]
#[command(about = "Look up and stream records of the S2 corpus")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Corpus root holding manifest.txt and the s2-corpus-NNN.gz archives (URL or directory)
    #[arg(long, global = true)]
    pub(crate) root: Option<String>,

    /// Sorted binary index file (28-byte records)
    #[arg(long, global = true)]
    pub(crate) index: Option<PathBuf>,

    /// HTTP timeout per archive, in seconds
    #[arg(long, default_value_t = 300, global = true)]
    pub(crate) timeout_secs: u64,

    /// Print progress every N records (0 disables)
    #[arg(long, default_value_t = 10_000, global = true)]
    pub(crate) progress_every: u64,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve hex object ids to (archive, offset)
    Lookup {
        #[arg(value_name = "HEX_ID", required = true)]
        ids: Vec<String>,
    },

    /// Record count per archive
    Span,

    /// Offsets of one archive's records, in index order
    Offsets { archive: u32 },

    /// Check that the index is sorted by id
    Verify,

    /// Walk every archive listed in the manifest whose name matches PATTERN
    Scan {
        /// Regex matched against manifest file names
        #[arg(short, long, default_value = r"s2-corpus-\d+\.gz")]
        pattern: String,

        /// If set, stop after N records
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Walk only the records named by the index
    WalkIndex {
        /// If set, stop after N records
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Fetch single records by hex id
    Fetch {
        #[arg(value_name = "HEX_ID", required = true)]
        ids: Vec<String>,
    },
}

impl Cli {
    pub(crate) fn root(&self) -> Result<&str> {
        self.root
            .as_deref()
            .context("--root is required for this command")
    }

    pub(crate) fn load_index(&self) -> Result<IndexStore> {
        let path = self
            .index
            .as_ref()
            .context("--index is required for this command")?;
        IndexStore::load(path).with_context(|| format!("load index {}", path.display()))
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Lookup { ids } => commands::index::lookup(&cli, ids),
        Commands::Span => commands::index::span(&cli),
        Commands::Offsets { archive } => commands::index::offsets(&cli, *archive),
        Commands::Verify => commands::index::verify(&cli),
        Commands::Scan { pattern, limit } => commands::walk::scan(&cli, pattern, *limit),
        Commands::WalkIndex { limit } => commands::walk::walk_index(&cli, *limit),
        Commands::Fetch { ids } => commands::walk::fetch(&cli, ids),
    }
}
