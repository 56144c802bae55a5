//! mandate: discover UN documents and link resolutions to the drafts they adopt.
//!
//! Usage:
//!   mandate discover              → probe every pattern, download new PDFs
//!   mandate link                  → classify text/ and export the linked graph
//!   mandate show A/RES/80/60      → card for one document
//!   mandate state                 → per-pattern cursor table

mod discover;
mod display;
mod pipeline;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mandate_link::FuzzyConfig;
use mandate_store::GraphStore;
use mandate_sync::{LocalHitPolicy, SyncOptions, SyncState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "mandate",
    about = "Incremental UN document discovery and resolution linking",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (pdfs/, text/, state.json, linked.*)
    #[arg(long, global = true, env = "MANDATE_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk every pattern's identifier space and download new documents
    Discover(DiscoverArgs),
    /// Classify extracted text and export the linked graph
    Link(LinkArgs),
    /// Show one document of the linked graph
    Show {
        /// Document symbol, e.g. A/RES/80/60
        symbol: String,
    },
    /// Show the per-pattern sync cursor
    State {
        /// Pattern config, used to list patterns that have never run
        #[arg(long, env = "MANDATE_CONFIG", default_value = "config/patterns.yaml")]
        config: PathBuf,
    },
}

#[derive(clap::Args)]
struct DiscoverArgs {
    /// Pattern config (YAML)
    #[arg(long, env = "MANDATE_CONFIG", default_value = "config/patterns.yaml")]
    config: PathBuf,

    /// Documents API base URL
    #[arg(long, env = "MANDATE_BASE_URL", default_value = mandate_sync::http::DEFAULT_BASE_URL)]
    base_url: String,

    /// Document language
    #[arg(long, env = "MANDATE_LANGUAGE", default_value = "en")]
    language: String,

    /// Consecutive misses that end a pattern's scan
    #[arg(long, env = "MANDATE_MAX_MISSES", default_value_t = 3)]
    max_misses: u32,

    /// Extra attempts after a transient oracle failure
    #[arg(long, env = "MANDATE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Base retry delay; attempt n waits n times this
    #[arg(long, env = "MANDATE_RETRY_DELAY_MS", default_value_t = 500)]
    retry_delay_ms: u64,

    /// Patterns scanned concurrently
    #[arg(long, env = "MANDATE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Wall-clock limit per pattern, 0 for none
    #[arg(long, env = "MANDATE_PATTERN_TIMEOUT_SECS", default_value_t = 600)]
    pattern_timeout_secs: u64,

    /// Whether an already-downloaded file resets the miss counter
    #[arg(long, env = "MANDATE_LOCAL_POLICY", default_value = "reset")]
    local_policy: LocalHitPolicy,

    /// Only run these patterns (repeatable)
    #[arg(long = "pattern")]
    patterns: Vec<String>,
}

impl DiscoverArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            max_misses: self.max_misses,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            concurrency: self.concurrency,
            pattern_timeout: (self.pattern_timeout_secs > 0)
                .then(|| Duration::from_secs(self.pattern_timeout_secs)),
            local_policy: self.local_policy,
        }
    }
}

#[derive(clap::Args)]
struct LinkArgs {
    /// Minimum title similarity for a fuzzy link
    #[arg(long, env = "MANDATE_FUZZY_THRESHOLD", default_value_t = 0.85)]
    threshold: f64,

    /// Confidence boost when agenda items overlap
    #[arg(long, env = "MANDATE_AGENDA_BOOST", default_value_t = 0.05)]
    agenda_boost: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    tracing::debug!("mandate v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Discover(args) => {
            let report = discover::run(&cli.data_dir, &args).await?;
            display::print_sync_report(&report);
        }
        Commands::Link(args) => {
            let fuzzy = FuzzyConfig {
                threshold: args.threshold,
                agenda_boost: args.agenda_boost,
            };
            let summary = pipeline::run_link_pipeline(&cli.data_dir, &fuzzy)?;
            display::print_link_summary(&summary);
        }
        Commands::Show { symbol } => {
            let store = GraphStore::new(&cli.data_dir);
            let entry = store
                .find(&symbol)
                .with_context(|| format!("looking up {symbol} (run `mandate link` first)"))?;
            let incoming = store.incoming(&entry.symbol)?;
            display::print_card(&entry, &incoming);
        }
        Commands::State { config } => {
            let state = SyncState::load(&cli.data_dir.join(discover::STATE_FILE))?;
            // The config is optional here; without it only recorded patterns are listed.
            let patterns = match mandate_core::load_patterns(&config) {
                Ok(patterns) => patterns,
                Err(e) => {
                    tracing::debug!(error = %e, "pattern config unavailable");
                    Vec::new()
                }
            };
            display::print_state(&state, &patterns);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
