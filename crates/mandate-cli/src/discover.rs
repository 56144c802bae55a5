//! `mandate discover`: one synchronisation run over the configured patterns.

use std::path::Path;

use anyhow::{Context, bail};
use mandate_core::{Pattern, load_patterns};
use mandate_sync::{Crawler, HttpOracle, LocalStore, SyncReport};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::DiscoverArgs;

pub const STATE_FILE: &str = "state.json";
pub const PDF_DIR: &str = "pdfs";

/// Keep only the named patterns, in config order. Empty `only` keeps all.
pub fn select_patterns(patterns: Vec<Pattern>, only: &[String]) -> anyhow::Result<Vec<Pattern>> {
    if only.is_empty() {
        return Ok(patterns);
    }
    if let Some(unknown) = only.iter().find(|n| !patterns.iter().any(|p| &p.name == *n)) {
        bail!("no pattern named {unknown:?} in config");
    }
    Ok(patterns
        .into_iter()
        .filter(|p| only.contains(&p.name))
        .collect())
}

pub async fn run(data_dir: &Path, args: &DiscoverArgs) -> anyhow::Result<SyncReport> {
    // Config errors surface before any network or disk I/O.
    let patterns = load_patterns(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let patterns = select_patterns(patterns, &args.patterns)?;
    if patterns.is_empty() {
        warn!(config = %args.config.display(), "no patterns configured");
    }

    let store = LocalStore::open(data_dir.join(PDF_DIR)).context("opening download directory")?;
    let oracle = HttpOracle::new(args.base_url.clone(), args.language.clone());
    let crawler = Crawler::new(oracle, store, args.options());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight patterns");
            on_signal.cancel();
        }
    });

    info!(patterns = patterns.len(), data_dir = %data_dir.display(), "starting discovery");
    let report = crawler
        .run(&patterns, &data_dir.join(STATE_FILE), &cancel)
        .await
        .context("synchronising")?;
    Ok(report)
}
