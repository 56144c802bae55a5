//! Linking pipeline: reads text/, extracts, classifies, links, writes the exports.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use mandate_core::symbol::filename_to_symbol;
use mandate_core::symbol_sort_key;
use mandate_link::{Classifier, FuzzyConfig, LinkStats, TextExtractor, extract_all, link_documents};
use mandate_store::GraphStore;
use tracing::info;

pub const TEXT_DIR: &str = "text";

pub struct LinkSummary {
    pub files_read: usize,
    /// `(symbol, reason)` for every file that could not be extracted.
    pub skipped: Vec<(String, String)>,
    pub stats: LinkStats,
    pub exported: Vec<PathBuf>,
    pub elapsed_secs: f64,
}

/// `(symbol, path)` of every `.txt` file in `dir`, in symbol order.
pub fn list_text_files(dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "txt")
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            files.push((filename_to_symbol(name), path));
        }
    }
    files.sort_by_cached_key(|(symbol, _)| symbol_sort_key(symbol));
    Ok(files)
}

/// Run the full linking pipeline over `<data_dir>/text` and export to `<data_dir>`.
pub fn run_link_pipeline(data_dir: &Path, fuzzy: &FuzzyConfig) -> anyhow::Result<LinkSummary> {
    let start = Instant::now();

    // 1. Read extracted text.
    let files = list_text_files(&data_dir.join(TEXT_DIR))?;
    let files_read = files.len();
    eprintln!("  Read {files_read} text files from {}", data_dir.join(TEXT_DIR).display());

    let mut inputs = Vec::with_capacity(files.len());
    for (symbol, path) in files {
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        inputs.push((symbol, bytes));
    }

    // 2. Extract structure; failures are reported, not fatal.
    let (documents, failures) = extract_all(&TextExtractor, inputs);
    let skipped: Vec<(String, String)> = failures
        .iter()
        .map(|e| (e.symbol().to_string(), e.to_string()))
        .collect();

    // 3. Classify and link.
    let output = link_documents(documents, &Classifier::default(), fuzzy);

    // 4. Export.
    let store = GraphStore::new(data_dir);
    store.export(&output.documents).context("writing linked graph")?;
    info!(
        documents = output.stats.documents,
        skipped = skipped.len(),
        "linked graph exported"
    );

    Ok(LinkSummary {
        files_read,
        skipped,
        stats: output.stats,
        exported: vec![store.parquet_path(), store.json_path()],
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
