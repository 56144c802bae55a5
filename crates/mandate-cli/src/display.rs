//! Terminal rendering for CLI output: document cards, run reports, cursor tables.

use mandate_core::{DocType, GraphEntry, Pattern};
use mandate_sync::{ScanOutcome, SyncReport, SyncState};

use crate::pipeline::LinkSummary;

/// Max incoming links shown on a card before truncation.
const MAX_LIST_ITEMS: usize = 10;

// ── Document card ──

/// Print one document of the linked graph as a vertical card.
pub fn print_card(entry: &GraphEntry, incoming: &[GraphEntry]) {
    println!("=== {} ===", entry.symbol);
    if !entry.title.is_empty() {
        println!("{}", entry.title);
    }
    println!();

    println!("Identity");
    field("symbol", &entry.symbol);
    field("type", entry.doc_type.as_str());
    if let Some(base) = &entry.base_symbol {
        field("amends", base);
    }
    println!();

    if let Some(link) = &entry.link {
        println!("Link");
        field("target", &link.target);
        field("method", link.method.as_str());
        field("confidence", &format!("{:.3}", link.confidence));
        println!();
    }

    if entry.doc_type.is_draft() {
        println!("Status");
        field("adopted", if entry.adopted { "yes" } else { "no" });
        println!();
    }

    if !incoming.is_empty() {
        println!("Linked from ({})", incoming.len());
        for source in incoming.iter().take(MAX_LIST_ITEMS) {
            let (method, confidence) = source
                .link
                .as_ref()
                .map(|l| (l.method.as_str(), l.confidence))
                .unwrap_or(("-", 0.0));
            println!(
                "    {:<24} {:<11} {:<9} {:.3}",
                source.symbol,
                source.doc_type.as_str(),
                method,
                confidence
            );
            if !source.title.is_empty() {
                println!("      {}", truncate(&source.title, 60));
            }
        }
        if incoming.len() > MAX_LIST_ITEMS {
            println!("    ... and {} more", incoming.len() - MAX_LIST_ITEMS);
        }
        println!();
    }
}

fn field(name: &str, value: &str) {
    println!("  {:<26} {}", name, value);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

// ── Discovery report ──

pub fn print_sync_report(report: &SyncReport) {
    println!(
        "{:<28} {:>9} {:>9} {:>5} {:>6} {:>6}  {:<18} {:>8}",
        "pattern", "previous", "highest", "new", "local", "misses", "outcome", "elapsed"
    );
    for p in &report.patterns {
        println!(
            "{:<28} {:>9} {:>9} {:>5} {:>6} {:>6}  {:<18} {:>7.1}s",
            p.pattern,
            p.previous_highest,
            p.highest_found,
            p.downloaded.len(),
            p.skipped_local,
            p.misses,
            p.outcome.as_str(),
            p.elapsed.as_secs_f64()
        );
        match &p.outcome {
            ScanOutcome::RetriesExhausted { symbol } => {
                println!("  gave up at {symbol} after repeated oracle errors");
            }
            ScanOutcome::StorageFailed { symbol, reason } => {
                println!("  could not store {symbol}: {reason}");
            }
            _ => {}
        }
    }

    let downloaded = report.downloaded();
    println!();
    println!("{} new document(s)", downloaded.len());
    for symbol in downloaded.iter().take(MAX_LIST_ITEMS) {
        println!("  {symbol}");
    }
    if downloaded.len() > MAX_LIST_ITEMS {
        println!("  ... and {} more", downloaded.len() - MAX_LIST_ITEMS);
    }
}

// ── Link summary ──

pub fn print_link_summary(summary: &LinkSummary) {
    let stats = &summary.stats;
    println!();
    println!("Linking complete in {:.1}s", summary.elapsed_secs);
    field("files read", &summary.files_read.to_string());
    field("documents", &stats.documents.to_string());
    if stats.duplicates_dropped > 0 {
        field("duplicates dropped", &stats.duplicates_dropped.to_string());
    }
    println!();

    println!("By type");
    for doc_type in DocType::ALL {
        let n = stats.by_type.get(&doc_type).copied().unwrap_or(0);
        field(doc_type.as_str(), &n.to_string());
    }
    println!();

    println!("Links");
    field("explicit edges", &stats.explicit_edges.to_string());
    field("fuzzy edges", &stats.fuzzy_edges.to_string());
    field("linked (explicit)", &stats.linked_explicit.to_string());
    field("linked (fuzzy)", &stats.linked_fuzzy.to_string());
    field("drafts adopted", &stats.adopted.to_string());
    println!();

    if !summary.skipped.is_empty() {
        println!("Skipped ({})", summary.skipped.len());
        for (symbol, reason) in summary.skipped.iter().take(MAX_LIST_ITEMS) {
            println!("    {:<24} {}", symbol, reason);
        }
        if summary.skipped.len() > MAX_LIST_ITEMS {
            println!("    ... and {} more", summary.skipped.len() - MAX_LIST_ITEMS);
        }
        println!();
    }

    for path in &summary.exported {
        println!("  wrote {}", path.display());
    }
}

// ── Sync state ──

/// One row per pattern: configured patterns first (in config order), then any
/// recorded pattern no longer in the config.
pub fn state_rows(state: &SyncState, patterns: &[Pattern]) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = patterns
        .iter()
        .map(|p| {
            let cursor = match state.highest_found(&p.name) {
                Some(h) => h.to_string(),
                None => format!("never run (starts at {})", p.start),
            };
            (p.name.clone(), cursor)
        })
        .collect();
    for (name, recorded) in &state.patterns {
        if !patterns.iter().any(|p| &p.name == name) {
            rows.push((name.clone(), format!("{} (not in config)", recorded.highest_found)));
        }
    }
    rows
}

pub fn print_state(state: &SyncState, patterns: &[Pattern]) {
    match state.last_sync {
        Some(at) => println!("last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("last sync: never"),
    }
    println!();
    let rows = state_rows(state, patterns);
    if rows.is_empty() {
        println!("No patterns recorded or configured.");
        return;
    }
    println!("{:<28} highest_found", "pattern");
    for (name, cursor) in rows {
        println!("{:<28} {}", name, cursor);
    }
}
