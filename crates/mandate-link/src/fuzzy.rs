//! Fuzzy title pass.
//!
//! For resolutions without an explicit edge, picks the most similar
//! proposal or amendment title. Agenda overlap adds a fixed boost to the
//! recorded confidence but never lets a pair below the threshold qualify.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use mandate_core::{ClassifiedDocument, DocType, LinkEdge};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::similarity::{normalize_title, similarity};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyConfig {
    /// Minimum title similarity, inclusive.
    pub threshold: f64,
    /// Added to the confidence on agenda overlap, capped at 1.0.
    pub agenda_boost: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            agenda_boost: 0.05,
        }
    }
}

struct Candidate<'a> {
    symbol: &'a str,
    title: String,
    agenda: &'a BTreeSet<String>,
}

struct Best<'a> {
    symbol: &'a str,
    score: f64,
    overlap: bool,
}

impl Best<'_> {
    /// Higher score, then agenda overlap, then smaller symbol.
    fn beats(&self, other: &Best<'_>) -> bool {
        match self.score.partial_cmp(&other.score) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Less) | None => false,
            Some(Ordering::Equal) => match (self.overlap, other.overlap) {
                (true, false) => true,
                (false, true) => false,
                _ => self.symbol < other.symbol,
            },
        }
    }
}

/// At most one fuzzy edge per unlinked resolution. `linked` holds the
/// symbols of resolutions that already carry an explicit edge. Sorted by
/// source symbol.
pub fn resolve_fuzzy(
    documents: &[ClassifiedDocument],
    linked: &HashSet<String>,
    config: &FuzzyConfig,
) -> Vec<LinkEdge> {
    let candidates: Vec<Candidate<'_>> = documents
        .iter()
        .filter(|d| d.doc_type.is_draft())
        .filter_map(|d| {
            let title = normalize_title(&d.document.title);
            (!title.is_empty()).then(|| Candidate {
                symbol: d.symbol(),
                title,
                agenda: &d.document.agenda_refs,
            })
        })
        .collect();

    let mut edges = Vec::new();
    for res in documents
        .iter()
        .filter(|d| d.doc_type == DocType::Resolution && !linked.contains(d.symbol()))
    {
        let title = normalize_title(&res.document.title);
        if title.is_empty() {
            continue;
        }

        let mut best: Option<Best<'_>> = None;
        for cand in &candidates {
            let score = similarity(&title, &cand.title);
            if score < config.threshold {
                continue;
            }
            let contender = Best {
                symbol: cand.symbol,
                score,
                overlap: !res.document.agenda_refs.is_disjoint(cand.agenda),
            };
            if best.as_ref().is_none_or(|b| contender.beats(b)) {
                best = Some(contender);
            }
        }

        if let Some(best) = best {
            let boost = if best.overlap { config.agenda_boost } else { 0.0 };
            let confidence = (best.score + boost).min(1.0);
            debug!(
                from = res.symbol(),
                to = best.symbol,
                score = best.score,
                confidence,
                "fuzzy match"
            );
            edges.push(LinkEdge::fuzzy(res.symbol(), best.symbol, confidence));
        }
    }

    edges.sort_by(|a, b| a.from_symbol.cmp(&b.from_symbol));
    edges
}
