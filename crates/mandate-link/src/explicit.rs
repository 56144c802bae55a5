//! Explicit reference pass.
//!
//! A resolution citing the symbol of a proposal or amendment in the same
//! input set links to it with confidence 1.0.

use std::collections::HashMap;

use mandate_core::symbol::normalize_symbol;
use mandate_core::{ClassifiedDocument, DocType, LinkEdge};

/// One edge per (resolution, cited draft) pair, sorted by source then
/// target. Independent of document order.
pub fn resolve_explicit(documents: &[ClassifiedDocument]) -> Vec<LinkEdge> {
    let drafts: HashMap<String, &str> = documents
        .iter()
        .filter(|d| d.doc_type.is_draft())
        .map(|d| (normalize_symbol(d.symbol()), d.symbol()))
        .collect();

    let mut edges: Vec<LinkEdge> = documents
        .iter()
        .filter(|d| d.doc_type == DocType::Resolution)
        .flat_map(|res| {
            let own = normalize_symbol(res.symbol());
            let drafts = &drafts;
            res.document
                .symbol_refs
                .iter()
                .map(|r| normalize_symbol(r))
                .filter(move |r| *r != own)
                .filter_map(move |r| drafts.get(&r).map(|target| LinkEdge::explicit(res.symbol(), target)))
        })
        .collect();

    edges.sort_by(|a, b| {
        (a.from_symbol.as_str(), a.to_symbol.as_str()).cmp(&(b.from_symbol.as_str(), b.to_symbol.as_str()))
    });
    edges.dedup();
    edges
}
