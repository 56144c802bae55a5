//! Merge explicit and fuzzy edges into one outgoing edge per document.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use mandate_core::{ClassifiedDocument, DocType, LinkEdge, LinkedDocument, symbol_sort_key};

/// Strict preference between two edges from the same source: higher
/// confidence, then smaller target symbol.
fn prefer(a: &LinkEdge, b: &LinkEdge) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.to_symbol.cmp(&b.to_symbol))
}

/// Best edge per source symbol.
fn best_by_source(edges: &[LinkEdge]) -> HashMap<&str, &LinkEdge> {
    let mut best: HashMap<&str, &LinkEdge> = HashMap::new();
    for edge in edges {
        best.entry(edge.from_symbol.as_str())
            .and_modify(|current| {
                if prefer(edge, *current) == Ordering::Less {
                    *current = edge;
                }
            })
            .or_insert(edge);
    }
    best
}

/// Combine both passes.
///
/// Explicit edges dominate fuzzy ones for the same source. A proposal or
/// amendment is `adopted` when a retained edge from a resolution targets it.
/// Output is sorted by symbol and does not depend on input order.
pub fn aggregate(
    documents: Vec<ClassifiedDocument>,
    explicit: &[LinkEdge],
    fuzzy: &[LinkEdge],
) -> Vec<LinkedDocument> {
    let explicit = best_by_source(explicit);
    let fuzzy = best_by_source(fuzzy);

    let types: HashMap<&str, DocType> = documents.iter().map(|d| (d.symbol(), d.doc_type)).collect();

    let retained: HashMap<&str, &LinkEdge> = types
        .keys()
        .filter_map(|symbol| {
            explicit
                .get(symbol)
                .or_else(|| fuzzy.get(symbol))
                .map(|edge| (*symbol, *edge))
        })
        .collect();

    let adopted: HashSet<&str> = retained
        .iter()
        .filter(|(from, _)| types.get(*from) == Some(&DocType::Resolution))
        .map(|(_, edge)| edge.to_symbol.as_str())
        .collect();

    let mut linked: Vec<LinkedDocument> = documents
        .iter()
        .map(|d| LinkedDocument {
            classified: d.clone(),
            outgoing_edge: retained.get(d.symbol()).map(|e| (*e).clone()),
            adopted: d.doc_type.is_draft() && adopted.contains(d.symbol()),
        })
        .collect();

    linked.sort_by(|a, b| {
        symbol_sort_key(a.symbol())
            .cmp(&symbol_sort_key(b.symbol()))
            .then_with(|| a.symbol().cmp(b.symbol()))
    });
    linked
}
