//! End-to-end linking: classify, resolve both passes, aggregate.
//!
//! Every run recomputes all edges from scratch, so the same inputs always
//! give the same output.

use std::collections::{BTreeMap, HashSet};

use mandate_core::symbol::normalize_symbol;
use mandate_core::{DocType, LinkEdge, LinkMethod, LinkedDocument, StructuredDocument};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::classifier::Classifier;
use crate::explicit::resolve_explicit;
use crate::extract::Extractor;
use crate::fuzzy::{FuzzyConfig, resolve_fuzzy};
use crate::ExtractionError;

/// Counts for one linking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub documents: usize,
    pub duplicates_dropped: usize,
    pub by_type: BTreeMap<DocType, usize>,
    pub explicit_edges: usize,
    pub fuzzy_edges: usize,
    pub linked_explicit: usize,
    pub linked_fuzzy: usize,
    pub adopted: usize,
}

#[derive(Debug, Clone)]
pub struct LinkOutput {
    /// Sorted by symbol.
    pub documents: Vec<LinkedDocument>,
    pub explicit_edges: Vec<LinkEdge>,
    pub fuzzy_edges: Vec<LinkEdge>,
    pub stats: LinkStats,
}

/// Extract every `(symbol, bytes)` input. Failures are returned alongside
/// the successes rather than aborting the batch.
pub fn extract_all<E, I>(extractor: &E, inputs: I) -> (Vec<StructuredDocument>, Vec<ExtractionError>)
where
    E: Extractor + ?Sized,
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for (symbol, bytes) in inputs {
        match extractor.extract(&symbol, &bytes) {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                warn!(error = %e, "extraction failed");
                failures.push(e);
            }
        }
    }
    (documents, failures)
}

/// Classify and link a document set.
///
/// Documents sharing a symbol (case-insensitive) are collapsed to the first
/// one by symbol, then content order.
pub fn link_documents(
    mut documents: Vec<StructuredDocument>,
    classifier: &Classifier,
    fuzzy: &FuzzyConfig,
) -> LinkOutput {
    documents.sort_by(|a, b| {
        (&a.symbol, &a.title, &a.paragraphs, &a.agenda_refs, &a.symbol_refs).cmp(&(
            &b.symbol,
            &b.title,
            &b.paragraphs,
            &b.agenda_refs,
            &b.symbol_refs,
        ))
    });
    let before = documents.len();
    let mut seen = HashSet::new();
    documents.retain(|d| {
        let fresh = seen.insert(normalize_symbol(&d.symbol));
        if !fresh {
            warn!(symbol = %d.symbol, "duplicate symbol dropped");
        }
        fresh
    });
    let duplicates_dropped = before - documents.len();

    let classified = classifier.classify_all(documents);
    let explicit_edges = resolve_explicit(&classified);
    let linked: HashSet<String> = explicit_edges.iter().map(|e| e.from_symbol.clone()).collect();
    let fuzzy_edges = resolve_fuzzy(&classified, &linked, fuzzy);
    let documents = aggregate(classified, &explicit_edges, &fuzzy_edges);

    let mut stats = LinkStats {
        documents: documents.len(),
        duplicates_dropped,
        explicit_edges: explicit_edges.len(),
        fuzzy_edges: fuzzy_edges.len(),
        ..Default::default()
    };
    for doc in &documents {
        *stats.by_type.entry(doc.doc_type()).or_default() += 1;
        match doc.outgoing_edge.as_ref().map(|e| e.method) {
            Some(LinkMethod::Explicit) => stats.linked_explicit += 1,
            Some(LinkMethod::Fuzzy) => stats.linked_fuzzy += 1,
            None => {}
        }
        if doc.adopted {
            stats.adopted += 1;
        }
    }

    info!(
        documents = stats.documents,
        explicit = stats.linked_explicit,
        fuzzy = stats.linked_fuzzy,
        adopted = stats.adopted,
        "linking complete"
    );

    LinkOutput {
        documents,
        explicit_edges,
        fuzzy_edges,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::TextExtractor;

    fn doc(symbol: &str, title: &str, agenda: &[&str], refs: &[&str]) -> StructuredDocument {
        StructuredDocument {
            symbol: symbol.into(),
            title: title.into(),
            paragraphs: vec!["Decides to remain seized of the matter.".into()],
            agenda_refs: agenda.iter().map(|s| s.to_string()).collect(),
            symbol_refs: refs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn corpus() -> Vec<StructuredDocument> {
        vec![
            doc(
                "A/RES/80/60",
                "80/60. Strengthening of the coordination of humanitarian assistance",
                &["70"],
                &[],
            ),
            doc("A/80/L.12", "Strengthening the coordination of humanitarian assistance", &["70"], &[]),
            doc("A/RES/80/61", "80/61. Oceans and the law of the sea", &["76"], &["A/80/L.20"]),
            doc("A/RES/80/62", "80/62. Sustainable fisheries", &["76"], &["A/80/L.20"]),
            doc("A/80/L.20", "Oceans and the law of the sea", &["76"], &[]),
            doc("A/80/L.21", "Amendment to draft resolution A/80/L.20", &["76"], &["A/80/L.20"]),
            doc("A/80/L.30", "International Day of Forests", &[], &[]),
            doc("A/80/400", "Report of the Fifth Committee", &[], &[]),
        ]
    }

    fn run(docs: Vec<StructuredDocument>) -> LinkOutput {
        link_documents(docs, &Classifier::default(), &FuzzyConfig::default())
    }

    #[test]
    fn links_corpus() {
        let out = run(corpus());
        let by_symbol = |s: &str| out.documents.iter().find(|d| d.symbol() == s).unwrap();

        let fuzzy = by_symbol("A/RES/80/60").outgoing_edge.clone().unwrap();
        assert_eq!(fuzzy.method, LinkMethod::Fuzzy);
        assert_eq!(fuzzy.to_symbol, "A/80/L.12");
        assert_eq!(fuzzy.confidence, 1.0);

        assert_eq!(by_symbol("A/RES/80/61").outgoing_edge.as_ref().unwrap().method, LinkMethod::Explicit);
        assert_eq!(by_symbol("A/RES/80/62").outgoing_edge.as_ref().unwrap().to_symbol, "A/80/L.20");

        assert!(by_symbol("A/80/L.12").adopted);
        assert!(by_symbol("A/80/L.20").adopted);
        assert!(!by_symbol("A/80/L.30").adopted);

        let amendment = by_symbol("A/80/L.21");
        assert_eq!(amendment.doc_type(), DocType::Amendment);
        assert_eq!(amendment.classified.base_symbol.as_deref(), Some("A/80/L.20"));
        assert_eq!(by_symbol("A/80/400").doc_type(), DocType::Other);

        assert_eq!(out.stats.documents, 8);
        assert_eq!(out.stats.linked_explicit, 2);
        assert_eq!(out.stats.linked_fuzzy, 1);
        assert_eq!(out.stats.adopted, 2);
        assert_eq!(out.stats.by_type[&DocType::Resolution], 3);
        assert_eq!(out.stats.by_type[&DocType::Proposal], 3);
    }

    #[test]
    fn idempotent_under_reordering() {
        let first = run(corpus());
        let mut shuffled = corpus();
        shuffled.reverse();
        shuffled.swap(1, 5);
        let second = run(shuffled);

        assert_eq!(first.documents, second.documents);
        assert_eq!(first.explicit_edges, second.explicit_edges);
        assert_eq!(first.fuzzy_edges, second.fuzzy_edges);
        assert_eq!(
            serde_json::to_string(&first.documents).unwrap(),
            serde_json::to_string(&second.documents).unwrap()
        );
    }

    #[test]
    fn duplicates_collapse() {
        let mut docs = corpus();
        docs.push(doc("a/80/l.30", "Another copy", &[], &[]));
        let out = run(docs);
        assert_eq!(out.stats.duplicates_dropped, 1);
        assert_eq!(out.stats.documents, 8);
    }

    #[test]
    fn identical_symbols_resolve_independent_of_order() {
        let first = doc("A/80/L.30", "International Day of Forests", &[], &[]);
        let second = doc("A/80/L.30", "International Day of Mountains", &[], &[]);

        let forward = run(vec![first.clone(), second.clone()]);
        let backward = run(vec![second, first]);
        assert_eq!(forward.documents, backward.documents);
        assert_eq!(forward.stats.duplicates_dropped, 1);
        assert_eq!(
            forward.documents[0].classified.document.title,
            "International Day of Forests"
        );
    }

    #[test]
    fn extract_all_collects_failures() {
        let inputs = vec![
            ("A/80/L.1".to_string(), b"Chile: draft resolution\nOceans\n1. Decides to act.\n".to_vec()),
            ("A/80/L.2".to_string(), b"%PDF-1.7".to_vec()),
            ("A/80/L.3".to_string(), Vec::new()),
        ];
        let (docs, failures) = extract_all(&TextExtractor, inputs);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Oceans");
        let failed: Vec<_> = failures.iter().map(|e| e.symbol()).collect();
        assert_eq!(failed, vec!["A/80/L.2", "A/80/L.3"]);
    }
}
