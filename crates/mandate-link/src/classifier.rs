//! Document classification.
//!
//! Assigns each [`StructuredDocument`] a [`DocType`] from the [`RuleTable`]
//! and, for amendments, infers the draft being amended.

use std::sync::LazyLock;

use mandate_core::symbol::{
    base_draft, draft_prefix, find_draft_citations, is_draft_symbol, is_revision_like,
    normalize_symbol,
};
use mandate_core::{ClassifiedDocument, DocType, StructuredDocument, symbol_sort_key};
use tracing::{debug, info};

use crate::rules::RuleTable;

static STANDARD: LazyLock<Classifier> = LazyLock::new(Classifier::default);

/// Classify with the standard rule table.
pub fn classify(document: StructuredDocument) -> ClassifiedDocument {
    STANDARD.classify(document)
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: RuleTable,
}

impl Classifier {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    /// Classify one document. Never fails: documents no rule recognises are
    /// typed [`DocType::Other`].
    pub fn classify(&self, document: StructuredDocument) -> ClassifiedDocument {
        let doc_type = match self.rules.evaluate(&document) {
            Some(rule) => {
                debug!(symbol = %document.symbol, rule = rule.name, doc_type = %rule.doc_type, "classified");
                rule.doc_type
            }
            None => {
                info!(symbol = %document.symbol, "no classification rule matched, typing as other");
                DocType::Other
            }
        };

        let base_symbol = if doc_type == DocType::Amendment {
            let base = infer_base_symbol(&document);
            if base.is_none() {
                debug!(symbol = %document.symbol, "amendment without identifiable base draft");
            }
            base
        } else {
            None
        };

        ClassifiedDocument {
            document,
            doc_type,
            base_symbol,
        }
    }

    pub fn classify_all(&self, documents: Vec<StructuredDocument>) -> Vec<ClassifiedDocument> {
        documents.into_iter().map(|d| self.classify(d)).collect()
    }
}

/// The draft an amendment targets.
///
/// 1. A revision's unrevised symbol (`A/C.3/78/L.23/Rev.1` → `A/C.3/78/L.23`).
/// 2. The lowest cited draft of the same series (same session and committee).
/// 3. The first such draft cited in the paragraphs.
fn infer_base_symbol(doc: &StructuredDocument) -> Option<String> {
    if let Some(base) = base_draft(&doc.symbol) {
        return Some(base);
    }

    let own = normalize_symbol(&doc.symbol);
    let prefix = draft_prefix(&own);
    let eligible = |candidate: &str| {
        candidate != own
            && is_draft_symbol(candidate)
            && !is_revision_like(candidate)
            && (prefix.is_none() || draft_prefix(candidate) == prefix)
    };

    doc.symbol_refs
        .iter()
        .filter(|s| eligible(s.as_str()))
        .min_by_key(|s| symbol_sort_key(s))
        .cloned()
        .or_else(|| {
            doc.paragraphs
                .iter()
                .flat_map(|p| find_draft_citations(p))
                .find(|s| eligible(s.as_str()))
        })
}
