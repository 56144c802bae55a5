//! Extraction, classification and linking of UN documents.
//!
//! Pipeline: [`extract`] text into [`mandate_core::StructuredDocument`]s,
//! [`classifier`] assigns a type, [`explicit`] and [`fuzzy`] propose edges,
//! [`aggregate`] keeps one outgoing edge per document and derives `adopted`.

pub mod aggregate;
pub mod classifier;
mod error;
pub mod explicit;
pub mod extract;
pub mod fuzzy;
pub mod pipeline;
pub mod rules;
pub mod similarity;

pub use aggregate::aggregate;
pub use classifier::{Classifier, classify};
pub use error::ExtractionError;
pub use explicit::resolve_explicit;
pub use extract::{Extractor, TextExtractor, extract_text};
pub use fuzzy::{FuzzyConfig, resolve_fuzzy};
pub use pipeline::{LinkOutput, LinkStats, extract_all, link_documents};
pub use rules::{Condition, Rule, RuleTable};
pub use similarity::{normalize_title, title_similarity};
