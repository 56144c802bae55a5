//! Document model shared by the extraction, classification and linking stages.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Structured text record produced by the extraction collaborator.
///
/// Created once per source file and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    /// Canonical identifier, e.g. `A/RES/80/142`.
    pub symbol: String,
    pub title: String,
    pub paragraphs: Vec<String>,
    /// Agenda item numbers, e.g. `"70"`, `"12A"`.
    pub agenda_refs: BTreeSet<String>,
    /// Draft symbols cited in the text, upper-cased.
    pub symbol_refs: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Resolution,
    Proposal,
    Amendment,
    Decision,
    Other,
}

impl DocType {
    pub const ALL: [DocType; 5] = [
        Self::Resolution,
        Self::Proposal,
        Self::Amendment,
        Self::Decision,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolution => "resolution",
            Self::Proposal => "proposal",
            Self::Amendment => "amendment",
            Self::Decision => "decision",
            Self::Other => "other",
        }
    }

    /// Drafts are the documents a resolution can adopt.
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Proposal | Self::Amendment)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown document type: {s:?}"))
    }
}

/// A [`StructuredDocument`] with its assigned type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDocument {
    #[serde(flatten)]
    pub document: StructuredDocument,
    pub doc_type: DocType,
    /// The proposal an amendment targets. Only ever set for amendments.
    pub base_symbol: Option<String>,
}

impl ClassifiedDocument {
    pub fn symbol(&self) -> &str {
        &self.document.symbol
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    /// The source cites the target's symbol.
    Explicit,
    /// Title similarity above threshold.
    Fuzzy,
}

impl LinkMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for LinkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explicit" => Ok(Self::Explicit),
            "fuzzy" => Ok(Self::Fuzzy),
            other => Err(format!("unknown link method: {other:?}")),
        }
    }
}

/// Directed edge from a derivative document (resolution) to its target draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub from_symbol: String,
    pub to_symbol: String,
    pub method: LinkMethod,
    /// In `[0, 1]`. Explicit edges are always 1.0.
    pub confidence: f64,
}

impl LinkEdge {
    pub fn explicit(from: &str, to: &str) -> Self {
        Self {
            from_symbol: from.to_string(),
            to_symbol: to.to_string(),
            method: LinkMethod::Explicit,
            confidence: 1.0,
        }
    }

    pub fn fuzzy(from: &str, to: &str, confidence: f64) -> Self {
        Self {
            from_symbol: from.to_string(),
            to_symbol: to.to_string(),
            method: LinkMethod::Fuzzy,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Final per-document output of a linking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedDocument {
    #[serde(flatten)]
    pub classified: ClassifiedDocument,
    pub outgoing_edge: Option<LinkEdge>,
    /// True iff a draft targeted by at least one retained resolution edge.
    pub adopted: bool,
}

impl LinkedDocument {
    pub fn symbol(&self) -> &str {
        self.classified.symbol()
    }

    pub fn doc_type(&self) -> DocType {
        self.classified.doc_type
    }

    /// Flattened record for downstream rendering.
    pub fn to_entry(&self) -> GraphEntry {
        GraphEntry {
            symbol: self.symbol().to_string(),
            doc_type: self.doc_type(),
            title: self.classified.document.title.clone(),
            base_symbol: self.classified.base_symbol.clone(),
            link: self.outgoing_edge.as_ref().map(|e| GraphLink {
                target: e.to_symbol.clone(),
                method: e.method,
                confidence: e.confidence,
            }),
            adopted: self.adopted,
        }
    }
}

/// One row of the linked-graph export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntry {
    pub symbol: String,
    pub doc_type: DocType,
    pub title: String,
    pub base_symbol: Option<String>,
    pub link: Option<GraphLink>,
    pub adopted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub target: String,
    pub method: LinkMethod,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(symbol: &str, doc_type: DocType) -> ClassifiedDocument {
        ClassifiedDocument {
            document: StructuredDocument {
                symbol: symbol.into(),
                title: "Oceans and the law of the sea".into(),
                ..Default::default()
            },
            doc_type,
            base_symbol: None,
        }
    }

    #[test]
    fn doc_type_str_roundtrip() {
        for t in DocType::ALL {
            assert_eq!(t.as_str().parse::<DocType>().unwrap(), t);
        }
        assert!("memo".parse::<DocType>().is_err());
    }

    #[test]
    fn drafts_are_proposals_and_amendments() {
        assert!(DocType::Proposal.is_draft());
        assert!(DocType::Amendment.is_draft());
        assert!(!DocType::Resolution.is_draft());
        assert!(!DocType::Decision.is_draft());
    }

    #[test]
    fn fuzzy_confidence_is_clamped() {
        assert_eq!(LinkEdge::fuzzy("a", "b", 1.02).confidence, 1.0);
        assert_eq!(LinkEdge::explicit("a", "b").confidence, 1.0);
    }

    #[test]
    fn classified_document_json_is_flat() {
        let doc = classified("A/80/L.5", DocType::Proposal);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["symbol"], "A/80/L.5");
        assert_eq!(json["doc_type"], "proposal");
        assert!(json["base_symbol"].is_null());
    }

    #[test]
    fn entry_carries_edge() {
        let linked = LinkedDocument {
            classified: classified("A/RES/80/1", DocType::Resolution),
            outgoing_edge: Some(LinkEdge::fuzzy("A/RES/80/1", "A/80/L.5", 0.9)),
            adopted: false,
        };
        let entry = linked.to_entry();
        let link = entry.link.unwrap();
        assert_eq!(link.target, "A/80/L.5");
        assert_eq!(link.method, LinkMethod::Fuzzy);
        assert!((link.confidence - 0.9).abs() < 1e-12);
    }
}
