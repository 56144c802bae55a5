//! Ordered classification rule table.
//!
//! Rules are evaluated top to bottom and the first rule whose conditions all
//! hold decides the [`DocType`]. Symbol rules come first; content rules only
//! catch documents with non-standard symbols.

use mandate_core::DocType;
use mandate_core::StructuredDocument;
use mandate_core::symbol::{is_draft_symbol, is_revision_like};
use regex::Regex;

/// One test a rule applies to a document.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A `/`-separated segment of the symbol equals this (case-insensitive).
    SymbolSegment(&'static str),
    /// `.../L.<n>` draft symbol, revised or not.
    DraftSymbol,
    /// Revision, addendum or corrigendum of a draft.
    RevisionSymbol,
    /// Matches the opening text: title plus first paragraph.
    Opening(Regex),
}

impl Condition {
    /// Build an [`Condition::Opening`] from a pattern known to be valid.
    pub fn opening(pattern: &str) -> Self {
        Self::Opening(Regex::new(pattern).expect("valid regex"))
    }

    fn holds(&self, doc: &StructuredDocument, opening: &str) -> bool {
        match self {
            Self::SymbolSegment(segment) => doc
                .symbol
                .split('/')
                .any(|s| s.trim().eq_ignore_ascii_case(segment)),
            Self::DraftSymbol => is_draft_symbol(&doc.symbol),
            Self::RevisionSymbol => is_draft_symbol(&doc.symbol) && is_revision_like(&doc.symbol),
            Self::Opening(re) => re.is_match(opening),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    /// Short name, logged with each decision.
    pub name: &'static str,
    pub doc_type: DocType,
    /// All must hold.
    pub all_of: Vec<Condition>,
}

impl Rule {
    pub fn new(name: &'static str, doc_type: DocType, all_of: Vec<Condition>) -> Self {
        Self {
            name,
            doc_type,
            all_of,
        }
    }

    fn matches(&self, doc: &StructuredDocument, opening: &str) -> bool {
        self.all_of.iter().all(|c| c.holds(doc, opening))
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The UN symbol conventions.
    ///
    /// | # | rule                  | type       |
    /// |---|-----------------------|------------|
    /// | 1 | `/RES/` segment       | resolution |
    /// | 2 | `/DEC/` segment       | decision   |
    /// | 3 | revised draft         | amendment  |
    /// | 4 | draft + "amendment"   | amendment  |
    /// | 5 | draft                 | proposal   |
    /// | 6 | "80/60. " or "Resolution adopted by" opening | resolution |
    /// | 7 | "Decision adopted by" opening | decision |
    /// | 8 | "draft resolution/decision" opening | proposal |
    pub fn standard() -> Self {
        use Condition::*;
        Self::new(vec![
            Rule::new("res-segment", DocType::Resolution, vec![SymbolSegment("RES")]),
            Rule::new("dec-segment", DocType::Decision, vec![SymbolSegment("DEC")]),
            Rule::new("draft-revision", DocType::Amendment, vec![RevisionSymbol]),
            Rule::new(
                "draft-amendment-text",
                DocType::Amendment,
                vec![DraftSymbol, Condition::opening(r"(?i)\bamendments?\b")],
            ),
            Rule::new("draft", DocType::Proposal, vec![DraftSymbol]),
            Rule::new(
                "resolution-text",
                DocType::Resolution,
                vec![Condition::opening(r"(?i)^\s*(?:\d+/\d+\.\s|resolution adopted by)")],
            ),
            Rule::new(
                "decision-text",
                DocType::Decision,
                vec![Condition::opening(r"(?i)^\s*decision adopted by")],
            ),
            Rule::new(
                "draft-text",
                DocType::Proposal,
                vec![Condition::opening(r"(?i)\bdraft (?:resolution|decision)\b")],
            ),
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule, or `None` when the document is ambiguous.
    pub fn evaluate(&self, doc: &StructuredDocument) -> Option<&Rule> {
        let opening = opening_text(doc);
        self.rules.iter().find(|r| r.matches(doc, &opening))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Title followed by the first paragraph.
pub fn opening_text(doc: &StructuredDocument) -> String {
    match doc.paragraphs.first() {
        Some(first) if !doc.title.is_empty() => format!("{}\n{first}", doc.title),
        Some(first) => first.clone(),
        None => doc.title.clone(),
    }
}
