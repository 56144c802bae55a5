//! Structure extraction from document text.
//!
//! [`TextExtractor`] works on text already pulled out of the PDF (one `.txt`
//! per symbol). Binary input is rejected; plug a converter in behind the
//! [`Extractor`] trait to read PDFs directly.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use mandate_core::StructuredDocument;
use mandate_core::symbol::{find_draft_citations, normalize_symbol};
use regex::Regex;
use tracing::debug;

use crate::ExtractionError;

/// Turns the bytes of one source file into a [`StructuredDocument`].
pub trait Extractor: Send + Sync {
    fn extract(&self, symbol: &str, bytes: &[u8]) -> Result<StructuredDocument, ExtractionError>;
}

/// Extractor for UTF-8 plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn extract(&self, symbol: &str, bytes: &[u8]) -> Result<StructuredDocument, ExtractionError> {
        let binary = || ExtractionError::Binary {
            symbol: symbol.to_string(),
        };
        if bytes.starts_with(b"%PDF") {
            return Err(binary());
        }
        let text = std::str::from_utf8(bytes).map_err(|_| binary())?;
        extract_text(symbol, text)
    }
}

// ── Patterns ──

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static OPERATIVE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*(\d+)\.\s+(.*)$"));
static LETTERED_RE: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*\(([a-z])\)\s+(.*)$"));
static NUMBERED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*\d+\."));

/// `80/60. Title` on resolutions.
static RESOLUTION_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"^\d+/\d+\.\s+\S"));
static ADOPTED_BY_RE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)resolution adopted by"));
/// Sponsor line closing the header of a draft, e.g. `Chile: draft resolution`.
static DRAFT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)draft (?:resolution|decision)\s*$"));

static AGENDA_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(?:agenda items?|item)\s+(\d+[a-z]?)\b"));

static PLENARY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"\s*\d+(?:st|nd|rd|th)\s+(?:\(resumed\)\s+)?plenary\s+meeting\s+\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}\s*$")
});

/// Masthead lines that never belong to a title.
static HEADER_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^United Nations$",
        r"^General Assembly$",
        r"^Security Council$",
        r"^[A-Z]{1,2}/[A-Z0-9./-]+$",
        r"^Agenda items?\b",
        r"^Item\s+\d+",
        r"^\d{1,2}\s+\w+\s+\d{4}$",
        r"^Distr\.",
        r"^Original:",
        r"^\w+ session$",
        r"^(First|Second|Third|Fourth|Fifth|Sixth) Committee$",
        r"^\[on the report of",
        r"^\[without reference to",
        r".*on the basis of informal consultations",
    ]
    .iter()
    .map(|p| re(p))
    .collect()
});

/// Page footers: job numbers and barcodes.
static FOOTER_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"^(?:\d{2}-\d{4,5}(?:\s|$)|\*\d{6,}\*|GE\.\d{2}-\d+)"));

/// First line of the document body.
static BODY_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    re(concat!(
        r"^(?:The General Assembly|The Security Council|Recalling|Reaffirming|Noting",
        r"|Recognizing|Welcoming|Expressing|Bearing in mind|Having|Mindful|Concerned",
        r"|Convinced|Guided by|Taking note|Pursuant to",
        r"|In operative paragraph|In paragraph|Insert|Replace|Delete)\b"
    ))
});

fn is_header(line: &str) -> bool {
    HEADER_RES.iter().any(|r| r.is_match(line))
}

// ── Extraction ──

/// Extract a [`StructuredDocument`] from plain text.
pub fn extract_text(symbol: &str, text: &str) -> Result<StructuredDocument, ExtractionError> {
    if text.trim().is_empty() {
        return Err(ExtractionError::Empty {
            symbol: symbol.to_string(),
        });
    }

    let lines: Vec<&str> = text.lines().collect();
    let title = extract_title(&lines);

    let mut paragraphs = marked_paragraphs(&lines, &OPERATIVE_RE);
    if paragraphs.is_empty() {
        paragraphs = marked_paragraphs(&lines, &LETTERED_RE);
    }
    if paragraphs.is_empty() {
        paragraphs.extend(body_paragraph(&lines));
    }

    if title.is_empty() && paragraphs.is_empty() {
        return Err(ExtractionError::NoContent {
            symbol: symbol.to_string(),
        });
    }

    let own = normalize_symbol(symbol);
    let symbol_refs: BTreeSet<String> = find_draft_citations(text)
        .into_iter()
        .filter(|s| *s != own)
        .collect();
    let agenda_refs = agenda_items(text);

    debug!(
        symbol,
        paragraphs = paragraphs.len(),
        agenda = agenda_refs.len(),
        refs = symbol_refs.len(),
        "extracted"
    );

    Ok(StructuredDocument {
        symbol: symbol.to_string(),
        title,
        paragraphs,
        agenda_refs,
        symbol_refs,
    })
}

/// Title of a resolution (`80/60. ...`) or draft (the lines after the
/// sponsor line). Empty when nothing title-like precedes the first operative
/// paragraph.
pub fn extract_title(lines: &[&str]) -> String {
    let stop_at = lines
        .iter()
        .position(|l| NUMBERED_LINE_RE.is_match(l) || LETTERED_RE.is_match(l))
        .unwrap_or(lines.len());
    let head = &lines[..stop_at];

    if let Some(adopted) = head.iter().position(|l| ADOPTED_BY_RE.is_match(l)) {
        let mut parts: Vec<&str> = Vec::new();
        for line in head[adopted + 1..].iter().map(|l| l.trim()) {
            if parts.is_empty() {
                if RESOLUTION_TITLE_RE.is_match(line) {
                    parts.push(line);
                }
                continue;
            }
            if line.is_empty() || BODY_START_RE.is_match(line) {
                break;
            }
            parts.push(line);
        }
        if !parts.is_empty() {
            return parts.join(" ");
        }
    }

    let start_at = head
        .iter()
        .position(|l| DRAFT_LINE_RE.is_match(l.trim()))
        .map_or(0, |i| i + 1);

    let mut parts: Vec<&str> = Vec::new();
    for line in head[start_at..].iter().map(|l| l.trim()) {
        if line.is_empty() {
            if parts.is_empty() {
                continue;
            }
            break;
        }
        if RESOLUTION_TITLE_RE.is_match(line) {
            return line.to_string();
        }
        if is_header(line) || FOOTER_RE.is_match(line) {
            continue;
        }
        if BODY_START_RE.is_match(line) {
            break;
        }
        parts.push(line);
    }
    parts.join(" ")
}

/// Paragraphs opened by `marker` (`1.` or `(a)`), continuing until the next
/// marker. Text before the first marker is ignored.
fn marked_paragraphs(lines: &[&str], marker: &Regex) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Option<String> = None;

    for line in lines {
        if let Some(caps) = marker.captures(line) {
            if let Some(done) = current.take() {
                push_cleaned(&mut out, &done);
            }
            current = Some(caps[2].to_string());
        } else if let Some(text) = current.as_mut() {
            let line = line.trim();
            if !line.is_empty() && !FOOTER_RE.is_match(line) {
                text.push(' ');
                text.push_str(line);
            }
        }
    }
    if let Some(done) = current {
        push_cleaned(&mut out, &done);
    }
    out
}

/// Whole body as one paragraph, for documents without numbered paragraphs
/// (amendments mostly). `None` when under 20 characters.
fn body_paragraph(lines: &[&str]) -> Option<String> {
    let start = lines
        .iter()
        .position(|l| BODY_START_RE.is_match(l.trim()))
        .unwrap_or(0);

    let body: Vec<&str> = lines[start..]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !is_header(l) && !FOOTER_RE.is_match(l))
        .collect();
    let text = clean(&body.join(" "));
    (text.chars().count() >= 20).then_some(text)
}

fn push_cleaned(out: &mut Vec<String>, raw: &str) {
    let text = clean(raw);
    if !text.is_empty() {
        out.push(text);
    }
}

fn clean(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    PLENARY_SUFFIX_RE.replace(&collapsed, "").trim_end().to_string()
}

/// Agenda item numbers, e.g. `70`, `12A`.
pub fn agenda_items(text: &str) -> BTreeSet<String> {
    AGENDA_RE
        .captures_iter(text)
        .map(|c| c[1].to_ascii_uppercase())
        .collect()
}
