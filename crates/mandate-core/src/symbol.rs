//! UN document symbol helpers.
//!
//! Symbols look like `A/RES/80/142` (resolution), `A/80/L.12` (plenary draft),
//! `A/C.3/78/L.23/Rev.1` (committee draft, revised) or `A/DEC/80/501`.

use std::sync::LazyLock;

use regex::Regex;

/// `.../L.<n>` draft marker. Anchored at a segment boundary.
static DRAFT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|/)L\.\d+").expect("valid regex"));

/// Base draft of a revision, addendum or corrigendum.
static BASE_DRAFT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?/L\.\d+)/(?:REV|ADD|CORR)\.\d+").expect("valid regex")
});

static SESSION_RES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^A/(?:RES|DEC)/(\d+)").expect("valid regex"));
static SESSION_COMMITTEE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^A/C\.\d+/(\d+)/L\.").expect("valid regex"));
static SESSION_PLENARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^A/(\d+)/L\.").expect("valid regex"));

/// A draft symbol cited in running text, e.g. `A/C.3/78/L.23`.
static DRAFT_CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bA(?:/[A-Z0-9.]+)+/L\.\d+\b").expect("valid regex"));

const SUFFIX_MARKERS: &[&str] = &["/REV.", "/ADD.", "/CORR."];

/// Canonical form of a symbol found in free text.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// Filename stem for a symbol: `A/80/L.5` → `A_80_L.5`.
pub fn symbol_stem(symbol: &str) -> String {
    symbol.replace('/', "_")
}

/// Download filename for a symbol: `A/80/L.5` → `A_80_L.5.pdf`.
pub fn symbol_to_filename(symbol: &str) -> String {
    format!("{}.pdf", symbol_stem(symbol))
}

/// Inverse of [`symbol_stem`]. Strips a trailing `.pdf` or `.txt`.
pub fn filename_to_symbol(filename: &str) -> String {
    let stem = filename
        .strip_suffix(".pdf")
        .or_else(|| filename.strip_suffix(".txt"))
        .unwrap_or(filename);
    stem.replace('_', "/")
}

/// True for `.../L.<n>` symbols, revised or not.
pub fn is_draft_symbol(symbol: &str) -> bool {
    DRAFT_RE.is_match(symbol)
}

/// True for revisions, addenda and corrigenda of a draft.
pub fn is_revision_like(symbol: &str) -> bool {
    let upper = symbol.to_ascii_uppercase();
    SUFFIX_MARKERS.iter().any(|m| upper.contains(m))
}

/// `A/C.3/78/L.23/Rev.1` → `A/C.3/78/L.23`. `None` for unrevised symbols.
pub fn base_draft(symbol: &str) -> Option<String> {
    BASE_DRAFT_RE
        .captures(symbol.trim())
        .map(|c| normalize_symbol(&c[1]))
}

/// The series prefix of a draft, i.e. everything before `L.`:
/// `A/C.3/78/L.23` → `A/C.3/78/`. Drafts with equal prefixes belong to the
/// same session and committee.
pub fn draft_prefix(symbol: &str) -> Option<String> {
    let upper = normalize_symbol(symbol);
    let m = DRAFT_RE.find(&upper)?;
    // Keep the leading '/' of the match with the prefix.
    let end = if upper[m.start()..].starts_with('/') {
        m.start() + 1
    } else {
        m.start()
    };
    Some(upper[..end].to_string())
}

/// Draft symbols cited in `text`, upper-cased, unique, in order of appearance.
pub fn find_draft_citations(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in DRAFT_CITATION_RE.find_iter(text) {
        let symbol = normalize_symbol(m.as_str());
        if !found.contains(&symbol) {
            found.push(symbol);
        }
    }
    found
}

/// General Assembly session number encoded in the symbol.
pub fn derive_session(symbol: &str) -> Option<u32> {
    let upper = normalize_symbol(symbol);
    [&SESSION_RES_RE, &SESSION_COMMITTEE_RE, &SESSION_PLENARY_RE]
        .iter()
        .find_map(|re| re.captures(&upper))
        .and_then(|c| c[1].parse().ok())
}
