//! Title normalization and similarity.

use std::sync::LazyLock;

use regex::Regex;

/// Resolution number prefix, e.g. `80/60. `.
static NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+/\d+\.\s*").expect("valid regex"));

/// Case-folded, punctuation-stripped, whitespace-collapsed title with any
/// resolution number prefix removed.
pub fn normalize_title(title: &str) -> String {
    let stripped = NUMBER_PREFIX_RE.replace(title, "");
    let mut out = String::with_capacity(stripped.len());
    for word in stripped
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

/// Normalized Indel similarity of two already-normalized strings:
/// `2 * LCS / (len(a) + len(b))`, in `[0, 1]`. Counted in characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Similarity of two raw titles.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    similarity(&normalize_title(a), &normalize_title(b))
}

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &x in long {
        for (j, &y) in short.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}
