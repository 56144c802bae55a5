//! Sort key normalisation for UN document symbols.
//!
//! Symbols mix text and counters (`A/80/L.2`, `A/80/L.10`, `A/C.3/78/L.23/Rev.1`),
//! so plain string order puts `L.10` before `L.2`. The key zero-pads every
//! digit run so that `ORDER BY sort_key` recovers natural order.
//!
//! - Digit runs: padded to 6 digits (`80` → `000080`)
//! - Everything else: upper-cased, kept as-is
//! - A revision sorts directly after its base draft (`L.5` < `L.5/REV.1` < `L.6`)

const DIGIT_WIDTH: usize = 6;

/// Normalise a symbol into a lexicographically-sortable string.
///
/// Input: `A/80/L.10`
/// Output: `A/000080/L.000010`
pub fn symbol_sort_key(symbol: &str) -> String {
    let upper = symbol.trim().to_ascii_uppercase();
    let mut key = String::with_capacity(upper.len() + 16);
    let mut digits = String::new();

    for c in upper.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        flush_digits(&mut key, &mut digits);
        key.push(c);
    }
    flush_digits(&mut key, &mut digits);
    key
}

fn flush_digits(key: &mut String, digits: &mut String) {
    if digits.is_empty() {
        return;
    }
    // Leading zeros carry no order information.
    let trimmed = digits.trim_start_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
    for _ in trimmed.len()..DIGIT_WIDTH {
        key.push('0');
    }
    key.push_str(trimmed);
    digits.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: assert a list of inputs produces sort keys in strictly ascending order.
    fn assert_sorted_order(inputs: &[&str]) {
        let keys: Vec<String> = inputs.iter().map(|s| symbol_sort_key(s)).collect();
        for i in 1..keys.len() {
            assert!(
                keys[i - 1] < keys[i],
                "Expected {:?} ({}) < {:?} ({})",
                inputs[i - 1],
                keys[i - 1],
                inputs[i],
                keys[i],
            );
        }
    }

    #[test]
    fn plain_numeric_sequence() {
        assert_sorted_order(&["A/80/L.1", "A/80/L.2", "A/80/L.9", "A/80/L.10", "A/80/L.100"]);
    }

    #[test]
    fn sessions_order_numerically() {
        assert_sorted_order(&["A/RES/9/1", "A/RES/79/1", "A/RES/80/1", "A/RES/100/1"]);
    }

    #[test]
    fn revision_follows_base() {
        assert_sorted_order(&["A/80/L.5", "A/80/L.5/REV.1", "A/80/L.5/REV.2", "A/80/L.6"]);
    }

    #[test]
    fn committee_drafts() {
        assert_sorted_order(&["A/C.2/78/L.40", "A/C.3/78/L.2", "A/C.3/78/L.23"]);
    }

    #[test]
    fn exact_values() {
        assert_eq!(symbol_sort_key("A/80/L.10"), "A/000080/L.000010");
        assert_eq!(symbol_sort_key("A/RES/80/142"), "A/RES/000080/000142");
        assert_eq!(symbol_sort_key("A/C.3/78/L.23/Rev.1"), "A/C.000003/000078/L.000023/REV.000001");
    }

    #[test]
    fn leading_zeros_ignored() {
        assert_eq!(symbol_sort_key("A/80/L.007"), symbol_sort_key("A/80/L.7"));
        assert_eq!(symbol_sort_key("A/80/L.0"), "A/000080/L.000000");
    }

    #[test]
    fn lowercase_normalised() {
        assert_eq!(symbol_sort_key("a/res/80/1"), symbol_sort_key("A/RES/80/1"));
    }

    #[test]
    fn whitespace_trimmed() {
        assert_eq!(symbol_sort_key("  A/80/L.1  "), symbol_sort_key("A/80/L.1"));
    }

    #[test]
    fn empty_string() {
        assert_eq!(symbol_sort_key(""), "");
    }
}
