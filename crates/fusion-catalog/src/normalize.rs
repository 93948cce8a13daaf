//! Entity name normalization and similarity.

use rapidfuzz::fuzz;

/// Normalize a raw entity name for matching.
///
/// Lowercases and drops every character that is not alphanumeric or `_`, so
/// `"Mr. Fox-Bear"` and `"mr foxbear"` collapse to the same key.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Indel similarity of two names, rounded to a whole number on a 0..=100 scale.
///
/// Scores `2 * matches / (len_a + len_b)`, so a name contained in a longer
/// one still scores by its share of both lengths: `"bear"` vs `"polarbear"`
/// is 62.
pub fn similarity(a: &str, b: &str) -> f64 {
    (fuzz::ratio(a.chars(), b.chars()) * 100.0).round_ties_even()
}
