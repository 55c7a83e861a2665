//! Small string helpers shared by the extractors.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lowercase and strip diacritics: `"Départ"` → `"depart"`, `"København"` → `"københavn"`.
///
/// Only combining marks are removed, so letters such as `ø` and `æ` survive.
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim surrounding whitespace and trailing punctuation from a captured value.
pub fn clean_value(s: &str) -> String {
    s.trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '|'))
        .trim()
        .to_string()
}

/// Number of ASCII digits in `s`.
pub fn digit_count(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("Départ"), "depart");
        assert_eq!(fold("Arrivée"), "arrivee");
        assert_eq!(fold("Genève"), "geneve");
        assert_eq!(fold("København"), "københavn");
    }

    #[test]
    fn squash_collapses_runs() {
        assert_eq!(squash_whitespace("  a \t b\n\nc "), "a b c");
    }

    #[test]
    fn clean_value_trims_punctuation() {
        assert_eq!(clean_value(" Paris. "), "Paris");
        assert_eq!(clean_value("Lyon, |"), "Lyon");
    }

    #[test]
    fn digit_count_ignores_separators() {
        assert_eq!(digit_count("+33 6 12-34"), 7);
    }
}
