use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Placeholder written for any missing, empty or invalid value.
pub const SENTINEL: &str = "N/A";

/// Column separator used when one cell carries several joined values.
pub const SEPARATOR: char = '|';

/// True for characters in any Unicode punctuation category (Pc, Pd, Ps, Pe, Pi, Pf, Po).
pub fn is_punctuation(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
    )
}

/// Drop punctuation, keeping the `|` separator. The sentinel passes through untouched.
pub fn strip_punctuation(text: &str) -> String {
    if text == SENTINEL {
        return text.to_string();
    }
    text.chars()
        .filter(|&c| c == SEPARATOR || !is_punctuation(c))
        .collect()
}

/// NFD-decompose and drop combining marks: "Québec" -> "Quebec".
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|&c| !is_combining_mark(c)).collect()
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Empty, blank, or made only of punctuation.
pub fn is_blank_or_punctuation(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || is_punctuation(c))
}

/// `Some(trimmed)` for a meaningful value, `None` for blank or punctuation-only input.
pub fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if is_blank_or_punctuation(trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// Column name for the `index`-th value of a multi-valued field.
///
/// The first value keeps the bare name; later ones get a two-digit, 1-based
/// position suffix: `title`, `title_02`, `title_03`, ...
pub fn indexed_column(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{}_{:02}", base, index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_keeps_separator_and_symbols() {
        assert_eq!(strip_punctuation("A.B, (C) | D – E"), "AB C | D  E");
        assert_eq!(strip_punctuation("$100 + tax"), "$100 + tax");
    }

    #[test]
    fn sentinel_survives_punctuation_strip() {
        assert_eq!(strip_punctuation(SENTINEL), SENTINEL);
    }

    #[test]
    fn diacritics_are_reduced_to_base_letters() {
        assert_eq!(strip_diacritics("Québec Société Ñandú"), "Quebec Societe Nandu");
        assert_eq!(strip_diacritics("plain"), "plain");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank_or_punctuation(""));
        assert!(is_blank_or_punctuation(" . "));
        assert!(is_blank_or_punctuation("--"));
        assert!(!is_blank_or_punctuation("a."));
        assert_eq!(non_blank("  x  "), Some("x"));
        assert_eq!(non_blank(" . "), None);
    }

    #[test]
    fn indexed_columns_are_one_based_for_extras() {
        assert_eq!(indexed_column("title", 0), "title");
        assert_eq!(indexed_column("title", 1), "title_02");
        assert_eq!(indexed_column("type", 9), "type_10");
    }
}
