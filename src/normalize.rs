//! Text normalization used by every name and title comparison.
//!
//! All fuzzy matching in this crate goes through [`normalize`]: names are
//! compared case-insensitively, without accents, and with hyphens treated as
//! spaces, so that "Éric-Paul" and "eric paul" compare equal.

use moka::sync::Cache;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Bounded memoization of [`normalize`]; every name-pair comparison funnels
/// through it, and roster names repeat for every fetched record.
static NORMALIZE_CACHE: LazyLock<Cache<String, String>> =
    LazyLock::new(|| Cache::new(1024));

static MIDDLE_INITIAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s[A-Za-z]\.?\s").unwrap());

/// Canonicalize a display name for comparison.
///
/// Steps, in order: trim leading/trailing whitespace, replace hyphens with
/// spaces, lower-case, transliterate Latin diacritics to ASCII ("é" → "e",
/// "ç" → "c"). Idempotent: `normalize(normalize(s)) == normalize(s)`.
///
/// # Examples
///
/// ```
/// use refsearch::normalize::normalize;
///
/// assert_eq!(normalize("Éric-Paul"), "eric paul");
/// assert_eq!(normalize("  Françoise  "), "francoise");
/// ```
pub fn normalize(s: &str) -> String {
    s.trim()
        .replace('-', " ")
        .to_lowercase()
        .chars()
        .map(replace_non_decomposing)
        .collect::<String>()
        // NFD splits accented letters into base + combining marks,
        // which are then dropped
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Memoizing wrapper around [`normalize`].
pub fn normalize_cached(s: &str) -> String {
    if let Some(hit) = NORMALIZE_CACHE.get(s) {
        return hit;
    }
    let normalized = normalize(s);
    NORMALIZE_CACHE.insert(s.to_string(), normalized.clone());
    normalized
}

/// Canonicalize a title for use as a deduplication merge key:
/// case-folded with runs of whitespace collapsed to single spaces.
///
/// Near-duplicate titles differing in punctuation do not merge; only
/// case and whitespace are forgiven.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a single middle initial ("John A. Smith" → "John Smith").
pub fn remove_middle_initial(full_name: &str) -> String {
    MIDDLE_INITIAL_REGEX.replace_all(full_name, " ").to_string()
}

/// Letters that are distinct code points rather than base + combining mark,
/// so NFD leaves them untouched.
fn replace_non_decomposing(c: char) -> char {
    match c {
        'ł' => 'l',
        'ø' => 'o',
        'æ' => 'a',
        'å' => 'a',
        'ð' => 'd',
        'þ' => 't',
        'đ' => 'd',
        'ı' => 'i',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Éric-Paul", "eric paul")]
    #[case("eric paul", "eric paul")]
    #[case("  Charette  ", "charette")]
    #[case("François", "francois")]
    #[case("Gonçalves", "goncalves")]
    #[case("MÜLLER", "muller")]
    #[case("Jean-François Le-Blanc", "jean francois le blanc")]
    #[case("Łukasz", "lukasz")]
    // Marks outside the basic diacritics block, e.g. Cyrillic titlo.
    #[case("с\u{0483}ава", "сава")]
    #[case("", "")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[rstest]
    #[case("Éric-Paul")]
    #[case("P. Charette (CA)")]
    #[case("van der Valk, J P M")]
    fn test_normalize_idempotent(#[case] input: &str) {
        let once = normalize(input);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalize_cached_agrees_with_normalize() {
        for s in ["Éric-Paul", "Charette", "Éric-Paul"] {
            assert_eq!(normalize_cached(s), normalize(s));
        }
    }

    #[rstest]
    #[case("A  Study of\tThings", "a study of things")]
    #[case("A Study of Things", "a study of things")]
    #[case("A study, of things!", "a study, of things!")]
    fn test_normalize_title(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_title(input), expected);
    }

    #[rstest]
    #[case("John A. Smith", "John Smith")]
    #[case("John A Smith", "John Smith")]
    #[case("John Smith", "John Smith")]
    fn test_remove_middle_initial(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(remove_middle_initial(input), expected);
    }
}
