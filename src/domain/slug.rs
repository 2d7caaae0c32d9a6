//! URL slugs for matches and fixtures.

use unicode_normalization::UnicodeNormalization;

/// Lowercase, decompose (NFD), drop combining marks in U+0300..=U+036F, then
/// collapse anything outside `[a-z0-9]` into a single dash and trim dashes
/// from both ends.
///
/// Letters without a decomposition (`ø`, `ß`, `ł`) become separators.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    let lowered = text.to_lowercase();
    for c in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }

    out
}

const fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036f}')
}

/// `{home}-vs-{away}-{yyyymmdd}` where `date` is `YYYY-MM-DD`.
#[must_use]
pub fn fixture_slug(home: &str, away: &str, date: &str) -> String {
    format!(
        "{}-vs-{}-{}",
        slugify(home),
        slugify(away),
        date.replace('-', "")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Manchester United"), "manchester-united");
        assert_eq!(slugify("  --Paris Saint-Germain-- "), "paris-saint-germain");
        assert_eq!(slugify("A.C. Milan"), "a-c-milan");
    }

    #[test]
    fn test_slugify_strips_diacritics() {
        assert_eq!(slugify("Atlético Madrid"), "atletico-madrid");
        assert_eq!(slugify("Bayern München"), "bayern-munchen");
        assert_eq!(slugify("Beşiktaş"), "besiktas");
    }

    #[test]
    fn test_slugify_decomposed_input() {
        assert_eq!(slugify("Ame\u{0301}rica Mineiro"), "america-mineiro");
        assert_eq!(slugify("Ame\u{0301}rica"), slugify("Am\u{e9}rica"));
    }

    #[test]
    fn test_slugify_letters_without_decomposition() {
        assert_eq!(slugify("Bodø/Glimt"), "bod-glimt");
        assert_eq!(slugify("Łódź"), "odz");
        assert_eq!(slugify("Großkrotzenburg"), "gro-krotzenburg");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_fixture_slug() {
        assert_eq!(
            fixture_slug("Real Madrid", "FC Barcelona", "2026-03-14"),
            "real-madrid-vs-fc-barcelona-20260314"
        );
    }
}
