//! Text normalization and edit-distance alignment
//!
//! Texts are compared after lowercasing and collapsing whitespace. Two
//! texts align when their Levenshtein distance, divided by the length of
//! the longer text, is within a tolerance.

/// Lowercase and collapse runs of whitespace into single spaces
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Levenshtein distance of the normalized texts over the longer length
///
/// Two empty texts have ratio 0.
#[must_use]
pub fn distance_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    ratio(&a, &b)
}

fn ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    strsim::levenshtein(a, b) as f64 / longest as f64
}

/// Whether two texts correspond under `tolerance`
#[inline]
#[must_use]
pub fn aligned(a: &str, b: &str, tolerance: f64) -> bool {
    distance_ratio(a, b) <= tolerance
}

/// Closest candidate within `tolerance`
///
/// Returns the index and ratio of the candidate with minimal distance;
/// ties go to the earliest candidate. `None` candidates are skipped.
#[must_use]
pub fn best_match<'a, I>(text: &str, candidates: I, tolerance: f64) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let text = normalize(text);
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let Some(candidate) = candidate else {
            continue;
        };
        let r = ratio(&text, &normalize(candidate));
        if r <= tolerance && best.map_or(true, |(_, b)| r < b) {
            best = Some((index, r));
        }
    }
    best
}

/// Normalized Damerau-Levenshtein similarity in `[0, 1]`
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_damerau_levenshtein(&normalize(a), &normalize(b))
}

/// Whitespace-free edit-distance ratio used for source text integrity
#[must_use]
pub fn compact_ratio(a: &str, b: &str) -> f64 {
    let compact = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    ratio(&compact(a), &compact(b))
}

/// Split text into sentences at `.`, `!` and `?` followed by whitespace
#[must_use]
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |(_, next)| next.is_whitespace()) {
            let end = i + c.len_utf8();
            out.push(text[start..end].trim());
            start = end;
        }
    }
    out.push(text[start..].trim());
    out.retain(|s| !s.is_empty());
    out
}

/// Shorten text to at most `width` characters for messages
#[must_use]
pub fn shorten(text: &str, width: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }
    let mut short: String = collapsed.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalization() {
        assert_eq!(normalize("  The Sky\n is   BLUE. "), "the sky is blue.");
    }

    #[test]
    fn tolerance_decides_alignment() {
        assert!(aligned("the sky is blue", "The sky is blue.", 0.1));
        assert!(!aligned("the sky is blue", "The sky is blue.", 0.01));
        assert_eq!(distance_ratio("", ""), 0.0);
    }

    #[test]
    fn best_match_prefers_minimal_then_earliest() {
        let candidates = [Some("the sky is blue!"), None, Some("the sky is blue."), Some("grass is green")];
        assert_eq!(best_match("The sky is blue.", candidates, 0.1), Some((2, 0.0)));
        let tied = [Some("abcd"), Some("abcd")];
        assert_eq!(best_match("abcd", tied, 0.1).map(|(i, _)| i), Some(0));
        assert_eq!(best_match("xyz", [Some("abc")], 0.1), None);
    }

    #[test]
    fn sentence_splitting() {
        assert_eq!(
            sentences("First one. Second? Third!  And v1.2 stays"),
            vec!["First one.", "Second?", "Third!", "And v1.2 stays"]
        );
        assert!(sentences("   ").is_empty());
    }

    #[test]
    fn compact_ratio_ignores_whitespace() {
        assert_eq!(compact_ratio("a b\nc", "abc"), 0.0);
        assert!(compact_ratio("abc", "abd") > 0.3);
    }

    #[test]
    fn shortening() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("a rather long sentence", 10), "a rathe...");
    }

    proptest! {
        #[test]
        fn ratio_is_symmetric_and_bounded(a in "[a-c ]{0,12}", b in "[a-c ]{0,12}") {
            let r = distance_ratio(&a, &b);
            prop_assert!((0.0..=1.0).contains(&r));
            prop_assert_eq!(r, distance_ratio(&b, &a));
        }

        #[test]
        fn similarity_is_bounded(a in "[a-z ]{0,16}", b in "[a-z ]{0,16}") {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
