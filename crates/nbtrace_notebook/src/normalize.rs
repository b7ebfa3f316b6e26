//! Line normalization for content matching.
//!
//! Cells have no stable key other than their text, so logged content and
//! notebook source must be compared through exactly one normalization. Every
//! comparison site in the workspace goes through [`lines_match`].

use std::fmt::Write as _;

/// Normalize one line for comparison.
///
/// Characters outside ASCII are replaced by a backslash escape (`\xNN`,
/// `\uNNNN` or `\UNNNNNNNN`), then surrounding whitespace is trimmed. Escaping
/// first means a non-ASCII space at a line edge is kept as an escape, not
/// trimmed away.
#[must_use]
pub fn normalize_line(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len());
    for ch in line.chars() {
        let code = u32::from(ch);
        if ch.is_ascii() {
            escaped.push(ch);
        } else if code <= 0xff {
            let _ = write!(escaped, "\\x{code:02x}");
        } else if code <= 0xffff {
            let _ = write!(escaped, "\\u{code:04x}");
        } else {
            let _ = write!(escaped, "\\U{code:08x}");
        }
    }
    escaped.trim().to_string()
}

/// True when both sides have the same number of lines and every pair of
/// lines is equal after normalization.
#[must_use]
pub fn lines_match<A, B>(left: &[A], right: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(l, r)| normalize_line(l.as_ref()) == normalize_line(r.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ascii_is_trimmed_only() {
        assert_eq!(normalize_line("  x = 1\n"), "x = 1");
    }

    #[test]
    fn test_non_ascii_escaped() {
        assert_eq!(normalize_line("café"), "caf\\xe9");
        assert_eq!(normalize_line("it’s"), "it\\u2019s");
        assert_eq!(normalize_line("🙂"), "\\U0001f642");
    }

    #[test]
    fn test_escaped_text_matches_its_source() {
        // A log that already carries the escape compares equal to the raw char
        assert_eq!(normalize_line("caf\\xe9"), normalize_line("café"));
    }

    #[test]
    fn test_lines_match_requires_same_count() {
        assert!(lines_match(&["a\n", "b"], &["a", "b "]));
        assert!(!lines_match(&["a"], &["a", ""]));
        assert!(!lines_match(&["a", "b"], &["a", "c"]));
    }

    proptest! {
        #[test]
        fn prop_trailing_whitespace_never_matters(
            lines in proptest::collection::vec("[ -~]{0,20}", 1..6),
            pads in proptest::collection::vec("[ \t]{0,3}\n?", 1..6),
        ) {
            let padded: Vec<String> = lines
                .iter()
                .zip(pads.iter().cycle())
                .map(|(l, p)| format!("{l}{p}"))
                .collect();
            prop_assert!(lines_match(&lines, &padded));
        }

        #[test]
        fn prop_normalized_is_ascii(line in "\\PC{0,30}") {
            prop_assert!(normalize_line(&line).is_ascii());
        }
    }
}
