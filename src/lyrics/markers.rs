//! Section labels ("Chorus", "[Verse 2]", ...) that the API echoes back as if
//! they were sung words, and the line extraction built on top of them.

use super::encoding;

/// Section labels, lower-case.
pub const STRUCTURAL_MARKERS: &[&str] = &[
    "intro",
    "couplet",
    "verse",
    "chorus",
    "refrain",
    "bridge",
    "outro",
    "pre-chorus",
    "post-chorus",
    "interlude",
];

/// True when `s` is, or starts with, a section label (case-insensitive).
/// A leading `[` or `(` is ignored so bracketed labels match too.
pub fn is_structural(s: &str) -> bool {
    let lower = s
        .trim()
        .trim_start_matches(['[', '('])
        .to_lowercase();
    STRUCTURAL_MARKERS
        .iter()
        .any(|marker| lower.starts_with(marker))
}

/// Split authored lyrics into displayable lines.
///
/// The text is normalized first. Blank lines, section labels and lines of
/// `min_chars` characters or fewer are dropped; order is preserved.
pub fn lyric_lines(text: &str, min_chars: usize) -> Vec<String> {
    let text = encoding::normalize(text);
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !is_structural(line) && line.chars().count() > min_chars)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_structural() {
        assert!(is_structural("Chorus"));
        assert!(is_structural("  VERSE 2 "));
        assert!(is_structural("pre-chorus"));
        assert!(is_structural("interlude:"));
        assert!(!is_structural("Hello world"));
        assert!(is_structural("[Chorus]"));
        assert!(is_structural("(bridge x2)"));
        assert!(!is_structural("[Hello]"));
        assert!(!is_structural(""));
    }

    #[test]
    fn test_lyric_lines_filters_labels_and_short_lines() {
        let text = "Verse\n\nHello world\n  oh \nChorus 1\nGoodbye now\r\n";
        assert_eq!(lyric_lines(text, 3), vec!["Hello world", "Goodbye now"]);
    }

    #[test]
    fn test_lyric_lines_repairs_encoding() {
        assert_eq!(lyric_lines("Ã©tÃ© indien", 3), vec!["été indien"]);
    }

    #[test]
    fn test_lyric_lines_keeps_order() {
        let text = "third line here\nfirst line here\nsecond line here";
        assert_eq!(
            lyric_lines(text, 3),
            vec!["third line here", "first line here", "second line here"]
        );
    }
}
