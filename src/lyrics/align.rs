//! Word-to-line alignment.
//!
//! The API reports a stream of timed words that rarely maps one-to-one onto
//! the lines the user wrote: words get merged, split or misheard, and
//! section labels are echoed as words. Each authored line claims a run of
//! words by loose text matching; a line that cannot claim enough words gets
//! an even share of what is left so one bad line cannot desynchronize the
//! rest. Line order and text always come from the authored lyrics.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info, warn};

use super::encoding;
use super::markers;
use super::response::{AlignedWord, TimedLyricsResponse};

/// Heuristic knobs of the aligner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignParams {
    /// Fraction of a line's words that must be matched to accept the run.
    pub min_match_ratio: f64,
    /// Stop scanning after `scan_factor * words_in_line` tokens.
    pub scan_factor: usize,
    /// Every segment is padded to at least this many seconds.
    pub min_segment_secs: f64,
    /// Slot length for lines that get no timing from the API.
    pub estimated_line_secs: f64,
    /// Lines of this many characters or fewer are not lyrics.
    pub min_line_chars: usize,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            min_match_ratio: 0.3,
            scan_factor: 3,
            min_segment_secs: 2.0,
            estimated_line_secs: 3.0,
            min_line_chars: 3,
        }
    }
}

/// A usable, normalized word with non-negative, ordered timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct WordToken {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl WordToken {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        let start = start.max(0.0);
        Self {
            text: text.into(),
            start,
            end: end.max(start),
        }
    }
}

/// How a segment got its timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Enough of the line's words were found in the word stream.
    Matched,
    /// Too few matches; the line got an even share of the remaining words.
    Distributed,
    /// No words at all; timing is synthetic.
    Estimated,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Distributed => "distributed",
            Self::Estimated => "estimated",
        }
    }
}

/// One timed lyric line ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: Confidence,
}

/// Why an alignment produced nothing to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// No `data` in the response and no authored lyrics to estimate from.
    MissingPayload,
    /// `data` present but `alignedWords` empty or absent.
    NoAlignedWords,
    /// Every word was unrecognized, blank or a section label.
    NoUsableWords,
    /// Neither the caller nor the response supplied lyrics text.
    NoLyrics,
    /// The lyrics contained no displayable line.
    NoUsableLyricLines,
}

impl EmptyReason {
    pub fn describe(self) -> &'static str {
        match self {
            Self::MissingPayload => "response has no data and no lyrics to estimate from",
            Self::NoAlignedWords => "response has no aligned words",
            Self::NoUsableWords => "no usable words after filtering",
            Self::NoLyrics => "no lyrics text available",
            Self::NoUsableLyricLines => "no lyric lines after filtering",
        }
    }
}

/// Result of aligning one timed-lyrics response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "segments", rename_all = "snake_case")]
pub enum Alignment {
    /// Timing comes from the API's word stream.
    Aligned(Vec<Segment>),
    /// The API gave no timing; every line has a synthetic slot.
    Estimated(Vec<Segment>),
    Empty(EmptyReason),
}

impl Alignment {
    pub fn segments(&self) -> &[Segment] {
        match self {
            Self::Aligned(s) | Self::Estimated(s) => s,
            Self::Empty(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Aligned(_) => "aligned",
            Self::Estimated(_) => "estimated",
            Self::Empty(_) => "empty",
        }
    }
}

/// Turn a timed-lyrics response plus the authored lyrics into segments.
///
/// `original` takes precedence over the response's own `lyrics` field. A
/// response without `data` (credit errors) falls back to estimated timing
/// from `original`; a response with `data` but no words yields nothing.
pub fn parse_lyrics_timing(
    response: &TimedLyricsResponse,
    original: Option<&str>,
    params: &AlignParams,
) -> Alignment {
    let original = original.filter(|s| !s.trim().is_empty());

    let Some(data) = response.data.as_ref() else {
        warn!(msg = response.error_message(), "timed lyrics unavailable");
        return match original {
            Some(text) => estimate_from_lyrics(text, params),
            None => Alignment::Empty(EmptyReason::MissingPayload),
        };
    };

    let words = response.aligned_words();
    if words.is_empty() {
        return Alignment::Empty(EmptyReason::NoAlignedWords);
    }
    debug!(count = words.len(), "processing aligned words");

    let tokens = clean_tokens(words);
    if tokens.is_empty() {
        return Alignment::Empty(EmptyReason::NoUsableWords);
    }

    let Some(text) = original.or(data.lyrics.as_deref().filter(|s| !s.trim().is_empty())) else {
        return Alignment::Empty(EmptyReason::NoLyrics);
    };

    let lines = markers::lyric_lines(text, params.min_line_chars);
    if lines.is_empty() {
        return Alignment::Empty(EmptyReason::NoUsableLyricLines);
    }

    let segments = align_lines(&tokens, &lines, params);
    info!(
        words = tokens.len(),
        lines = lines.len(),
        "aligned lyrics"
    );
    Alignment::Aligned(segments)
}

/// Synthetic timing: line `i` occupies `[i * slot, (i + 1) * slot)`.
pub fn estimate_from_lyrics(text: &str, params: &AlignParams) -> Alignment {
    let lines = markers::lyric_lines(text, params.min_line_chars);
    if lines.is_empty() {
        return Alignment::Empty(EmptyReason::NoUsableLyricLines);
    }

    let slot = params.estimated_line_secs;
    let segments = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let start = i as f64 * slot;
            let end = pad_end(start, start + slot, params.min_segment_secs);
            Segment {
                start,
                end,
                text,
                confidence: Confidence::Estimated,
            }
        })
        .collect::<Vec<_>>();
    info!(lines = segments.len(), "estimated lyric timing");
    Alignment::Estimated(segments)
}

/// Drop unrecognized, blank and section-label words; repair encoding.
pub fn clean_tokens(words: &[AlignedWord]) -> Vec<WordToken> {
    words
        .iter()
        .filter(|w| w.success.unwrap_or(true))
        .filter_map(|w| {
            let raw = w.word.as_deref()?;
            let text = encoding::normalize(raw).replace(['\r', '\n'], " ");
            let text = text.trim();
            if text.is_empty() || markers::is_structural(text) {
                return None;
            }
            Some(WordToken::new(
                text,
                w.start_s.unwrap_or(0.0),
                w.end_s.unwrap_or(0.0),
            ))
        })
        .collect()
}

/// Words a line claimed and how far the word stream was consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAssignment {
    /// Tokens no later line may use.
    pub consumed: Range<usize>,
    /// First and last token (inclusive) that time the line.
    pub timed_by: Option<(usize, usize)>,
    pub confidence: Confidence,
}

/// Align every line, threading the token cursor from one line to the next.
pub fn align_lines(tokens: &[WordToken], lines: &[String], params: &AlignParams) -> Vec<Segment> {
    let (segments, _) = lines.iter().enumerate().fold(
        (Vec::with_capacity(lines.len()), 0usize),
        |(mut segments, cursor), (idx, line)| {
            let (assignment, next) =
                assign_line(tokens, line, cursor, lines.len() - idx, params);
            let prev_end = segments.last().map(|s: &Segment| s.end);
            let segment = build_segment(tokens, line, idx, &assignment, prev_end, params);
            debug!(
                line = idx + 1,
                start = segment.start,
                end = segment.end,
                words = assignment.consumed.len(),
                confidence = segment.confidence.label(),
                "line timing"
            );
            segments.push(segment);
            (segments, next)
        },
    );
    segments
}

/// Claim tokens for one line starting at `cursor`.
///
/// `remaining_lines` counts this line and every line after it. Returns the
/// assignment and the cursor for the next line.
pub fn assign_line(
    tokens: &[WordToken],
    line: &str,
    cursor: usize,
    remaining_lines: usize,
    params: &AlignParams,
) -> (LineAssignment, usize) {
    let cursor = cursor.min(tokens.len());
    let targets = line
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>();

    let (matched, scan_end) = scan_matches(tokens, &targets, cursor, params.scan_factor);

    if matched.len() as f64 >= targets.len() as f64 * params.min_match_ratio {
        let assignment = LineAssignment {
            consumed: cursor..scan_end,
            timed_by: matched.first().zip(matched.last()).map(|(a, b)| (*a, *b)),
            confidence: Confidence::Matched,
        };
        return (assignment, scan_end);
    }

    // Low confidence: even share of what is left, earliest lines take the
    // remainder.
    let remaining = tokens.len() - cursor;
    let lines = remaining_lines.max(1);
    let take = remaining / lines + usize::from(remaining % lines > 0);
    let end = cursor + take;
    debug!(line, matched = matched.len(), take, "low-confidence match, distributing");

    let assignment = LineAssignment {
        consumed: cursor..end,
        timed_by: (take > 0).then(|| (cursor, end - 1)),
        confidence: Confidence::Distributed,
    };
    (assignment, end)
}

/// Walk the token stream matching `targets` in order.
///
/// A token may match any target word not yet matched, so a word the API
/// dropped does not block the rest of the line. Each hit counts once.
/// Returns the indices of matched tokens and the index one past the last
/// token examined.
fn scan_matches(
    tokens: &[WordToken],
    targets: &[String],
    cursor: usize,
    scan_factor: usize,
) -> (Vec<usize>, usize) {
    let limit = targets.len() * scan_factor;
    let mut matched = Vec::new();
    let mut pos = cursor;

    while pos < tokens.len() && matched.len() < targets.len() {
        let word = match_key(&tokens[pos].text);
        if targets[matched.len()..].iter().any(|t| words_match(&word, t)) {
            matched.push(pos);
        }
        pos += 1;
        if pos - cursor > limit {
            break;
        }
    }

    (matched, pos)
}

fn match_key(text: &str) -> String {
    text.to_lowercase()
        .trim_matches(['.', ',', '!', '?', ';', ':'])
        .to_string()
}

/// Loose comparison: either word contains the other. An empty token is
/// rejected on purpose; a bare substring test would accept it everywhere.
fn words_match(token: &str, target: &str) -> bool {
    !token.is_empty() && (target.contains(token) || token.contains(target))
}

fn build_segment(
    tokens: &[WordToken],
    line: &str,
    idx: usize,
    assignment: &LineAssignment,
    prev_end: Option<f64>,
    params: &AlignParams,
) -> Segment {
    match assignment.timed_by {
        Some((first, last)) => {
            let start = tokens[first].start;
            Segment {
                start,
                end: pad_end(start, tokens[last].end, params.min_segment_secs),
                text: line.to_string(),
                confidence: assignment.confidence,
            }
        }
        None => {
            let start = prev_end.unwrap_or(idx as f64 * params.estimated_line_secs);
            let end = start + params.estimated_line_secs;
            Segment {
                start,
                end: pad_end(start, end, params.min_segment_secs),
                text: line.to_string(),
                confidence: Confidence::Estimated,
            }
        }
    }
}

fn pad_end(start: f64, end: f64, min_secs: f64) -> f64 {
    if end - start < min_secs {
        start + min_secs
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(words: &[(&str, f64, f64)]) -> Vec<WordToken> {
        words
            .iter()
            .map(|(w, s, e)| WordToken::new(*w, *s, *e))
            .collect()
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn response(v: serde_json::Value) -> TimedLyricsResponse {
        TimedLyricsResponse::from_value(&v)
    }

    #[test]
    fn test_clean_alignment_pads_short_lines() {
        let toks = tokens(&[
            ("Hello", 0.0, 0.5),
            ("world", 0.5, 1.0),
            ("Goodbye", 1.0, 1.6),
            ("now", 1.6, 2.0),
        ]);
        let segs = align_lines(&toks, &lines(&["Hello world", "Goodbye now"]), &AlignParams::default());

        assert_eq!(segs.len(), 2);
        assert_eq!((segs[0].start, segs[0].end), (0.0, 2.0));
        assert_eq!((segs[1].start, segs[1].end), (1.0, 3.0));
        assert_eq!(segs[1].text, "Goodbye now");
        assert!(segs.iter().all(|s| s.confidence == Confidence::Matched));
    }

    #[test]
    fn test_long_lines_keep_token_timing() {
        let toks = tokens(&[
            ("Walking", 1.0, 1.8),
            ("down", 1.8, 2.4),
            ("the", 2.4, 2.6),
            ("road,", 2.6, 4.0),
            ("singing", 4.5, 5.2),
            ("all", 5.2, 5.6),
            ("night", 5.6, 7.5),
        ]);
        let segs = align_lines(
            &toks,
            &lines(&["Walking down the road", "Singing all night!"]),
            &AlignParams::default(),
        );
        assert_eq!((segs[0].start, segs[0].end), (1.0, 4.0));
        assert_eq!((segs[1].start, segs[1].end), (4.5, 7.5));
        assert_eq!(segs[1].text, "Singing all night!");
    }

    #[test]
    fn test_merged_and_split_words_still_match() {
        // "gonna" reported as "gon" + "na".
        let toks = tokens(&[
            ("I'm", 0.0, 0.3),
            ("gon", 0.3, 0.5),
            ("na", 0.5, 0.7),
            ("fly", 0.7, 3.0),
        ]);
        let (a, next) = assign_line(&toks, "I'm gonna fly", 0, 1, &AlignParams::default());
        assert_eq!(a.confidence, Confidence::Matched);
        // "na" is examined but not matched; "fly" closes the line.
        assert_eq!(a.timed_by, Some((0, 3)));
        assert_eq!(a.consumed, 0..4);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_low_confidence_line_gets_even_share() {
        let toks = tokens(&[
            ("zzz", 0.0, 1.0),
            ("qqq", 1.0, 2.0),
            ("xxx", 2.0, 3.0),
            ("yyy", 3.0, 4.0),
            ("www", 4.0, 5.0),
        ]);
        let params = AlignParams::default();
        let (a, next) = assign_line(&toks, "Hello there my friend", 0, 2, &params);
        assert_eq!(a.confidence, Confidence::Distributed);
        // 5 tokens over 2 lines: 2 each, the extra one to the earliest line.
        assert_eq!(a.consumed, 0..3);
        assert_eq!(a.timed_by, Some((0, 2)));
        assert_eq!(next, 3);

        let segs = align_lines(&toks, &lines(&["Hello there my friend", "Another line here"]), &params);
        assert_eq!(segs[0].confidence, Confidence::Distributed);
        assert_eq!((segs[0].start, segs[0].end), (0.0, 3.0));
        assert_eq!(segs[1].confidence, Confidence::Distributed);
        assert_eq!((segs[1].start, segs[1].end), (3.0, 5.0));
    }

    #[test]
    fn test_remainder_goes_to_earliest_lines() {
        let toks = tokens(&[
            ("zzz", 0.0, 1.0),
            ("qqq", 1.0, 2.0),
            ("xxx", 2.0, 3.0),
            ("yyy", 3.0, 4.0),
            ("www", 4.0, 5.0),
        ]);
        let text = lines(&["Hello there friend", "Another line here", "Last one now"]);
        let params = AlignParams::default();

        let mut cursor = 0;
        let mut shares = Vec::new();
        for (idx, line) in text.iter().enumerate() {
            let (a, next) = assign_line(&toks, line, cursor, text.len() - idx, &params);
            assert_eq!(a.confidence, Confidence::Distributed);
            shares.push(a.consumed.len());
            cursor = next;
        }
        assert_eq!(shares, vec![2, 2, 1]);
        assert_eq!(cursor, toks.len());

        let segs = align_lines(&toks, &text, &params);
        assert_eq!((segs[0].start, segs[0].end), (0.0, 2.0));
        assert_eq!((segs[1].start, segs[1].end), (2.0, 4.0));
        assert_eq!((segs[2].start, segs[2].end), (4.0, 6.0));
    }

    #[test]
    fn test_word_missing_from_stream_does_not_block_line() {
        // "big" was never reported; "bad" and "world" still match.
        let toks = tokens(&[
            ("hello", 0.0, 0.5),
            ("bad", 0.5, 1.0),
            ("world", 1.0, 4.0),
            ("next", 5.0, 5.5),
            ("line", 5.5, 6.0),
            ("here", 6.0, 8.0),
        ]);
        let params = AlignParams::default();
        let (a, _) = assign_line(&toks, "hello big bad world", 0, 3, &params);
        assert_eq!(a.confidence, Confidence::Matched);
        assert_eq!(a.timed_by, Some((0, 2)));

        let segs = align_lines(
            &toks,
            &lines(&["hello big bad world", "next line here", "final words now"]),
            &params,
        );
        assert_eq!(segs[0].confidence, Confidence::Matched);
        assert_eq!((segs[0].start, segs[0].end), (0.0, 4.0));
    }

    #[test]
    fn test_each_token_counts_once() {
        // "la" fits every target word but only advances the match by one.
        let toks = tokens(&[("la", 0.0, 1.0), ("zzz", 1.0, 2.0), ("zzz", 2.0, 3.0)]);
        let (a, next) = assign_line(&toks, "la la la", 0, 1, &AlignParams::default());
        assert_eq!(a.timed_by, Some((0, 0)));
        assert_eq!(next, 3);
    }

    #[test]
    fn test_exhausted_tokens_fall_back_to_previous_end() {
        let toks = tokens(&[("Hello", 0.0, 0.5), ("world", 0.5, 2.5)]);
        let segs = align_lines(
            &toks,
            &lines(&["Hello world", "Nothing left here", "Still nothing"]),
            &AlignParams::default(),
        );
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].confidence, Confidence::Estimated);
        assert_eq!((segs[1].start, segs[1].end), (2.5, 5.5));
        assert_eq!((segs[2].start, segs[2].end), (5.5, 8.5));
    }

    #[test]
    fn test_first_line_without_tokens_uses_index_slot() {
        let segs = align_lines(&[], &lines(&["Hello world"]), &AlignParams::default());
        assert_eq!((segs[0].start, segs[0].end), (0.0, 3.0));
        assert_eq!(segs[0].confidence, Confidence::Estimated);
    }

    #[test]
    fn test_runaway_scan_is_bounded() {
        let mut words = vec![("noise", 0.0, 0.1); 20];
        words.push(("target", 5.0, 8.0));
        let toks = tokens(&words);
        let (a, _) = assign_line(&toks, "target", 0, 1, &AlignParams::default());
        // One target word: scan stops after 4 examined tokens and the line
        // falls back to taking everything that is left.
        assert_eq!(a.confidence, Confidence::Distributed);
        assert_eq!(a.consumed, 0..21);
    }

    #[test]
    fn test_punctuation_only_tokens_never_match() {
        let toks = tokens(&[("...", 0.0, 1.0), ("hello", 1.0, 3.5)]);
        let (a, _) = assign_line(&toks, "hello", 0, 1, &AlignParams::default());
        assert_eq!(a.timed_by, Some((1, 1)));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let toks = tokens(&[("alpha", 0.0, 1.0), ("zzz", 1.0, 2.0), ("zzz", 2.0, 3.0)]);
        let strict = AlignParams {
            min_match_ratio: 0.5,
            ..AlignParams::default()
        };
        let (a, _) = assign_line(&toks, "alpha beta gamma", 0, 1, &AlignParams::default());
        assert_eq!(a.confidence, Confidence::Matched);
        let (b, _) = assign_line(&toks, "alpha beta gamma", 0, 1, &strict);
        assert_eq!(b.confidence, Confidence::Distributed);
    }

    #[test]
    fn test_inverted_timestamps_are_clamped() {
        let t = WordToken::new("x", 2.0, 1.0);
        assert_eq!((t.start, t.end), (2.0, 2.0));
        let t = WordToken::new("x", -1.0, 0.5);
        assert_eq!((t.start, t.end), (0.0, 0.5));
    }

    #[test]
    fn test_properties_hold_on_noisy_input() {
        let toks = tokens(&[
            ("the", 0.0, 0.2),
            ("sun", 0.2, 0.9),
            ("bzz", 0.9, 1.0),
            ("is", 1.0, 1.1),
            ("rising", 1.1, 2.4),
            ("over", 3.0, 3.3),
            ("blue", 3.3, 3.9),
            ("hills", 3.9, 4.8),
            ("mmm", 5.0, 5.5),
            ("la", 5.5, 5.6),
        ]);
        let text = lines(&[
            "The sun is rising",
            "Over the blue hills",
            "Completely different words",
            "And one more line",
        ]);
        let params = AlignParams::default();

        let first = align_lines(&toks, &text, &params);
        let again = align_lines(&toks, &text, &params);
        assert_eq!(first, again);

        assert_eq!(first.len(), text.len());
        for (seg, line) in first.iter().zip(&text) {
            assert_eq!(&seg.text, line);
            assert!(seg.end - seg.start >= params.min_segment_secs);
        }

        let mut cursor = 0;
        let mut prev_end = 0;
        for (idx, line) in text.iter().enumerate() {
            let (a, next) = assign_line(&toks, line, cursor, text.len() - idx, &params);
            assert!(a.consumed.start >= prev_end);
            assert_eq!(a.consumed.start, cursor);
            assert_eq!(a.consumed.end, next);
            prev_end = a.consumed.end;
            cursor = next;
        }
    }

    #[test]
    fn test_missing_payload_estimates_from_original() {
        let resp = response(json!({"data": null, "msg": "insufficient credits"}));
        let out = parse_lyrics_timing(
            &resp,
            Some("Verse\nHello world\nGoodbye now"),
            &AlignParams::default(),
        );
        let segs = match out {
            Alignment::Estimated(segs) => segs,
            other => panic!("expected estimated alignment, got {other:?}"),
        };
        assert_eq!(segs.len(), 2);
        assert_eq!((segs[0].start, segs[0].end, segs[0].text.as_str()), (0.0, 3.0, "Hello world"));
        assert_eq!((segs[1].start, segs[1].end, segs[1].text.as_str()), (3.0, 6.0, "Goodbye now"));
    }

    #[test]
    fn test_missing_payload_without_lyrics_is_empty() {
        let resp = response(json!({"data": null, "msg": "insufficient credits"}));
        let out = parse_lyrics_timing(&resp, None, &AlignParams::default());
        assert_eq!(out, Alignment::Empty(EmptyReason::MissingPayload));
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_aligned_words_does_not_estimate() {
        let resp = response(json!({"data": {"alignedWords": []}}));
        let out = parse_lyrics_timing(&resp, Some("Hello world\nGoodbye now"), &AlignParams::default());
        assert_eq!(out, Alignment::Empty(EmptyReason::NoAlignedWords));
    }

    #[test]
    fn test_structural_and_unrecognized_words_are_dropped() {
        let resp = response(json!({"data": {"alignedWords": [
            {"word": "[Chorus]\n", "startS": 0.0, "endS": 0.4, "success": true},
            {"word": "Hello", "startS": 0.5, "endS": 1.0, "success": true},
            {"word": "uh", "startS": 1.0, "endS": 1.1, "success": false},
            {"word": "world", "startS": 1.1, "endS": 3.0, "success": true},
            {"word": "   ", "startS": 3.0, "endS": 3.1, "success": true}
        ]}}));
        let toks = clean_tokens(resp.aligned_words());
        assert_eq!(
            toks.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["Hello", "world"]
        );

        let out = parse_lyrics_timing(&resp, Some("[Chorus]\nHello world"), &AlignParams::default());
        let segs = out.segments();
        assert_eq!(out.kind(), "aligned");
        assert_eq!(segs.len(), 1);
        assert_eq!((segs[0].start, segs[0].end), (0.5, 3.0));
        assert!(segs.iter().all(|s| !markers::is_structural(&s.text)));
    }

    #[test]
    fn test_only_structural_words_is_empty() {
        let resp = response(json!({"data": {"alignedWords": [
            {"word": "Verse", "startS": 0.0, "endS": 0.4, "success": true}
        ]}}));
        let out = parse_lyrics_timing(&resp, Some("Hello world"), &AlignParams::default());
        assert_eq!(out, Alignment::Empty(EmptyReason::NoUsableWords));
    }

    #[test]
    fn test_response_lyrics_used_when_original_missing() {
        let resp = response(json!({"data": {
            "alignedWords": [
                {"word": "Hello", "startS": 0.0, "endS": 0.5},
                {"word": "world", "startS": 0.5, "endS": 2.5}
            ],
            "lyrics": "[Verse]\nHello world"
        }}));
        let out = parse_lyrics_timing(&resp, Some("   "), &AlignParams::default());
        assert_eq!(out.segments().len(), 1);
        assert_eq!(out.segments()[0].text, "Hello world");

        let bare = response(json!({"data": {"alignedWords": [
            {"word": "Hello", "startS": 0.0, "endS": 0.5}
        ]}}));
        assert_eq!(
            parse_lyrics_timing(&bare, None, &AlignParams::default()),
            Alignment::Empty(EmptyReason::NoLyrics)
        );
    }

    #[test]
    fn test_no_usable_lines() {
        let resp = response(json!({"data": {"alignedWords": [
            {"word": "Hello", "startS": 0.0, "endS": 0.5}
        ]}}));
        let out = parse_lyrics_timing(&resp, Some("Chorus\nla\n\nOutro"), &AlignParams::default());
        assert_eq!(out, Alignment::Empty(EmptyReason::NoUsableLyricLines));
    }

    #[test]
    fn test_encoding_repaired_on_both_sides() {
        let resp = response(json!({"data": {"alignedWords": [
            {"word": "Ã©tÃ©", "startS": 0.0, "endS": 1.0},
            {"word": "indien", "startS": 1.0, "endS": 2.5}
        ]}}));
        let out = parse_lyrics_timing(&resp, Some("Ã©tÃ© indien"), &AlignParams::default());
        let segs = out.segments();
        assert_eq!(segs[0].text, "été indien");
        assert_eq!(segs[0].confidence, Confidence::Matched);
        assert_eq!((segs[0].start, segs[0].end), (0.0, 2.5));
    }
}
