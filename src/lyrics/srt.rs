//! SubRip export of aligned segments.

use std::fmt::Write as _;

use super::align::Segment;
use super::wrap::wrap;

/// Render segments as an SRT document, wrapping each caption to at most two
/// lines of `max_chars`.
pub fn to_srt(segments: &[Segment], max_chars: usize) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_timestamp(seg.start),
            format_timestamp(seg.end)
        );
        for line in wrap(&seg.text, max_chars) {
            let _ = writeln!(out, "{line}");
        }
        out.push('\n');
    }
    out
}

/// `HH:MM:SS,mmm`
fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
