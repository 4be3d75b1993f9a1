//! Lyrics timing for generated songs
//!
//! This module provides:
//! - Repair of double-encoded UTF-8 in lyrics and API words
//! - Section label filtering
//! - Word-to-line alignment of the API's timed words
//! - Caption wrapping and SRT export

pub mod align;
pub mod encoding;
pub mod markers;
pub mod response;
pub mod srt;
pub mod wrap;

pub use align::{AlignParams, Alignment, parse_lyrics_timing};
pub use response::TimedLyricsResponse;

/// Align a raw timed-lyrics response against the authored lyrics.
pub fn align_response(
    raw: &serde_json::Value,
    original: Option<&str>,
    params: &AlignParams,
) -> Alignment {
    let response = TimedLyricsResponse::from_value(raw);
    parse_lyrics_timing(&response, original, params)
}
