//! Timed-lyrics payload as returned by `/generate/get-timestamped-lyrics`.
//!
//! The API answers with `data: null` plus a `msg` when the account is out of
//! credits, so every field here is optional.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimedLyricsResponse {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub data: Option<TimedLyricsData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimedLyricsData {
    #[serde(rename = "alignedWords")]
    pub aligned_words: Option<Vec<AlignedWord>>,
    /// Lower-fidelity copy of the lyrics, used when the caller has none.
    pub lyrics: Option<String>,
}

/// One word occurrence reported by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlignedWord {
    pub word: Option<String>,
    #[serde(rename = "startS")]
    pub start_s: Option<f64>,
    #[serde(rename = "endS")]
    pub end_s: Option<f64>,
    pub success: Option<bool>,
}

impl Default for AlignedWord {
    fn default() -> Self {
        Self {
            word: None,
            start_s: None,
            end_s: None,
            success: Some(true),
        }
    }
}

impl TimedLyricsResponse {
    /// Decode a raw response without failing.
    ///
    /// A body that does not have the expected shape is treated like one
    /// without `data`, keeping the decode error as the message.
    pub fn from_value(value: &serde_json::Value) -> Self {
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "malformed timed lyrics response");
                Self {
                    code: None,
                    msg: Some(format!("malformed response: {e}")),
                    data: None,
                }
            }
        }
    }

    pub fn aligned_words(&self) -> &[AlignedWord] {
        self.data
            .as_ref()
            .and_then(|d| d.aligned_words.as_deref())
            .unwrap_or_default()
    }

    /// A response worth caching and reusing: it carries word timings.
    pub fn has_aligned_words(&self) -> bool {
        !self.aligned_words().is_empty()
    }

    /// Error message for a response without `data`.
    pub fn error_message(&self) -> &str {
        self.msg.as_deref().unwrap_or("Unknown error")
    }
}
