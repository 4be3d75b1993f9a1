use anyhow::Context;
use tracing::{info, warn};

use crate::config::{API_KEY_ENV, Config};
use crate::lyrics::{self, Alignment, TimedLyricsResponse};
use crate::storage::MetadataStore;
use crate::suno::SunoClient;

/// Timed-lyrics response for a stored track, from cache when usable.
///
/// A cached response is reused only when it carries aligned words; cached
/// errors (e.g. out of credits) and incomplete payloads are refetched and the
/// fresh answer replaces them. Without a client the cached answer, whatever
/// it is, is the best available.
pub async fn timed_lyrics_with_cache(
    client: Option<&SunoClient>,
    store: &mut MetadataStore,
    key: &str,
) -> anyhow::Result<serde_json::Value> {
    let (task_id, audio_id) = {
        let record = store
            .get(key)
            .with_context(|| format!("unknown track {key}"))?;
        let (t, a) = record
            .job_ids()
            .with_context(|| format!("track {key} has no taskId/audioId"))?;
        (t.to_string(), a.to_string())
    };

    if let Some(cached) = store.cached_timed_lyrics(key) {
        let resp = TimedLyricsResponse::from_value(cached);
        if resp.has_aligned_words() {
            info!(key, "using cached timed lyrics");
            return Ok(cached.clone());
        }
        if resp.data.is_none() {
            info!(key, msg = resp.error_message(), "cached timed lyrics is an error, refetching");
        } else {
            info!(key, "cached timed lyrics incomplete, refetching");
        }
    }

    let Some(client) = client else {
        if let Some(cached) = store.cached_timed_lyrics(key) {
            warn!(key, "no API key, using unusable cached timed lyrics");
            return Ok(cached.clone());
        }
        anyhow::bail!("no API key (set {API_KEY_ENV}) and no cached timed lyrics for {key}");
    };

    info!(key, "fetching timed lyrics");
    let fresh = client.timestamped_lyrics(&task_id, &audio_id, 0).await?;
    store
        .cache_timed_lyrics(key, fresh.clone())
        .context("cache timed lyrics")?;
    Ok(fresh)
}

/// Align a stored track's lyrics against its timed-lyrics response.
pub async fn segments_for(
    client: Option<&SunoClient>,
    cfg: &Config,
    store: &mut MetadataStore,
    key: &str,
) -> anyhow::Result<Alignment> {
    let raw = timed_lyrics_with_cache(client, store, key).await?;
    let original = store.get(key).map(|r| r.lyrics.as_str());
    Ok(lyrics::align_response(&raw, original, &cfg.alignment))
}
