//! Generation workflows built on the API client and the metadata store.

use anyhow::Context;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::storage::MetadataStore;
use crate::suno::TaskState;

pub mod music;
pub mod timing;
pub mod video;

pub use music::generate_and_download;
pub use timing::segments_for;
pub use video::generate_video;

/// Call `check` every `interval` until it reports `Done`, a failure, or
/// `deadline` passes. Transport errors are logged and polled through.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    interval: Duration,
    deadline: Duration,
    mut check: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<(TaskState, T)>>,
{
    let poll = async {
        loop {
            match check().await {
                Ok((TaskState::Done, value)) => return Ok(value),
                Ok((TaskState::Failed(reason), _)) => anyhow::bail!("{what} failed: {reason}"),
                Ok((TaskState::Running, _)) => debug!(what, "still running"),
                Err(e) => warn!(what, error = %e, "status check failed"),
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(deadline, poll)
        .await
        .with_context(|| format!("{what} did not finish within {}s", deadline.as_secs()))?
}

/// Polling cadence from the config.
fn poll_timing(cfg: &Config) -> (Duration, Duration) {
    (
        Duration::from_secs(cfg.api.poll_interval_secs),
        Duration::from_secs(cfg.api.poll_timeout_secs),
    )
}

/// Stored tracks that can be aligned or turned into a video: both job ids
/// are known and the audio file is on disk.
pub fn available_music(cfg: &Config, store: &MetadataStore) -> Vec<String> {
    let mut keys = store
        .list()
        .filter(|(_, rec)| rec.job_ids().is_some())
        .filter(|(key, rec)| {
            rec.file_path
                .as_deref()
                .filter(|p| p.exists())
                .is_some()
                || cfg.paths.music_dir.join(format!("{key}.mp3")).exists()
        })
        .map(|(key, _)| key.to_string())
        .collect::<Vec<_>>();
    keys.sort();
    keys
}

/// File name stem safe to use on any platform.
fn safe_stem(name: &str) -> String {
    let stem = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    let stem = stem.trim();
    if stem.is_empty() {
        "track".to_string()
    } else {
        stem.to_string()
    }
}

/// First `dir/{base}_{n}.{ext}` that does not exist, starting at `*counter`.
fn next_free_path(dir: &Path, base: &str, ext: &str, counter: &mut u32) -> PathBuf {
    loop {
        let candidate = dir.join(format!("{base}_{counter}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        *counter += 1;
    }
}
