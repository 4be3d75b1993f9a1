use anyhow::Context;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{next_free_path, poll_timing, poll_until, safe_stem};
use crate::config::Config;
use crate::storage::{MetadataStore, MusicRecord};
use crate::suno::{SunoClient, TaskState};

/// Generate a song, wait for it, download every variant and record it.
///
/// Files land in `music_dir` as `{title}_{n}.mp3` with the first free `n`.
/// Returns the store keys of the new records.
pub async fn generate_and_download(
    client: &SunoClient,
    cfg: &Config,
    store: &mut MetadataStore,
    lyrics: &str,
    style: &str,
    title: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(style);
    let task_id = client.generate_music(lyrics, style, title).await?;
    info!(%task_id, title, "music generation submitted");

    let (interval, deadline) = poll_timing(cfg);
    let task = poll_until("music generation", interval, deadline, || {
        let task_id = task_id.as_str();
        async move {
            let task = client.music_task(task_id).await?;
            info!(status = %task.status, "music generation status");
            anyhow::Ok((TaskState::of_music(&task), task))
        }
    })
    .await?;

    let base = safe_stem(title);
    let created_at = OffsetDateTime::now_utc().unix_timestamp();
    let mut counter = 1;
    let mut entries = Vec::new();

    for track in task.tracks() {
        let Some(url) = track.download_url() else {
            warn!(audio_id = %track.id, "track has no audio url");
            continue;
        };
        let path = next_free_path(&cfg.paths.music_dir, &base, "mp3", &mut counter);
        counter += 1;

        let bytes = client
            .download(url, &path)
            .await
            .with_context(|| format!("download track {}", track.id))?;
        info!(path = %path.display(), bytes, "downloaded track");

        let key = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("downloaded file has no name")?;
        entries.push((
            key,
            MusicRecord {
                lyrics: lyrics.to_string(),
                name: title.to_string(),
                task_id: Some(task_id.clone()),
                audio_id: Some(track.id.clone()),
                file_path: Some(path),
                created_at: Some(created_at),
                ..MusicRecord::default()
            },
        ));
    }

    if entries.is_empty() {
        anyhow::bail!("music generation {task_id} finished without downloadable tracks");
    }

    let keys = entries.iter().map(|(k, _)| k.clone()).collect();
    store.upsert(entries).context("save music records")?;
    Ok(keys)
}
