use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

use super::{poll_timing, poll_until};
use crate::config::Config;
use crate::storage::{MetadataStore, VideoStatus};
use crate::suno::{SunoClient, TaskState};

/// Have the API render an MP4 for a stored track and download it to
/// `video_dir/{key}.mp4`. The record tracks the video job throughout.
pub async fn generate_video(
    client: &SunoClient,
    cfg: &Config,
    store: &mut MetadataStore,
    key: &str,
) -> anyhow::Result<PathBuf> {
    let key = store
        .resolve_key(key)
        .map(str::to_string)
        .with_context(|| format!("unknown track {key}"))?;
    let (task_id, audio_id) = store
        .get(&key)
        .and_then(|r| r.job_ids())
        .map(|(t, a)| (t.to_string(), a.to_string()))
        .with_context(|| format!("track {key} has no taskId/audioId"))?;

    let video_task = client.generate_video(&task_id, &audio_id).await?;
    info!(%video_task, key = %key, "video generation submitted");
    store.update(&key, |r| {
        r.video_task_id = Some(video_task.clone());
        r.video_status = Some(VideoStatus::Pending);
    })?;

    let (interval, deadline) = poll_timing(cfg);
    let outcome = async {
        let task = poll_until("video generation", interval, deadline, || {
            let video_task = video_task.as_str();
            async move {
                let task = client.video_task(video_task).await?;
                info!(task_id = %task.task_id, flag = %task.success_flag, "video generation status");
                anyhow::Ok((TaskState::of_video(&task), task))
            }
        })
        .await?;

        let url = task
            .response
            .and_then(|r| r.video_url)
            .filter(|u| !u.is_empty())
            .context("finished video has no videoUrl")?;
        let path = cfg.paths.video_dir.join(format!("{key}.mp4"));
        let bytes = client.download(&url, &path).await?;
        info!(path = %path.display(), bytes, "downloaded video");
        anyhow::Ok((url, path))
    }
    .await;

    match outcome {
        Ok((url, path)) => {
            store.update(&key, |r| {
                r.video_url = Some(url);
                r.video_status = Some(VideoStatus::Completed);
                r.video_path = Some(path.clone());
            })?;
            Ok(path)
        }
        Err(e) => {
            store.update(&key, |r| r.video_status = Some(VideoStatus::Failed))?;
            Err(e)
        }
    }
}
