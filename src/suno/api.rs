use crate::config::ApiConfig;
use crate::suno::models::{Envelope, MusicTask, TaskRef, VideoTask};
use anyhow::Context;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Inner {
    /// Carries the bearer token; only used against `base_url`.
    http: reqwest::Client,
    /// Plain client for signed media URLs.
    media: reqwest::Client,
    settings: ApiConfig,
}

/// Client for the music generation API.
#[derive(Debug, Clone)]
pub struct SunoClient {
    inner: Arc<Inner>,
}

impl SunoClient {
    pub fn new(settings: &ApiConfig, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .context("API key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        let media = reqwest::Client::builder()
            .build()
            .context("build media client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                media,
                settings: settings.clone(),
            }),
        })
    }

    /// Submit a custom-mode song; returns the generation task id.
    pub async fn generate_music(&self, prompt: &str, style: &str, title: &str) -> anyhow::Result<String> {
        let s = &self.inner.settings;
        let body = json!({
            "prompt": prompt,
            "style": style,
            "title": title,
            "customMode": true,
            "instrumental": false,
            "model": s.model,
            "negativeTags": s.negative_tags,
            "callBackUrl": s.callback_url,
        });

        let env: Envelope<TaskRef> = self
            .inner
            .http
            .post(self.url("generate"))
            .json(&body)
            .send()
            .await
            .context("send generate request")?
            .error_for_status()
            .context("generate http status")?
            .json()
            .await
            .context("parse generate json")?;

        env.into_data("generate")?
            .task_id
            .context("generate response has no taskId")
    }

    pub async fn music_task(&self, task_id: &str) -> anyhow::Result<MusicTask> {
        let url = format!(
            "{}?taskId={}",
            self.url("generate/record-info"),
            urlencoding::encode(task_id)
        );
        let env: Envelope<MusicTask> = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .context("send record-info request")?
            .error_for_status()
            .context("record-info http status")?
            .json()
            .await
            .context("parse record-info json")?;
        env.into_data("record-info")
    }

    /// Remaining account credits.
    pub async fn credits(&self) -> anyhow::Result<f64> {
        let env: Envelope<f64> = self
            .inner
            .http
            .get(self.url("generate/credit"))
            .send()
            .await
            .context("send credit request")?
            .error_for_status()
            .context("credit http status")?
            .json()
            .await
            .context("parse credit json")?;
        env.into_data("credit")
    }

    /// Raw timed-lyrics response.
    ///
    /// Returned as is: a body with `data: null` and a `msg` (no credits) is a
    /// valid answer the aligner knows how to degrade from.
    pub async fn timestamped_lyrics(
        &self,
        task_id: &str,
        audio_id: &str,
        music_index: u32,
    ) -> anyhow::Result<serde_json::Value> {
        let body = json!({
            "taskId": task_id,
            "audioId": audio_id,
            "musicIndex": music_index,
        });

        let v: serde_json::Value = self
            .inner
            .http
            .post(self.url("generate/get-timestamped-lyrics"))
            .json(&body)
            .send()
            .await
            .context("send timestamped lyrics request")?
            .error_for_status()
            .context("timestamped lyrics http status")?
            .json()
            .await
            .context("parse timestamped lyrics json")?;
        Ok(v)
    }

    /// Submit an MP4 job for a generated track; returns the video task id.
    ///
    /// When the API reports that the MP4 already exists, the existing task
    /// id is returned instead.
    pub async fn generate_video(&self, task_id: &str, audio_id: &str) -> anyhow::Result<String> {
        let s = &self.inner.settings;
        let body = json!({
            "taskId": task_id,
            "audioId": audio_id,
            "callBackUrl": s.callback_url,
            "author": s.author,
        });

        let env: Envelope<TaskRef> = self
            .inner
            .http
            .post(self.url("mp4/generate"))
            .json(&body)
            .send()
            .await
            .context("send mp4 generate request")?
            .json()
            .await
            .context("parse mp4 generate json")?;

        if let Some(existing) = existing_video_task(&env) {
            tracing::info!(task_id = existing, "mp4 already exists, reusing task");
            return Ok(existing.to_string());
        }

        env.into_data("mp4 generate")?
            .task_id
            .context("mp4 generate response has no taskId")
    }

    pub async fn video_task(&self, task_id: &str) -> anyhow::Result<VideoTask> {
        let url = format!(
            "{}?taskId={}",
            self.url("mp4/record-info"),
            urlencoding::encode(task_id)
        );
        let env: Envelope<VideoTask> = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .context("send mp4 record-info request")?
            .error_for_status()
            .context("mp4 record-info http status")?
            .json()
            .await
            .context("parse mp4 record-info json")?;
        env.into_data("mp4 record-info")
    }

    /// Fetch a media URL into `dest`. A partially written file is removed.
    pub async fn download(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let result = async {
            let bytes = self
                .inner
                .media
                .get(url)
                .send()
                .await
                .context("send download request")?
                .error_for_status()
                .context("download http status")?
                .bytes()
                .await
                .context("read download body")?;
            tokio::fs::write(dest, &bytes)
                .await
                .with_context(|| format!("write {}", dest.display()))?;
            anyhow::Ok(bytes.len() as u64)
        }
        .await;

        if result.is_err() && dest.exists() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.settings.base_url.trim_end_matches('/'))
    }
}

/// Task id of an MP4 that the API says already exists (code 409).
fn existing_video_task(env: &Envelope<TaskRef>) -> Option<&str> {
    let exists = env.code == 409
        && env
            .msg
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains("already exists"));
    if !exists {
        return None;
    }
    env.data.as_ref()?.task_id.as_deref()
}
