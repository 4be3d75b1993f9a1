use anyhow::Context;
use serde::Deserialize;

/// `{code, msg, data}` wrapper used by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// `data` of a successful (`code == 200`) response.
    pub fn into_data(self, what: &str) -> anyhow::Result<T> {
        if self.code != 200 {
            anyhow::bail!(
                "{what} failed (code {}): {}",
                self.code,
                self.msg.as_deref().unwrap_or("no message")
            );
        }
        self.data.with_context(|| format!("{what}: response has no data"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRef {
    #[serde(rename = "taskId")]
    pub task_id: Option<String>,
}

/// `/generate/record-info`
#[derive(Debug, Clone, Deserialize)]
pub struct MusicTask {
    #[serde(rename = "taskId", default)]
    pub task_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub response: Option<MusicTaskResponse>,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicTaskResponse {
    #[serde(rename = "sunoData", default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(rename = "sourceAudioUrl", default)]
    pub source_audio_url: Option<String>,
    #[serde(rename = "audioUrl", default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Track {
    /// Best URL to fetch the MP3 from.
    pub fn download_url(&self) -> Option<&str> {
        [&self.source_audio_url, &self.audio_url]
            .into_iter()
            .filter_map(|u| u.as_deref())
            .find(|u| !u.is_empty())
    }
}

impl MusicTask {
    pub fn tracks(&self) -> &[Track] {
        self.response
            .as_ref()
            .map(|r| r.tracks.as_slice())
            .unwrap_or_default()
    }
}

/// `/mp4/record-info`
#[derive(Debug, Clone, Deserialize)]
pub struct VideoTask {
    #[serde(rename = "taskId", default)]
    pub task_id: String,
    #[serde(rename = "successFlag", default)]
    pub success_flag: String,
    #[serde(default)]
    pub response: Option<VideoTaskResponse>,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoTaskResponse {
    #[serde(rename = "videoUrl", default)]
    pub video_url: Option<String>,
}

/// Where a polled job stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Done,
    Failed(String),
}

impl TaskState {
    pub fn of_music(task: &MusicTask) -> Self {
        match task.status.as_str() {
            "SUCCESS" => Self::Done,
            "CREATE_TASK_FAILED" | "GENERATE_AUDIO_FAILED" | "CALLBACK_EXCEPTION"
            | "SENSITIVE_WORD_ERROR" => Self::Failed(failure(&task.status, task.error_message.as_deref())),
            _ => Self::Running,
        }
    }

    pub fn of_video(task: &VideoTask) -> Self {
        match task.success_flag.as_str() {
            "SUCCESS" => Self::Done,
            flag if flag.ends_with("_FAILED") || flag == "CALLBACK_EXCEPTION" => {
                Self::Failed(failure(flag, task.error_message.as_deref()))
            }
            _ => Self::Running,
        }
    }
}

fn failure(status: &str, message: Option<&str>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!("{status}: {m}"),
        _ => status.to_string(),
    }
}
