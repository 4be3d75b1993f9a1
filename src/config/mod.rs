use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::lyrics::AlignParams;

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "SUNO_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub api: ApiConfig,
    pub alignment: AlignParams,
    pub captions: CaptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Holds `savedData.json`.
    pub data_dir: PathBuf,
    pub music_dir: PathBuf,
    pub video_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Generation model, e.g. "V4_5".
    pub model: String,
    pub negative_tags: String,
    /// Required by the API even though results are polled.
    pub callback_url: String,
    /// Author credited on generated MP4s.
    pub author: String,
    pub poll_interval_secs: u64,
    /// Give up waiting on a generation job after this long.
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub max_chars_per_line: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = ProjectDirs::from("dev", "cadence", "cadence")
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("cadence"));
        Self {
            data_dir: base.join("data"),
            music_dir: base.join("music"),
            video_dir: base.join("video"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apibox.erweima.ai/api/v1".to_string(),
            api_key: None,
            model: "V4_5".to_string(),
            negative_tags: String::new(),
            callback_url: "https://api.example.com/callback".to_string(),
            author: "cadence".to_string(),
            poll_interval_secs: 5,
            poll_timeout_secs: 900,
            request_timeout_secs: 60,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            max_chars_per_line: 50,
        }
    }
}

impl Config {
    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api.api_key.clone())
    }

    /// `data_dir/savedData.json`
    pub fn metadata_path(&self) -> PathBuf {
        self.paths.data_dir.join("savedData.json")
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "cadence", "cadence").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg, &path).context("write default config")?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    // The file may hold an API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}
