//! Flat JSON metadata store (`savedData.json`).
//!
//! One object keyed by the generated file stem (`"Orolunga_1"`). Every
//! mutation rewrites the whole file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Completed,
    Failed,
}

/// Everything known about one generated track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicRecord {
    /// Lyrics as submitted for generation.
    #[serde(rename = "paroles", default)]
    pub lyrics: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "taskId", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "audioId", default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<String>,
    /// Key used when the track was generated; older stores carry it.
    #[serde(rename = "API_KEY", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Raw timed-lyrics response, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamped_lyrics: Option<serde_json::Value>,
    #[serde(rename = "videoTaskId", default, skip_serializing_if = "Option::is_none")]
    pub video_task_id: Option<String>,
    #[serde(rename = "videoUrl", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(rename = "videoStatus", default, skip_serializing_if = "Option::is_none")]
    pub video_status: Option<VideoStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Fields written by other tools.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MusicRecord {
    /// Task and audio ids, when both are set.
    pub fn job_ids(&self) -> Option<(&str, &str)> {
        let task = self.task_id.as_deref().filter(|s| !s.is_empty())?;
        let audio = self.audio_id.as_deref().filter(|s| !s.is_empty())?;
        Some((task, audio))
    }
}

pub struct MetadataStore {
    path: PathBuf,
    records: BTreeMap<String, MusicRecord>,
}

impl MetadataStore {
    /// Open the store at `path`; a missing or empty file is an empty store.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let records = if path.exists() {
            let raw =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Find a record by key, accepting a trailing `.mp3`.
    pub fn get(&self, key: &str) -> Option<&MusicRecord> {
        self.resolve_key(key).and_then(|k| self.records.get(k))
    }

    /// The stored key matching `key`, with or without `.mp3`.
    pub fn resolve_key<'a>(&'a self, key: &str) -> Option<&'a str> {
        let stem = key.strip_suffix(".mp3").unwrap_or(key);
        [key, stem]
            .into_iter()
            .find_map(|k| self.records.get_key_value(k))
            .map(|(k, _)| k.as_str())
    }

    pub fn list(&self) -> impl Iterator<Item = (&str, &MusicRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or replace records and persist.
    pub fn upsert<I>(&mut self, entries: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = (String, MusicRecord)>,
    {
        self.records.extend(entries);
        self.save()
    }

    /// Modify one record in place and persist. Returns `false` when the key
    /// is unknown.
    pub fn update<F>(&mut self, key: &str, f: F) -> anyhow::Result<bool>
    where
        F: FnOnce(&mut MusicRecord),
    {
        let Some(key) = self.resolve_key(key).map(str::to_string) else {
            return Ok(false);
        };
        if let Some(record) = self.records.get_mut(&key) {
            f(record);
        }
        self.save()?;
        Ok(true)
    }

    /// Cached timed-lyrics response for a record.
    pub fn cached_timed_lyrics(&self, key: &str) -> Option<&serde_json::Value> {
        self.get(key)
            .and_then(|r| r.timestamped_lyrics.as_ref())
            .filter(|v| !v.is_null())
    }

    /// Store a timed-lyrics response, creating the record if needed.
    pub fn cache_timed_lyrics(&mut self, key: &str, response: serde_json::Value) -> anyhow::Result<()> {
        let key = self.resolve_key(key).unwrap_or(key).to_string();
        self.records.entry(key).or_default().timestamped_lyrics = Some(response);
        self.save()
    }

    fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&self.records).context("serialize metadata")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}
