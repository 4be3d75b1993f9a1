mod config;
mod jobs;
mod lyrics;
mod storage;
mod suno;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::lyrics::Alignment;
use crate::storage::{MetadataStore, MusicRecord};
use crate::suno::SunoClient;

#[derive(Debug, Parser)]
#[command(name = "cadence", version, about = "Generate songs and time their lyrics")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a song from a lyrics file and download every variant.
    Generate {
        /// File containing the lyrics.
        #[arg(long)]
        lyrics: PathBuf,
        /// Style prompt, e.g. "acoustic folk, female vocals".
        #[arg(long)]
        style: String,
        /// Song title; defaults to the style.
        #[arg(long)]
        title: Option<String>,
    },
    /// Show a generation task's status.
    Status { task_id: String },
    /// Print remaining account credits.
    Credits,
    /// List stored tracks usable for timing and video.
    List,
    /// Render and download the MP4 of a stored track.
    Video { filename: String },
    /// Time the lyrics of a stored track.
    Timing {
        filename: String,
        /// Write SubRip captions here.
        #[arg(long)]
        srt: Option<PathBuf>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Align a saved timed-lyrics response offline.
    Align {
        /// Raw API response (JSON).
        #[arg(long)]
        response: PathBuf,
        /// Authored lyrics to align against.
        #[arg(long)]
        lyrics: Option<PathBuf>,
        #[arg(long)]
        srt: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print the config file path.
    ConfigPath,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let cfg_path = match cli.config.clone() {
        Some(p) => p,
        None => config::default_config_path().context("default config path")?,
    };

    match cli.command {
        Command::Generate {
            lyrics: lyrics_file,
            style,
            title,
        } => {
            let text = std::fs::read_to_string(&lyrics_file)
                .with_context(|| format!("read {}", lyrics_file.display()))?;
            let client = make_client(&cfg, None)?;
            let mut store = MetadataStore::open(&cfg.metadata_path())?;
            let keys =
                jobs::generate_and_download(&client, &cfg, &mut store, &text, &style, title.as_deref())
                    .await?;
            for key in keys {
                println!("{key}");
            }
        }
        Command::Status { task_id } => {
            let client = make_client(&cfg, None)?;
            let task = client.music_task(&task_id).await?;
            println!("{}  {}", task.task_id, task.status);
            if let Some(err) = task.error_message.as_deref().filter(|e| !e.is_empty()) {
                println!("  error: {err}");
            }
            for t in task.tracks() {
                let duration = t
                    .duration
                    .map(|d| format!("{d:.0}s"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {}  {}  {}  {}",
                    t.id,
                    t.title.as_deref().unwrap_or("-"),
                    duration,
                    t.download_url().unwrap_or("(not ready)")
                );
            }
        }
        Command::Credits => {
            let client = make_client(&cfg, None)?;
            println!("{}", client.credits().await?);
        }
        Command::List => {
            let store = MetadataStore::open(&cfg.metadata_path())?;
            if store.is_empty() {
                println!("No tracks stored in {}", cfg.metadata_path().display());
                return Ok(());
            }
            let keys = jobs::available_music(&cfg, &store);
            for key in &keys {
                println!("{key}");
            }
            eprintln!("{} of {} stored tracks available", keys.len(), store.len());
        }
        Command::Video { filename } => {
            let mut store = MetadataStore::open(&cfg.metadata_path())?;
            let client = make_client(&cfg, store.get(&filename))?;
            let path = jobs::generate_video(&client, &cfg, &mut store, &filename).await?;
            println!("{}", path.display());
        }
        Command::Timing {
            filename,
            srt,
            json,
        } => {
            let mut store = MetadataStore::open(&cfg.metadata_path())?;
            let record = store
                .get(&filename)
                .with_context(|| format!("unknown track {filename}"))?;
            let client = make_client(&cfg, Some(record)).ok();
            let alignment = jobs::segments_for(client.as_ref(), &cfg, &mut store, &filename).await?;
            report(&cfg, &alignment, srt.as_deref(), json)?;
        }
        Command::Align {
            response,
            lyrics: lyrics_file,
            srt,
            json,
        } => {
            let raw = std::fs::read_to_string(&response)
                .with_context(|| format!("read {}", response.display()))?;
            let raw: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("parse {}", response.display()))?;
            let original = match lyrics_file {
                Some(p) => Some(
                    std::fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?,
                ),
                None => None,
            };
            let alignment = lyrics::align_response(&raw, original.as_deref(), &cfg.alignment);
            report(&cfg, &alignment, srt.as_deref(), json)?;
        }
        Command::ConfigPath => println!("{}", cfg_path.display()),
    }

    Ok(())
}

/// Client for the configured key, or the key a track was generated with.
fn make_client(cfg: &config::Config, record: Option<&MusicRecord>) -> anyhow::Result<SunoClient> {
    let key = cfg
        .api_key()
        .or_else(|| record.and_then(|r| r.api_key.clone()))
        .filter(|k| !k.trim().is_empty())
        .with_context(|| format!("no API key: set {} or api.api_key", config::API_KEY_ENV))?;
    SunoClient::new(&cfg.api, &key)
}

fn report(
    cfg: &config::Config,
    alignment: &Alignment,
    srt: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(alignment)?);
    } else {
        print_segments(alignment);
    }

    if let Some(path) = srt {
        if alignment.is_empty() {
            eprintln!("Nothing to caption, not writing {}", path.display());
            return Ok(());
        }
        let out = lyrics::srt::to_srt(alignment.segments(), cfg.captions.max_chars_per_line);
        std::fs::write(path, out).with_context(|| format!("write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn print_segments(alignment: &Alignment) {
    for s in alignment.segments() {
        println!(
            "{:>7.2}-{:<7.2} [{}] {}",
            s.start,
            s.end,
            s.confidence.label(),
            s.text
        );
    }
    match alignment {
        Alignment::Empty(reason) => println!("No timing: {}", reason.describe()),
        other => println!("{} lines, {}", other.segments().len(), other.kind()),
    }
}
