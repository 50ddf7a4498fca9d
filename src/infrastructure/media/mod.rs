//! Audio transcoding behind a small trait so the assembler can be driven by
//! ffmpeg in production and by fakes in tests.

pub mod ffmpeg;

pub use ffmpeg::{AudioFormat, FfmpegToolkit};

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("Could not read duration of {path}: {message}")]
    Probe { path: PathBuf, message: String },
    #[error("Media I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration of any audio file, in milliseconds.
    async fn probe_duration_ms(&self, path: &Path) -> Result<u64, MediaError>;

    /// Decode `input` to PCM WAV with the configured rate and channel count.
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), MediaError>;

    /// Write `duration_ms` of silence in the same format `normalize` produces.
    async fn render_silence(&self, duration_ms: u64, output: &Path) -> Result<(), MediaError>;

    /// Concatenate the fragments listed in a concat list file into one MP3.
    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), MediaError>;
}

/// One line group of an ffmpeg concat list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatEntry {
    pub path: PathBuf,
    pub inpoint_ms: Option<u64>,
    pub outpoint_ms: Option<u64>,
}

impl ConcatEntry {
    pub fn whole(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inpoint_ms: None,
            outpoint_ms: None,
        }
    }

    pub fn slice(path: impl Into<PathBuf>, inpoint_ms: u64, outpoint_ms: u64) -> Self {
        Self {
            path: path.into(),
            inpoint_ms: Some(inpoint_ms),
            outpoint_ms: Some(outpoint_ms),
        }
    }
}

/// Render entries in concat demuxer syntax.
pub fn render_concat_list(entries: &[ConcatEntry]) -> String {
    let mut out = String::from("ffconcat version 1.0\n");
    for entry in entries {
        let path = entry.path.to_string_lossy().replace('\'', "'\\''");
        out.push_str(&format!("file '{}'\n", path));
        if let Some(inpoint) = entry.inpoint_ms {
            out.push_str(&format!("inpoint {}\n", format_seconds(inpoint)));
        }
        if let Some(outpoint) = entry.outpoint_ms {
            out.push_str(&format!("outpoint {}\n", format_seconds(outpoint)));
        }
    }
    out
}

/// Read back a list produced by [`render_concat_list`].
pub fn parse_concat_list(list: &str) -> Vec<ConcatEntry> {
    let mut entries: Vec<ConcatEntry> = Vec::new();
    for line in list.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("file ") {
            let path = rest
                .trim()
                .trim_start_matches('\'')
                .trim_end_matches('\'')
                .replace("'\\''", "'");
            entries.push(ConcatEntry::whole(path));
        } else if let Some(rest) = line.strip_prefix("inpoint ") {
            if let Some(entry) = entries.last_mut() {
                entry.inpoint_ms = parse_seconds(rest);
            }
        } else if let Some(rest) = line.strip_prefix("outpoint ") {
            if let Some(entry) = entries.last_mut() {
                entry.outpoint_ms = parse_seconds(rest);
            }
        }
    }
    entries
}

fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

fn parse_seconds(value: &str) -> Option<u64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .map(|secs| (secs * 1000.0).round() as u64)
}
