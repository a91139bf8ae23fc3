use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of completed jobs kept in the history.
pub const HISTORY_LIMIT: usize = 10;
pub const DEFAULT_LANGUAGE: &str = "ko";
pub const DEFAULT_CATEGORY_NAME: &str = "New folder";
pub const DEFAULT_CATEGORY_EMOJI: &str = "📁";

/// Opaque task identifier issued by the remote service for one tracked job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ties a submit call to its outcome. Issued once per submission and never
/// reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two kinds of remotely tracked jobs. They poll at different rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Transcription,
    Fetch,
}

impl JobKind {
    pub fn poll_interval(self) -> Duration {
        match self {
            JobKind::Transcription => Duration::from_millis(2000),
            JobKind::Fetch => Duration::from_millis(1200),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Transcription => f.write_str("transcription"),
            JobKind::Fetch => f.write_str("fetch"),
        }
    }
}

/// Speed/accuracy preset chosen in the UI, mapped to a model size on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelPreset {
    Cheetah,
    #[default]
    Dolphin,
    Whale,
}

impl ModelPreset {
    /// Unknown keys fall back to the default preset.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "cheetah" => ModelPreset::Cheetah,
            "whale" => ModelPreset::Whale,
            _ => ModelPreset::Dolphin,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ModelPreset::Cheetah => "cheetah",
            ModelPreset::Dolphin => "dolphin",
            ModelPreset::Whale => "whale",
        }
    }

    pub fn model_size(self) -> &'static str {
        match self {
            ModelPreset::Cheetah => "tiny",
            ModelPreset::Dolphin => "base",
            ModelPreset::Whale => "small",
        }
    }
}

/// Payload of a successful transcription job.
///
/// Only the fields the session reads are typed; everything else the service
/// returns is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub job_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(rename = "editedAt", default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TranscriptionResult {
    pub fn new(job_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            text: text.into(),
            original_filename: None,
            edited_at: None,
            extra: Map::new(),
        }
    }

    /// Diarization turns from the `speakers` field, in service order.
    /// Malformed entries are skipped; a missing or `null` field yields none.
    pub fn speaker_turns(&self) -> Vec<SpeakerTurn> {
        let Some(Value::Array(entries)) = self.extra.get("speakers") else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| {
                let start = entry.get("start")?.as_f64()?;
                let end = entry.get("end")?.as_f64()?;
                let speaker = entry.get("speaker")?.as_str()?;
                Some(SpeakerTurn {
                    speaker: speaker.to_string(),
                    start_ms: seconds_to_millis(start),
                    end_ms: seconds_to_millis(end.max(start)),
                })
            })
            .collect()
    }
}

/// One stretch of audio attributed to a single speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTurn {
    pub speaker: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

fn seconds_to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// A completed job kept in the local history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub filename: String,
    pub language: String,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub result: TranscriptionResult,
}

/// A user-created partition of the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_emoji")]
    pub emoji: String,
}

fn default_emoji() -> String {
    DEFAULT_CATEGORY_EMOJI.to_string()
}

/// Active category filter: everything, only uncategorized items, or one category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Uncategorized,
    Category(String),
}

impl CategoryFilter {
    pub const ALL: &'static str = "all";
    pub const UNCATEGORIZED: &'static str = "uncategorized";

    /// Blank input means no filter.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | Self::ALL => CategoryFilter::All,
            Self::UNCATEGORIZED => CategoryFilter::Uncategorized,
            id => CategoryFilter::Category(id.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => Self::ALL,
            CategoryFilter::Uncategorized => Self::UNCATEGORIZED,
            CategoryFilter::Category(id) => id,
        }
    }

    pub fn category_id(&self) -> Option<&str> {
        match self {
            CategoryFilter::Category(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
}

/// Media the service already downloaded through a link fetch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMedia {
    pub job_id: String,
    pub title: String,
    pub size_bytes: Option<u64>,
}

/// What a transcription submission transcribes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    File(SelectedFile),
    Downloaded { job_id: String },
    Link { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionOptions {
    pub language: String,
    pub model_size: String,
    pub diarize: bool,
}
