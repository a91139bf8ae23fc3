use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Lifecycle state reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Progress,
    Success,
    Failure,
    /// `STARTED`, `RETRY` and anything newer; the job is still running.
    #[serde(other)]
    Running,
}

/// Body of `GET /status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatus {
    /// Progress as a whole percentage in `0..=100`.
    pub fn percent(&self) -> u8 {
        let raw = self.progress.unwrap_or(0.0);
        if raw.is_nan() {
            return 0;
        }
        raw.round().clamp(0.0, 100.0) as u8
    }
}

/// Answer of every `*-async` submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmittedJob {
    pub job_id: String,
    pub task_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Input of a transcription submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionInput {
    /// Upload a local file.
    Upload { path: PathBuf, file_name: String },
    /// Transcribe media a fetch job already downloaded.
    Downloaded { job_id: String },
    /// Download and transcribe in one remote job.
    Link { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub input: TranscriptionInput,
    pub language: String,
    pub model_size: String,
    pub diarize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text fit for the session's error field. Service rejections carry their
    /// own detail; everything else gets a short description of the kind.
    pub fn user_message(&self) -> String {
        match &self.kind {
            RemoteErrorKind::Rejected { detail, .. } => detail.clone(),
            kind => kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    InvalidUrl,
    Network,
    Timeout,
    HttpStatus(u16),
    /// Non-2xx answer with a `detail` body.
    Rejected { status: u16, detail: String },
    TooLarge { max_bytes: u64 },
    Decode,
    /// The local upload could not be read.
    Io,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteErrorKind::InvalidUrl => write!(f, "invalid service address"),
            RemoteErrorKind::Network => write!(f, "could not reach the service"),
            RemoteErrorKind::Timeout => write!(f, "the service timed out"),
            RemoteErrorKind::HttpStatus(code) => write!(f, "service answered with status {code}"),
            RemoteErrorKind::Rejected { status, detail } => {
                write!(f, "rejected with status {status}: {detail}")
            }
            RemoteErrorKind::TooLarge { max_bytes } => {
                write!(f, "service response exceeded {max_bytes} bytes")
            }
            RemoteErrorKind::Decode => write!(f, "unreadable service response"),
            RemoteErrorKind::Io => write!(f, "could not read the selected file"),
        }
    }
}
