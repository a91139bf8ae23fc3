use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    CategoryFilter, JobHandle, JobKind, ModelPreset, PersistedSnapshot, SelectedFile,
    SubmissionId, UrlState,
};

/// Accepted submission as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub handle: JobHandle,
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Session start with whatever storage and the address bar hold.
    Boot {
        persisted: PersistedSnapshot,
        url: UrlState,
    },
    /// User picked a local file to upload.
    FileSelected(SelectedFile),
    LanguageChanged(String),
    ModelChanged(ModelPreset),
    DiarizationToggled(bool),
    /// User asked to transcribe the fetched media, or else the selected file.
    TranscriptionRequested,
    /// Download and transcribe a link as a single remote job.
    LinkTranscriptionRequested { url: String },
    /// Download a link; optionally transcribe it once the download succeeds.
    LinkFetchRequested { url: String, auto_transcribe: bool },
    /// Outcome of a submit call. Only the outcome for the current
    /// `request` of `kind` is adopted.
    Submitted {
        kind: JobKind,
        request: SubmissionId,
        result: Result<Submission, String>,
    },
    /// Poller forwarded a progress tick.
    JobProgress {
        kind: JobKind,
        handle: JobHandle,
        progress: u8,
    },
    /// Poller reached `SUCCESS`.
    JobSucceeded {
        kind: JobKind,
        handle: JobHandle,
        result: Value,
        at: DateTime<Utc>,
    },
    /// Poller reached `FAILURE` or the status query itself failed.
    JobFailed {
        kind: JobKind,
        handle: JobHandle,
        error: String,
    },
    EditRequested { job_id: String, text: String },
    EditCompleted {
        job_id: String,
        text: String,
        result: Result<(), String>,
        at: DateTime<Utc>,
    },
    RenameRequested { job_id: String, filename: String },
    /// `None` (or the uncategorized filter id) clears the category.
    CategoryAssigned {
        job_id: String,
        category_id: Option<String>,
    },
    DeleteRequested { job_id: String },
    /// Remote delete finished; local removal proceeds either way.
    DeleteCompleted {
        job_id: String,
        remote: Result<(), String>,
    },
    CategoryCreated { name: String, at: DateTime<Utc> },
    CategoryRenamed { id: String, name: String },
    CategoryEmojiChanged { id: String, emoji: String },
    CategoryDeleted { id: String },
    CategorySelected(CategoryFilter),
    ResultOpened { job_id: String },
    ResultClosed,
    /// Back/forward navigation restored this address.
    Navigated(UrlState),
    TimestampsToggled,
    SpeakersToggled,
    ResetRequested,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
