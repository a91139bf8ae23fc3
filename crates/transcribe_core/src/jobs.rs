//! Submission and poll outcomes for transcription and link-fetch jobs.

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_info, engine_warn};
use serde_json::Value;

use crate::state::{FetchJob, PendingItem, TranscriptionJob};
use crate::{
    AppState, Effect, HistoryItem, JobHandle, JobKind, MediaSource, NavigationMode, RemoteMedia,
    StorageKey, Submission, SubmissionId, TranscriptionOptions, TranscriptionResult,
};

pub const MSG_NO_FILE: &str = "Please select a file";
pub const MSG_NO_LINK: &str = "Please enter a link";
pub const MSG_ALREADY_PROCESSING: &str = "A transcription is already in progress";
pub const MSG_ALREADY_FETCHING: &str = "A link is already being fetched";
pub const MSG_TRANSCRIPTION_FAILED: &str = "Transcription failed";
pub const MSG_FETCH_FAILED: &str = "Link fetch failed";
pub const MSG_MALFORMED_RESULT: &str = "The service returned an unreadable result";

const STATUS_UPLOADING: &str = "Uploading";
const STATUS_STARTED: &str = "Job started";
const STATUS_COMPLETE: &str = "Transcription complete";
const STATUS_FETCHED: &str = "Link fetched";
const FALLBACK_FILENAME: &str = "link";

impl AppState {
    /// Fetched media takes precedence over a selected file.
    pub(crate) fn request_transcription(&mut self, effects: &mut Vec<Effect>) {
        self.error = None;
        if self.is_processing() {
            self.error = Some(MSG_ALREADY_PROCESSING.to_string());
            return;
        }
        let (source, filename) = if let Some(remote) = &self.selected_remote {
            (
                MediaSource::Downloaded {
                    job_id: remote.job_id.clone(),
                },
                Some(remote.title.clone()),
            )
        } else if let Some(file) = &self.selected_file {
            (MediaSource::File(file.clone()), Some(file.name.clone()))
        } else {
            self.error = Some(MSG_NO_FILE.to_string());
            return;
        };
        self.begin_transcription(source, filename, effects);
    }

    pub(crate) fn request_link_transcription(&mut self, url: &str, effects: &mut Vec<Effect>) {
        self.error = None;
        let url = url.trim();
        if url.is_empty() {
            self.error = Some(MSG_NO_LINK.to_string());
            return;
        }
        if self.is_processing() {
            self.error = Some(MSG_ALREADY_PROCESSING.to_string());
            return;
        }
        let source = MediaSource::Link {
            url: url.to_string(),
        };
        self.begin_transcription(source, None, effects);
    }

    fn begin_transcription(
        &mut self,
        source: MediaSource,
        filename: Option<String>,
        effects: &mut Vec<Effect>,
    ) {
        self.progress = 0;
        self.status_message = STATUS_UPLOADING.to_string();
        let request = self.issue_submission();
        self.transcription = Some(TranscriptionJob {
            request,
            handle: None,
            pending: PendingItem {
                category: self.selected_category.clone(),
                language: self.language.clone(),
                filename,
            },
        });
        engine_info!(
            "Submitting transcription {} source={:?} category={}",
            request,
            source,
            self.selected_category
        );
        effects.push(Effect::SubmitTranscription {
            request,
            source,
            options: self.transcription_options(),
        });
    }

    fn transcription_options(&self) -> TranscriptionOptions {
        TranscriptionOptions {
            language: self.language.clone(),
            model_size: self.model.model_size().to_string(),
            diarize: self.diarize,
        }
    }

    pub(crate) fn request_link_fetch(
        &mut self,
        url: &str,
        auto_transcribe: bool,
        effects: &mut Vec<Effect>,
    ) {
        self.error = None;
        let url = url.trim();
        if url.is_empty() {
            self.error = Some(MSG_NO_LINK.to_string());
            return;
        }
        if self.is_fetching_link() {
            self.error = Some(MSG_ALREADY_FETCHING.to_string());
            return;
        }
        let request = self.issue_submission();
        self.fetch = Some(FetchJob {
            request,
            handle: None,
            job_id: None,
            auto_transcribe,
        });
        self.fetch_progress = 0;
        engine_info!("Submitting link fetch {} url={}", request, url);
        effects.push(Effect::SubmitFetch {
            request,
            url: url.to_string(),
        });
    }

    pub(crate) fn on_submitted(
        &mut self,
        kind: JobKind,
        request: SubmissionId,
        result: Result<Submission, String>,
        effects: &mut Vec<Effect>,
    ) {
        if self.awaiting_submission(kind) != Some(request) {
            engine_debug!("Ignoring stale {} submission outcome {}", kind, request);
            return;
        }

        let submission = match result {
            Ok(submission) => submission,
            Err(error) => {
                engine_warn!("{} submission failed: {}", kind, error);
                match kind {
                    JobKind::Transcription => {
                        self.transcription = None;
                        self.status_message.clear();
                    }
                    JobKind::Fetch => self.fetch = None,
                }
                self.error = Some(error);
                return;
            }
        };

        engine_info!(
            "{} accepted: handle={} job_id={}",
            kind,
            submission.handle,
            submission.job_id
        );
        match kind {
            JobKind::Transcription => {
                if let Some(job) = self.transcription.as_mut() {
                    job.handle = Some(submission.handle.clone());
                }
                self.status_message = STATUS_STARTED.to_string();
            }
            JobKind::Fetch => {
                if let Some(job) = self.fetch.as_mut() {
                    job.handle = Some(submission.handle.clone());
                    job.job_id = Some(submission.job_id);
                }
            }
        }
        effects.push(Effect::TrackJob {
            kind,
            handle: submission.handle,
        });
    }

    /// Poll messages for handles other than the tracked one are stale.
    fn is_tracked(&self, kind: JobKind, handle: &JobHandle) -> bool {
        let tracked = match kind {
            JobKind::Transcription => self.tracked_transcription(),
            JobKind::Fetch => self.tracked_fetch(),
        };
        let matches = tracked == Some(handle);
        if !matches {
            engine_debug!("Ignoring stale {} poll message for {}", kind, handle);
        }
        matches
    }

    pub(crate) fn on_progress(&mut self, kind: JobKind, handle: &JobHandle, progress: u8) {
        if !self.is_tracked(kind, handle) {
            return;
        }
        let progress = progress.min(100);
        match kind {
            JobKind::Transcription => {
                self.progress = progress;
                self.status_message = format!("Processing... {progress}%");
            }
            JobKind::Fetch => self.fetch_progress = progress,
        }
    }

    pub(crate) fn on_succeeded(
        &mut self,
        kind: JobKind,
        handle: &JobHandle,
        result: Value,
        at: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) {
        if !self.is_tracked(kind, handle) {
            return;
        }
        match kind {
            JobKind::Transcription => self.complete_transcription(result, at, effects),
            JobKind::Fetch => self.complete_fetch(result, effects),
        }
    }

    pub(crate) fn on_failed(&mut self, kind: JobKind, handle: &JobHandle, error: String) {
        if !self.is_tracked(kind, handle) {
            return;
        }
        engine_warn!("{} job {} failed: {}", kind, handle, error);
        let fallback = match kind {
            JobKind::Transcription => {
                self.transcription = None;
                self.status_message.clear();
                MSG_TRANSCRIPTION_FAILED
            }
            JobKind::Fetch => {
                self.fetch = None;
                MSG_FETCH_FAILED
            }
        };
        self.error = Some(non_empty_or(error, fallback));
    }

    fn complete_transcription(
        &mut self,
        result: Value,
        at: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) {
        let Some(job) = self.transcription.take() else {
            return;
        };
        let result = match parse_transcription(result) {
            Ok(result) => result,
            Err(error) => {
                engine_warn!("Transcription finished without a usable result: {}", error);
                self.status_message.clear();
                self.error = Some(error);
                return;
            }
        };

        let id = result.job_id.clone();
        let filename = job
            .pending
            .filename
            .or_else(|| result.original_filename.clone())
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
        let item = HistoryItem {
            id: id.clone(),
            filename,
            language: job.pending.language,
            created_at: at,
            category_id: job.pending.category.category_id().map(str::to_string),
            result,
        };
        self.history.append(item, &self.categories);
        self.persist_history(effects);

        self.progress = 100;
        self.status_message = STATUS_COMPLETE.to_string();
        self.selected_file = None;
        self.selected_remote = None;
        engine_info!("Transcription {} complete; history size {}", id, self.history.len());

        self.open_result = Some(id.clone());
        effects.push(Effect::Persist {
            key: StorageKey::OpenResult,
            value: id.clone(),
        });
        let url = self.url.clone().with_job(Some(&id));
        self.navigate(url, NavigationMode::Push, effects);
    }

    fn complete_fetch(&mut self, result: Value, effects: &mut Vec<Effect>) {
        let Some(job) = self.fetch.take() else {
            return;
        };
        if let Some(error) = reported_failure(&result) {
            self.error = Some(non_empty_or(error, MSG_FETCH_FAILED));
            return;
        }
        let job_id = result
            .get("job_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(job.job_id);
        let Some(job_id) = job_id else {
            self.error = Some(MSG_MALFORMED_RESULT.to_string());
            return;
        };
        let remote = RemoteMedia {
            job_id,
            title: result
                .get("original_filename")
                .and_then(Value::as_str)
                .filter(|title| !title.is_empty())
                .unwrap_or(FALLBACK_FILENAME)
                .to_string(),
            size_bytes: result.get("size_bytes").and_then(Value::as_u64),
        };
        engine_info!("Link fetched as {} ({})", remote.job_id, remote.title);

        self.fetch_progress = 100;
        self.selected_remote = Some(remote);
        self.selected_file = None;
        self.status_message = STATUS_FETCHED.to_string();

        if job.auto_transcribe {
            self.request_transcription(effects);
        }
    }

    pub(crate) fn reset(&mut self, effects: &mut Vec<Effect>) {
        if let Some(handle) = self.tracked_transcription().cloned() {
            effects.push(Effect::CancelTracking { handle });
        }
        self.selected_file = None;
        self.selected_remote = None;
        self.transcription = None;
        self.progress = 0;
        self.status_message.clear();
        self.error = None;
        self.close_result(effects);
    }
}

/// The service reports in-task failures as a successful task whose payload
/// carries `success: false`.
fn reported_failure(result: &Value) -> Option<String> {
    if result.get("success") != Some(&Value::Bool(false)) {
        return None;
    }
    Some(
        result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    )
}

fn parse_transcription(result: Value) -> Result<TranscriptionResult, String> {
    if let Some(error) = reported_failure(&result) {
        return Err(non_empty_or(error, MSG_TRANSCRIPTION_FAILED));
    }
    serde_json::from_value::<TranscriptionResult>(result)
        .ok()
        .filter(|result| !result.job_id.is_empty())
        .ok_or_else(|| MSG_MALFORMED_RESULT.to_string())
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
