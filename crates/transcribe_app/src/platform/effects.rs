use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use engine_logging::{engine_debug, engine_info, engine_warn};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use transcribe_core::{
    Effect, JobHandle, JobKind, MediaSource, Msg, NavigationMode, Submission,
    TranscriptionOptions,
};
use transcribe_engine::{
    JobPoller, KeyValueStorage, PollHandle, PollSink, RemoteError, RemoteService, SubmittedJob,
    TranscriptionInput, TranscriptionRequest,
};

use super::persistence::SessionFile;

/// Runs the effects `update` asks for. Storage and address changes apply
/// immediately; remote calls run as tasks whose outcomes come back as messages.
pub(crate) struct EffectRunner {
    remote: Arc<dyn RemoteService>,
    poller: JobPoller,
    session: SessionFile,
    polls: HashMap<JobHandle, PollHandle>,
    in_flight: Arc<AtomicUsize>,
    msg_tx: UnboundedSender<Msg>,
}

impl EffectRunner {
    pub(crate) fn new(
        remote: Arc<dyn RemoteService>,
        session: SessionFile,
        msg_tx: UnboundedSender<Msg>,
    ) -> Self {
        Self {
            poller: JobPoller::new(remote.clone()),
            remote,
            session,
            polls: HashMap::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            msg_tx,
        }
    }

    pub(crate) fn session(&self) -> &SessionFile {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut SessionFile {
        &mut self.session
    }

    pub(crate) fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run_one(effect);
        }
    }

    /// No request outstanding and no poll loop alive.
    pub(crate) fn is_idle(&mut self) -> bool {
        self.polls.retain(|_, poll| !poll.is_finished());
        self.in_flight.load(Ordering::SeqCst) == 0 && self.polls.is_empty()
    }

    pub(crate) fn shutdown(&mut self) {
        for (handle, poll) in self.polls.drain() {
            engine_info!("Stopping poll for {} on shutdown", handle);
            poll.cancel();
        }
    }

    fn run_one(&mut self, effect: Effect) {
        match effect {
            Effect::SubmitTranscription {
                request,
                source,
                options,
            } => {
                let body = transcription_request(source, options);
                engine_info!("Submitting transcription {} {:?}", request, body.input);
                let remote = self.remote.clone();
                self.spawn_request(async move {
                    let result = remote.submit_transcription(&body).await;
                    Msg::Submitted {
                        kind: JobKind::Transcription,
                        request,
                        result: submission(JobKind::Transcription, result),
                    }
                });
            }
            Effect::SubmitFetch { request, url } => {
                engine_info!("Submitting link fetch {} url={}", request, url);
                let remote = self.remote.clone();
                self.spawn_request(async move {
                    let result = remote.submit_fetch(&url).await;
                    Msg::Submitted {
                        kind: JobKind::Fetch,
                        request,
                        result: submission(JobKind::Fetch, result),
                    }
                });
            }
            Effect::TrackJob { kind, handle } => {
                let sink = Arc::new(ChannelPollSink {
                    kind,
                    handle: handle.clone(),
                    tx: self.msg_tx.clone(),
                });
                let poll = self
                    .poller
                    .track(handle.as_str(), kind.poll_interval(), sink);
                if let Some(previous) = self.polls.insert(handle, poll) {
                    previous.cancel();
                }
            }
            Effect::CancelTracking { handle } => {
                if let Some(poll) = self.polls.remove(&handle) {
                    poll.cancel();
                }
            }
            Effect::UpdateRemoteText { job_id, text } => {
                let remote = self.remote.clone();
                self.spawn_request(async move {
                    let result = remote
                        .update_text(&job_id, &text)
                        .await
                        .map_err(|err| {
                            engine_warn!("Text update for {} failed: {}", job_id, err);
                            err.user_message()
                        });
                    Msg::EditCompleted {
                        job_id,
                        text,
                        result,
                        at: Utc::now(),
                    }
                });
            }
            Effect::DeleteRemoteJob { job_id } => {
                let remote = self.remote.clone();
                self.spawn_request(async move {
                    let remote = remote.delete_job(&job_id).await.map_err(|err| err.to_string());
                    Msg::DeleteCompleted { job_id, remote }
                });
            }
            Effect::Persist { key, value } => {
                if let Err(err) = self.session.set(key.as_str(), &value) {
                    engine_warn!("Failed to persist {}: {}", key.as_str(), err);
                }
            }
            Effect::Forget { key } => {
                if let Err(err) = self.session.remove(key.as_str()) {
                    engine_warn!("Failed to forget {}: {}", key.as_str(), err);
                }
            }
            Effect::Navigate { url, mode } => {
                let query = url.to_query();
                self.session.navigate(|history| match mode {
                    NavigationMode::Push => history.push(query),
                    NavigationMode::Replace => history.replace(query),
                });
            }
            Effect::ListenForNavigation => {
                if !self.session.navigate(|history| history.listen()) {
                    engine_debug!("Navigation listener already registered");
                }
            }
        }
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let tx = self.msg_tx.clone();
        let in_flight = self.in_flight.clone();
        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let msg = request.await;
            let _ = tx.send(msg);
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

/// Forwards poll callbacks for one handle into the message loop.
struct ChannelPollSink {
    kind: JobKind,
    handle: JobHandle,
    tx: UnboundedSender<Msg>,
}

impl PollSink for ChannelPollSink {
    fn on_progress(&self, progress: u8) {
        let _ = self.tx.send(Msg::JobProgress {
            kind: self.kind,
            handle: self.handle.clone(),
            progress,
        });
    }

    fn on_success(&self, result: Value) {
        let _ = self.tx.send(Msg::JobSucceeded {
            kind: self.kind,
            handle: self.handle.clone(),
            result,
            at: Utc::now(),
        });
    }

    fn on_failure(&self, error: String) {
        let _ = self.tx.send(Msg::JobFailed {
            kind: self.kind,
            handle: self.handle.clone(),
            error,
        });
    }
}

fn transcription_request(
    source: MediaSource,
    options: TranscriptionOptions,
) -> TranscriptionRequest {
    let input = match source {
        MediaSource::File(file) => TranscriptionInput::Upload {
            path: file.path,
            file_name: file.name,
        },
        MediaSource::Downloaded { job_id } => TranscriptionInput::Downloaded { job_id },
        MediaSource::Link { url } => TranscriptionInput::Link { url },
    };
    TranscriptionRequest {
        input,
        language: options.language,
        model_size: options.model_size,
        diarize: options.diarize,
    }
}

fn submission(
    kind: JobKind,
    result: Result<SubmittedJob, RemoteError>,
) -> Result<Submission, String> {
    result
        .map(|job| Submission {
            handle: JobHandle::new(job.task_id),
            job_id: job.job_id,
        })
        .map_err(|err| {
            engine_warn!("{} submission failed: {}", kind, err);
            err.user_message()
        })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use transcribe_core::SelectedFile;
    use transcribe_engine::RemoteErrorKind;

    use super::*;

    #[test]
    fn file_source_becomes_upload() {
        let request = transcription_request(
            MediaSource::File(SelectedFile {
                name: "talk.mp4".to_string(),
                path: PathBuf::from("/media/talk.mp4"),
            }),
            TranscriptionOptions {
                language: "en".to_string(),
                model_size: "small".to_string(),
                diarize: true,
            },
        );
        assert_eq!(
            request.input,
            TranscriptionInput::Upload {
                path: PathBuf::from("/media/talk.mp4"),
                file_name: "talk.mp4".to_string(),
            }
        );
        assert_eq!(request.model_size, "small");
        assert!(request.diarize);
    }

    #[test]
    fn submission_uses_task_id_as_handle() {
        let ok = submission(
            JobKind::Transcription,
            Ok(SubmittedJob {
                job_id: "abc123".to_string(),
                task_id: "task-1".to_string(),
                status: Some("processing".to_string()),
            }),
        )
        .unwrap();
        assert_eq!(ok.handle, JobHandle::new("task-1"));
        assert_eq!(ok.job_id, "abc123");

        let err = submission(
            JobKind::Fetch,
            Err(RemoteError::new(
                RemoteErrorKind::Rejected {
                    status: 400,
                    detail: "Not a valid URL".to_string(),
                },
                "400 Bad Request",
            )),
        )
        .unwrap_err();
        assert_eq!(err, "Not a valid URL");
    }
}
