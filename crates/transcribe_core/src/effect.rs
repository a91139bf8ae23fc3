use crate::{
    JobHandle, JobKind, MediaSource, StorageKey, SubmissionId, TranscriptionOptions, UrlState,
};

/// Side effects requested by [`crate::update`]. The host runs them and feeds
/// outcomes back as messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitTranscription {
        request: SubmissionId,
        source: MediaSource,
        options: TranscriptionOptions,
    },
    SubmitFetch {
        request: SubmissionId,
        url: String,
    },
    TrackJob {
        kind: JobKind,
        handle: JobHandle,
    },
    /// Stop polling a handle the session no longer cares about.
    CancelTracking {
        handle: JobHandle,
    },
    UpdateRemoteText {
        job_id: String,
        text: String,
    },
    /// Best-effort; the outcome only matters for logging.
    DeleteRemoteJob {
        job_id: String,
    },
    Persist {
        key: StorageKey,
        value: String,
    },
    Forget {
        key: StorageKey,
    },
    Navigate {
        url: UrlState,
        mode: NavigationMode,
    },
    /// Subscribe to back/forward events. Emitted at most once per session.
    ListenForNavigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Adds a history entry.
    Push,
    /// Rewrites the current entry.
    Replace,
}
