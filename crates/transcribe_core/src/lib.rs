//! Transcribe core: pure session state machine and view-model helpers.
//!
//! Nothing here performs I/O. [`update`] folds a [`Msg`] into [`AppState`]
//! and returns the [`Effect`]s the host must run: remote calls, poll
//! tracking, storage writes and address-bar updates.
mod categories;
mod effect;
mod history;
mod jobs;
mod library;
mod model;
mod msg;
mod persist;
mod selection;
mod state;
mod update;
mod url_state;
mod view_model;

pub use categories::{CategoryCounts, CategoryIndex};
pub use effect::{Effect, NavigationMode};
pub use history::HistoryStore;
pub use jobs::{
    MSG_ALREADY_FETCHING, MSG_ALREADY_PROCESSING, MSG_FETCH_FAILED, MSG_MALFORMED_RESULT,
    MSG_NO_FILE, MSG_NO_LINK, MSG_TRANSCRIPTION_FAILED,
};
pub use model::{
    Category, CategoryFilter, HistoryItem, JobHandle, JobKind, MediaSource, ModelPreset,
    RemoteMedia, SelectedFile, SpeakerTurn, SubmissionId, TranscriptionOptions,
    TranscriptionResult, DEFAULT_CATEGORY_EMOJI, DEFAULT_CATEGORY_NAME, DEFAULT_LANGUAGE,
    HISTORY_LIMIT,
};
pub use msg::{Msg, Submission};
pub use persist::{decode_categories, decode_history, PersistedSnapshot, StorageKey};
pub use state::AppState;
pub use update::update;
pub use url_state::UrlState;
pub use view_model::{
    AppViewModel, CategoryRowView, HistoryRowView, OpenResultView, SelectedInputView,
};
