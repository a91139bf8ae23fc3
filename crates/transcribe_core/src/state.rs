use crate::persist::encode_list;
use crate::view_model::{
    AppViewModel, CategoryRowView, HistoryRowView, OpenResultView, SelectedInputView,
};
use crate::{
    CategoryCounts, CategoryFilter, CategoryIndex, Effect, HistoryItem, HistoryStore, JobHandle,
    JobKind, ModelPreset, RemoteMedia, SelectedFile, StorageKey, SubmissionId, UrlState,
    DEFAULT_LANGUAGE,
};

/// Snapshot taken when a transcription is submitted; applied to the history
/// item once the job succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingItem {
    pub category: CategoryFilter,
    pub language: String,
    pub filename: Option<String>,
}

/// A transcription job between submit and terminal state. `handle` is `None`
/// until the service accepts the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TranscriptionJob {
    pub request: SubmissionId,
    pub handle: Option<JobHandle>,
    pub pending: PendingItem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchJob {
    pub request: SubmissionId,
    pub handle: Option<JobHandle>,
    pub job_id: Option<String>,
    pub auto_transcribe: bool,
}

/// The whole session: inputs, in-flight jobs, history, categories and the
/// selection mirrored into the address bar.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) selected_file: Option<SelectedFile>,
    pub(crate) selected_remote: Option<RemoteMedia>,
    pub(crate) language: String,
    pub(crate) model: ModelPreset,
    pub(crate) diarize: bool,

    pub(crate) transcription: Option<TranscriptionJob>,
    pub(crate) progress: u8,
    pub(crate) status_message: String,
    pub(crate) fetch: Option<FetchJob>,
    pub(crate) fetch_progress: u8,
    pub(crate) last_submission: u64,
    pub(crate) error: Option<String>,

    pub(crate) history: HistoryStore,
    pub(crate) categories: CategoryIndex,
    pub(crate) selected_category: CategoryFilter,
    pub(crate) open_result: Option<String>,
    pub(crate) url: UrlState,
    pub(crate) listening_for_navigation: bool,

    pub(crate) shared_mode: bool,
    pub(crate) shared_by: Option<String>,
    pub(crate) show_timestamps: bool,
    pub(crate) show_speakers: bool,

    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            selected_file: None,
            selected_remote: None,
            language: DEFAULT_LANGUAGE.to_string(),
            model: ModelPreset::default(),
            diarize: false,
            transcription: None,
            progress: 0,
            status_message: String::new(),
            fetch: None,
            fetch_progress: 0,
            last_submission: 0,
            error: None,
            history: HistoryStore::new(),
            categories: CategoryIndex::new(),
            selected_category: CategoryFilter::All,
            open_result: None,
            url: UrlState::default(),
            listening_for_navigation: false,
            shared_mode: false,
            shared_by: None,
            show_timestamps: false,
            show_speakers: true,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    pub fn counts(&self) -> CategoryCounts {
        self.categories.counts(&self.history)
    }

    pub fn selected_category(&self) -> &CategoryFilter {
        &self.selected_category
    }

    pub fn open_result_id(&self) -> Option<&str> {
        self.open_result.as_deref()
    }

    pub fn open_result(&self) -> Option<&HistoryItem> {
        self.open_result
            .as_deref()
            .and_then(|id| self.history.get(id))
    }

    /// Last address the session pushed, replaced, or was navigated to.
    pub fn url(&self) -> &UrlState {
        &self.url
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.transcription.is_some()
    }

    pub fn is_fetching_link(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn selected_remote(&self) -> Option<&RemoteMedia> {
        self.selected_remote.as_ref()
    }

    /// Handle of the transcription job being polled, if any.
    pub fn tracked_transcription(&self) -> Option<&JobHandle> {
        self.transcription.as_ref().and_then(|job| job.handle.as_ref())
    }

    pub fn tracked_fetch(&self) -> Option<&JobHandle> {
        self.fetch.as_ref().and_then(|job| job.handle.as_ref())
    }

    /// The submission of `kind` still waiting for the service to answer.
    pub fn awaiting_submission(&self, kind: JobKind) -> Option<SubmissionId> {
        match kind {
            JobKind::Transcription => self
                .transcription
                .as_ref()
                .filter(|job| job.handle.is_none())
                .map(|job| job.request),
            JobKind::Fetch => self
                .fetch
                .as_ref()
                .filter(|job| job.handle.is_none())
                .map(|job| job.request),
        }
    }

    pub(crate) fn issue_submission(&mut self) -> SubmissionId {
        self.last_submission += 1;
        SubmissionId::new(self.last_submission)
    }

    /// Items in the currently selected partition, newest first.
    pub fn filtered_history(&self) -> Vec<&HistoryItem> {
        self.history
            .items()
            .iter()
            .filter(|item| match &self.selected_category {
                CategoryFilter::All => true,
                CategoryFilter::Uncategorized => item.category_id.is_none(),
                CategoryFilter::Category(id) => item.category_id.as_deref() == Some(id.as_str()),
            })
            .collect()
    }

    pub fn view(&self) -> AppViewModel {
        let counts = self.counts();
        let processing = self.is_processing();
        AppViewModel {
            is_processing: processing,
            is_uploading: processing && self.progress < 10,
            is_transcribing: processing && self.progress >= 10,
            progress: self.progress,
            status_message: self.status_message.clone(),
            error: self.error.clone(),
            link_fetching: self.is_fetching_link(),
            link_fetch_progress: self.fetch_progress,
            selected_input: self.selected_input_view(),
            language: self.language.clone(),
            model: self.model,
            diarize: self.diarize,
            selected_category: self.selected_category.clone(),
            total_count: counts.all,
            uncategorized_count: counts.uncategorized,
            categories: self
                .categories
                .categories()
                .iter()
                .map(|category| CategoryRowView {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    emoji: category.emoji.clone(),
                    count: counts.by_category.get(&category.id).copied().unwrap_or(0),
                })
                .collect(),
            history: self
                .filtered_history()
                .into_iter()
                .map(|item| HistoryRowView {
                    id: item.id.clone(),
                    filename: item.filename.clone(),
                    language: item.language.clone(),
                    created_at: item.created_at,
                    category_id: item.category_id.clone(),
                    is_open: self.open_result.as_deref() == Some(item.id.as_str()),
                })
                .collect(),
            open_result: self.open_result().map(|item| OpenResultView {
                id: item.id.clone(),
                filename: item.filename.clone(),
                text: item.result.text.clone(),
                edited_at: item.result.edited_at,
                speaker_turns: item.result.speaker_turns(),
                show_timestamps: self.show_timestamps,
                show_speakers: self.show_speakers,
            }),
            shared_mode: self.shared_mode,
            shared_by: self.shared_by.clone(),
            dirty: self.dirty,
        }
    }

    fn selected_input_view(&self) -> Option<SelectedInputView> {
        if let Some(remote) = &self.selected_remote {
            return Some(SelectedInputView::Remote {
                title: remote.title.clone(),
                size_bytes: remote.size_bytes,
            });
        }
        self.selected_file
            .as_ref()
            .map(|file| SelectedInputView::File {
                name: file.name.clone(),
            })
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn persist_history(&self, effects: &mut Vec<Effect>) {
        if let Some(value) = encode_list(StorageKey::History, self.history.items()) {
            effects.push(Effect::Persist {
                key: StorageKey::History,
                value,
            });
        }
    }

    pub(crate) fn persist_categories(&self, effects: &mut Vec<Effect>) {
        if let Some(value) = encode_list(StorageKey::Categories, self.categories.categories()) {
            effects.push(Effect::Persist {
                key: StorageKey::Categories,
                value,
            });
        }
    }

    pub(crate) fn persist_selected_category(&self, effects: &mut Vec<Effect>) {
        effects.push(Effect::Persist {
            key: StorageKey::SelectedCategory,
            value: self.selected_category.as_str().to_string(),
        });
    }
}
