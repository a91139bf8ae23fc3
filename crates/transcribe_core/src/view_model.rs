use chrono::{DateTime, Utc};

use crate::{CategoryFilter, ModelPreset, SpeakerTurn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub is_processing: bool,
    pub is_uploading: bool,
    pub is_transcribing: bool,
    pub progress: u8,
    pub status_message: String,
    pub error: Option<String>,
    pub link_fetching: bool,
    pub link_fetch_progress: u8,
    pub selected_input: Option<SelectedInputView>,
    pub language: String,
    pub model: ModelPreset,
    pub diarize: bool,
    pub selected_category: CategoryFilter,
    pub total_count: usize,
    pub uncategorized_count: usize,
    pub categories: Vec<CategoryRowView>,
    /// History rows in the selected partition.
    pub history: Vec<HistoryRowView>,
    pub open_result: Option<OpenResultView>,
    pub shared_mode: bool,
    pub shared_by: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedInputView {
    File { name: String },
    Remote { title: String, size_bytes: Option<u64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRowView {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub id: String,
    pub filename: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub category_id: Option<String>,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenResultView {
    pub id: String,
    pub filename: String,
    pub text: String,
    pub edited_at: Option<DateTime<Utc>>,
    /// Diarization turns; empty when the job was not diarized.
    pub speaker_turns: Vec<SpeakerTurn>,
    pub show_timestamps: bool,
    pub show_speakers: bool,
}
