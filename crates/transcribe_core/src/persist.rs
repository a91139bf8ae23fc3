//! Keys and (de)serialization for the session's string-keyed storage.
//!
//! Reads are lenient: a missing key, an unparseable document or a malformed
//! element all degrade to "nothing stored" for that piece of data.

use engine_logging::{engine_error, engine_warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::model::{Category, HistoryItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    History,
    Categories,
    SelectedCategory,
    OpenResult,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::History,
        StorageKey::Categories,
        StorageKey::SelectedCategory,
        StorageKey::OpenResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::History => "transcriptionHistory",
            StorageKey::Categories => "transcriptionCategories",
            StorageKey::SelectedCategory => "transcriptionSelectedCategory",
            StorageKey::OpenResult => "transcriptionOpenResultId",
        }
    }
}

/// Raw stored values handed to the session at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistedSnapshot {
    pub history: Option<String>,
    pub categories: Option<String>,
    pub selected_category: Option<String>,
    pub open_result: Option<String>,
}

impl PersistedSnapshot {
    pub fn get(&self, key: StorageKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    pub fn set(&mut self, key: StorageKey, value: Option<String>) {
        *self.slot_mut(key) = value;
    }

    fn slot(&self, key: StorageKey) -> &Option<String> {
        match key {
            StorageKey::History => &self.history,
            StorageKey::Categories => &self.categories,
            StorageKey::SelectedCategory => &self.selected_category,
            StorageKey::OpenResult => &self.open_result,
        }
    }

    fn slot_mut(&mut self, key: StorageKey) -> &mut Option<String> {
        match key {
            StorageKey::History => &mut self.history,
            StorageKey::Categories => &mut self.categories,
            StorageKey::SelectedCategory => &mut self.selected_category,
            StorageKey::OpenResult => &mut self.open_result,
        }
    }
}

pub fn decode_history(raw: Option<&str>) -> Vec<HistoryItem> {
    decode_list(StorageKey::History, raw)
}

pub fn decode_categories(raw: Option<&str>) -> Vec<Category> {
    decode_list(StorageKey::Categories, raw)
}

pub(crate) fn encode_list<T: Serialize>(key: StorageKey, items: &[T]) -> Option<String> {
    match serde_json::to_string(items) {
        Ok(json) => Some(json),
        Err(err) => {
            engine_error!("Failed to serialize {}: {}", key.as_str(), err);
            None
        }
    }
}

fn decode_list<T: DeserializeOwned>(key: StorageKey, raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let elements = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(elements)) => elements,
        Ok(_) => {
            engine_warn!("Ignoring {}: stored value is not a list", key.as_str());
            return Vec::new();
        }
        Err(err) => {
            engine_warn!("Ignoring {}: {}", key.as_str(), err);
            return Vec::new();
        }
    };

    elements
        .into_iter()
        .filter_map(|element| match serde_json::from_value(element) {
            Ok(item) => Some(item),
            Err(err) => {
                engine_warn!("Skipping malformed entry in {}: {}", key.as_str(), err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_degrades_to_empty() {
        assert!(decode_history(None).is_empty());
        assert!(decode_history(Some("not json")).is_empty());
        assert!(decode_categories(Some("{\"a\":1}")).is_empty());
    }

    #[test]
    fn malformed_elements_are_skipped() {
        let raw = r#"[
            {"id":"cat_1","name":"A","createdAt":"2024-01-01T00:00:00Z"},
            {"name":"no id"}
        ]"#;
        let categories = decode_categories(Some(raw));
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].emoji, crate::model::DEFAULT_CATEGORY_EMOJI);
    }

    #[test]
    fn legacy_timestamp_field_is_accepted() {
        let raw = r#"[{
            "id":"abc","filename":"a.mp3","language":"ko",
            "timestamp":"2024-01-01T00:00:00.000Z",
            "result":{"job_id":"abc","text":"hi","srt_file":"outputs/abc.srt"}
        }]"#;
        let items = decode_history(Some(raw));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].result.text, "hi");
        assert!(items[0].result.extra.contains_key("srt_file"));
    }
}
