use chrono::{DateTime, Utc};

use crate::categories::CategoryIndex;
use crate::model::{HistoryItem, HISTORY_LIMIT};

/// Most-recent-first list of completed jobs, bounded to [`HISTORY_LIMIT`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryStore {
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted items, keeping the first occurrence of
    /// each id and clearing references to categories that no longer exist.
    pub fn restore(items: Vec<HistoryItem>, categories: &CategoryIndex) -> Self {
        let mut store = Self::new();
        for mut item in items {
            if store.get(&item.id).is_some() {
                continue;
            }
            if let Some(category_id) = item.category_id.as_deref() {
                if !categories.contains(category_id) {
                    item.category_id = None;
                }
            }
            store.items.push(item);
        }
        store.items.truncate(HISTORY_LIMIT);
        store
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut HistoryItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Prepends `item`, replacing any older entry with the same id, and evicts
    /// beyond the capacity bound. The category tag is dropped unless it names
    /// a live category.
    pub fn append(&mut self, mut item: HistoryItem, categories: &CategoryIndex) {
        if let Some(category_id) = item.category_id.as_deref() {
            if !categories.contains(category_id) {
                item.category_id = None;
            }
        }
        self.items.retain(|existing| existing.id != item.id);
        self.items.insert(0, item);
        self.items.truncate(HISTORY_LIMIT);
    }

    /// Returns false if no item has this id.
    pub fn rename(&mut self, id: &str, filename: &str) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.filename = filename.to_string();
                true
            }
            None => false,
        }
    }

    /// Mirrors an edit the remote service already accepted.
    pub fn apply_edit(&mut self, id: &str, text: &str, edited_at: DateTime<Utc>) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.result.text = text.to_string();
                item.result.edited_at = Some(edited_at);
                true
            }
            None => false,
        }
    }

    /// Sets or clears the item's category. Callers validate `category_id`.
    pub fn assign_category(&mut self, id: &str, category_id: Option<String>) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.category_id = category_id;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<HistoryItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(position))
    }

    /// Clears every reference to `category_id`; returns how many items changed.
    pub fn uncategorize(&mut self, category_id: &str) -> usize {
        let mut changed = 0;
        for item in &mut self.items {
            if item.category_id.as_deref() == Some(category_id) {
                item.category_id = None;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptionResult;

    fn item(id: &str) -> HistoryItem {
        HistoryItem {
            id: id.to_string(),
            filename: format!("{id}.mp3"),
            language: "en".to_string(),
            created_at: Utc::now(),
            category_id: None,
            result: TranscriptionResult::new(id, "text"),
        }
    }

    #[test]
    fn append_is_newest_first_and_bounded() {
        let categories = CategoryIndex::new();
        let mut store = HistoryStore::new();
        for n in 0..(HISTORY_LIMIT + 3) {
            let before = store.len();
            store.append(item(&format!("job{n}")), &categories);
            assert_eq!(store.len(), (before + 1).min(HISTORY_LIMIT));
            assert_eq!(store.items()[0].id, format!("job{n}"));
        }
        assert!(store.get("job0").is_none());
        assert!(store.get("job3").is_some());
    }

    #[test]
    fn append_drops_unknown_category() {
        let categories = CategoryIndex::new();
        let mut store = HistoryStore::new();
        let mut tagged = item("a");
        tagged.category_id = Some("cat_missing".to_string());
        store.append(tagged, &categories);
        assert_eq!(store.items()[0].category_id, None);
    }

    #[test]
    fn append_replaces_duplicate_id() {
        let categories = CategoryIndex::new();
        let mut store = HistoryStore::new();
        store.append(item("a"), &categories);
        store.append(item("b"), &categories);
        store.append(item("a"), &categories);
        let ids: Vec<_> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn mutations_on_unknown_ids_report_false() {
        let mut store = HistoryStore::new();
        assert!(!store.rename("nope", "x"));
        assert!(!store.apply_edit("nope", "x", Utc::now()));
        assert!(!store.assign_category("nope", None));
        assert!(store.remove("nope").is_none());
    }
}
