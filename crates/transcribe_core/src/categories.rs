use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::history::HistoryStore;
use crate::model::{Category, CategoryFilter, DEFAULT_CATEGORY_EMOJI, DEFAULT_CATEGORY_NAME};

/// User-created categories in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryIndex {
    categories: Vec<Category>,
}

/// Per-partition item counts. Every item lands in exactly one partition, so
/// `uncategorized` plus the live category counts always equals `all`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryCounts {
    pub all: usize,
    pub uncategorized: usize,
    pub by_category: BTreeMap<String, usize>,
}

impl CategoryCounts {
    pub fn for_filter(&self, filter: &CategoryFilter) -> usize {
        match filter {
            CategoryFilter::All => self.all,
            CategoryFilter::Uncategorized => self.uncategorized,
            CategoryFilter::Category(id) => self.by_category.get(id).copied().unwrap_or(0),
        }
    }
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from persisted categories, dropping duplicate ids and
    /// filling in missing emoji.
    pub fn restore(categories: Vec<Category>) -> Self {
        let mut index = Self::new();
        for mut category in categories {
            if index.contains(&category.id) {
                continue;
            }
            if category.emoji.trim().is_empty() {
                category.emoji = DEFAULT_CATEGORY_EMOJI.to_string();
            }
            index.categories.push(category);
        }
        index
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    /// Whether `filter` still selects something that exists.
    pub fn resolves(&self, filter: &CategoryFilter) -> bool {
        match filter {
            CategoryFilter::All | CategoryFilter::Uncategorized => true,
            CategoryFilter::Category(id) => self.contains(id),
        }
    }

    /// Creates a category and returns its id. Ids derive from the creation
    /// time in milliseconds, bumped until unique.
    pub fn create(&mut self, name: &str, created_at: DateTime<Utc>) -> String {
        let mut millis = created_at.timestamp_millis();
        let mut id = format!("cat_{millis}");
        while self.contains(&id) {
            millis += 1;
            id = format!("cat_{millis}");
        }

        let name = match name.trim() {
            "" => DEFAULT_CATEGORY_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        self.categories.push(Category {
            id: id.clone(),
            name,
            created_at,
            emoji: DEFAULT_CATEGORY_EMOJI.to_string(),
        });
        id
    }

    /// A blank name keeps the current one. Returns false for unknown ids.
    pub fn rename(&mut self, id: &str, name: &str) -> bool {
        let Some(category) = self.get_mut(id) else {
            return false;
        };
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            category.name = trimmed.to_string();
        }
        true
    }

    /// A blank emoji resets to the folder glyph. Returns false for unknown ids.
    pub fn set_emoji(&mut self, id: &str, emoji: &str) -> bool {
        let Some(category) = self.get_mut(id) else {
            return false;
        };
        category.emoji = match emoji.trim() {
            "" => DEFAULT_CATEGORY_EMOJI.to_string(),
            trimmed => trimmed.to_string(),
        };
        true
    }

    /// Removes the category only. Cascading to history is the caller's job so
    /// both collections change in the same update.
    pub fn remove(&mut self, id: &str) -> Option<Category> {
        let position = self.categories.iter().position(|c| c.id == id)?;
        Some(self.categories.remove(position))
    }

    pub fn counts(&self, history: &HistoryStore) -> CategoryCounts {
        let mut counts = CategoryCounts {
            all: history.len(),
            uncategorized: 0,
            by_category: self
                .categories
                .iter()
                .map(|category| (category.id.clone(), 0))
                .collect(),
        };
        for item in history.items() {
            match item
                .category_id
                .as_deref()
                .and_then(|id| counts.by_category.get_mut(id))
            {
                Some(count) => *count += 1,
                None => counts.uncategorized += 1,
            }
        }
        counts
    }
}
