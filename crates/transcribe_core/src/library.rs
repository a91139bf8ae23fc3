//! History and category mutations. Every mutation persists in the same update
//! that applies it.

use chrono::{DateTime, Utc};
use engine_logging::{engine_info, engine_warn};

use crate::{AppState, CategoryFilter, Effect, NavigationMode};

impl AppState {
    /// The service owns the text, so nothing changes locally until it confirms.
    pub(crate) fn request_edit(&mut self, job_id: String, text: String, effects: &mut Vec<Effect>) {
        self.error = None;
        effects.push(Effect::UpdateRemoteText { job_id, text });
    }

    pub(crate) fn on_edit_completed(
        &mut self,
        job_id: &str,
        text: &str,
        result: Result<(), String>,
        at: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) {
        if let Err(error) = result {
            engine_warn!("Remote edit of {} failed: {}", job_id, error);
            self.error = Some(error);
            return;
        }
        if self.history.apply_edit(job_id, text, at) {
            self.persist_history(effects);
        }
    }

    pub(crate) fn rename_item(&mut self, job_id: &str, filename: &str, effects: &mut Vec<Effect>) {
        let filename = filename.trim();
        if filename.is_empty() {
            return;
        }
        if self.history.rename(job_id, filename) {
            self.persist_history(effects);
        }
    }

    /// `all`, `uncategorized` and `None` clear the category; unknown ids are
    /// rejected so no item ever points at a missing category.
    pub(crate) fn assign_item_category(
        &mut self,
        job_id: &str,
        category_id: Option<&str>,
        effects: &mut Vec<Effect>,
    ) {
        let target = match category_id.map(CategoryFilter::parse) {
            None | Some(CategoryFilter::All) | Some(CategoryFilter::Uncategorized) => None,
            Some(CategoryFilter::Category(id)) if self.categories.contains(&id) => Some(id),
            Some(CategoryFilter::Category(id)) => {
                engine_warn!("Refusing to move {} into unknown category {}", job_id, id);
                return;
            }
        };
        if self.history.assign_category(job_id, target) {
            self.persist_history(effects);
            self.ensure_selected_category_valid(NavigationMode::Push, effects);
        }
    }

    pub(crate) fn request_delete(&mut self, job_id: String, effects: &mut Vec<Effect>) {
        effects.push(Effect::DeleteRemoteJob { job_id });
    }

    /// Local cleanup runs whatever the remote said; the artifacts may already be gone.
    pub(crate) fn on_delete_completed(
        &mut self,
        job_id: &str,
        remote: Result<(), String>,
        effects: &mut Vec<Effect>,
    ) {
        if let Err(error) = remote {
            engine_warn!("Remote delete of {} failed (ignored): {}", job_id, error);
        }
        if self.history.remove(job_id).is_none() {
            return;
        }
        self.persist_history(effects);
        if self.open_result.as_deref() == Some(job_id) {
            self.close_result(effects);
        }
        self.ensure_selected_category_valid(NavigationMode::Push, effects);
    }

    pub(crate) fn create_category(
        &mut self,
        name: &str,
        at: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) -> String {
        let id = self.categories.create(name, at);
        engine_info!("Created category {}", id);
        self.persist_categories(effects);
        id
    }

    pub(crate) fn rename_category(&mut self, id: &str, name: &str, effects: &mut Vec<Effect>) {
        if self.categories.rename(id, name) {
            self.persist_categories(effects);
        }
    }

    pub(crate) fn set_category_emoji(&mut self, id: &str, emoji: &str, effects: &mut Vec<Effect>) {
        if self.categories.set_emoji(id, emoji) {
            self.persist_categories(effects);
        }
    }

    /// Cascades to history and the selection regardless of an open result.
    pub(crate) fn delete_category(&mut self, id: &str, effects: &mut Vec<Effect>) {
        if self.categories.remove(id).is_none() {
            return;
        }
        let cleared = self.history.uncategorize(id);
        engine_info!("Deleted category {}; {} items now uncategorized", id, cleared);

        if self.selected_category.category_id() == Some(id) {
            self.selected_category = CategoryFilter::All;
            self.persist_selected_category(effects);
            let url = self.url.clone().with_category(Some(CategoryFilter::ALL));
            self.navigate(url, NavigationMode::Replace, effects);
        }

        self.persist_categories(effects);
        self.persist_history(effects);
        self.ensure_selected_category_valid(NavigationMode::Push, effects);
    }
}
