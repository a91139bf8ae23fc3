//! Selection state and its mirror in the navigable address.
//!
//! User-initiated selection changes push a history entry; closing a result
//! rewrites the current entry; replaying back/forward never writes one.

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::persist::{decode_categories, decode_history};
use crate::{
    AppState, CategoryFilter, CategoryIndex, Effect, HistoryStore, NavigationMode,
    PersistedSnapshot, StorageKey, UrlState,
};

pub(crate) const MSG_RESTORED: &str = "Restored from history";
pub(crate) const MSG_OPENED: &str = "Loaded from history";

impl AppState {
    pub(crate) fn boot(
        &mut self,
        persisted: PersistedSnapshot,
        url: UrlState,
        effects: &mut Vec<Effect>,
    ) {
        self.categories =
            CategoryIndex::restore(decode_categories(persisted.get(StorageKey::Categories)));
        self.history = HistoryStore::restore(
            decode_history(persisted.get(StorageKey::History)),
            &self.categories,
        );
        self.selected_category = persisted
            .get(StorageKey::SelectedCategory)
            .map(CategoryFilter::parse)
            .unwrap_or_default();
        if let Some(cat) = url.cat.as_deref() {
            self.selected_category = CategoryFilter::parse(cat);
        }
        self.apply_share_params(&url);
        self.url = url;
        engine_info!(
            "Session restored: {} history items, {} categories, selection={}",
            self.history.len(),
            self.categories.categories().len(),
            self.selected_category
        );

        // The address wins over the stored fallback.
        let from_url = self.url.job.clone();
        let candidate = from_url
            .clone()
            .or_else(|| persisted.get(StorageKey::OpenResult).map(str::to_string));
        if let Some(id) = candidate {
            if self.history.get(&id).is_some() {
                self.open_result = Some(id);
                self.status_message = MSG_RESTORED.to_string();
            } else if from_url.is_some() {
                engine_warn!("Address names unknown result {}; dropping it", id);
                let url = self.url.clone().with_job(None);
                self.navigate(url, NavigationMode::Replace, effects);
            } else {
                effects.push(Effect::Forget {
                    key: StorageKey::OpenResult,
                });
            }
        }

        self.ensure_selected_category_valid(NavigationMode::Push, effects);

        if !self.listening_for_navigation {
            self.listening_for_navigation = true;
            effects.push(Effect::ListenForNavigation);
        }
    }

    /// Selection requested by the user. A category id the index does not
    /// know is refused.
    pub(crate) fn request_category(&mut self, filter: CategoryFilter, effects: &mut Vec<Effect>) {
        if !self.categories.resolves(&filter) {
            engine_warn!("Refusing to select unknown category {}", filter);
            return;
        }
        self.select_category(filter, NavigationMode::Push, effects);
    }

    /// Closes any open result and records the selection in the address.
    pub(crate) fn select_category(
        &mut self,
        filter: CategoryFilter,
        mode: NavigationMode,
        effects: &mut Vec<Effect>,
    ) {
        self.selected_category = filter;
        self.persist_selected_category(effects);
        self.open_result = None;
        effects.push(Effect::Forget {
            key: StorageKey::OpenResult,
        });
        let url = self
            .url
            .clone()
            .with_category(Some(self.selected_category.as_str()))
            .with_job(None);
        self.navigate(url, mode, effects);
    }

    pub(crate) fn open_result_by_id(&mut self, job_id: &str, effects: &mut Vec<Effect>) {
        if self.history.get(job_id).is_none() {
            engine_warn!("Cannot open unknown result {}", job_id);
            return;
        }
        self.open_result = Some(job_id.to_string());
        self.status_message = MSG_OPENED.to_string();
        effects.push(Effect::Persist {
            key: StorageKey::OpenResult,
            value: job_id.to_string(),
        });
        let url = self.url.clone().with_job(Some(job_id));
        self.navigate(url, NavigationMode::Push, effects);
    }

    /// Closing is not a navigation step, so the current entry is replaced.
    pub(crate) fn close_result(&mut self, effects: &mut Vec<Effect>) {
        self.open_result = None;
        effects.push(Effect::Forget {
            key: StorageKey::OpenResult,
        });
        let url = self.url.clone().with_job(None);
        self.navigate(url, NavigationMode::Replace, effects);
    }

    /// Back/forward landed on `url`: resolve it against the current
    /// collections without adding history.
    pub(crate) fn apply_navigation(&mut self, url: UrlState, effects: &mut Vec<Effect>) {
        engine_debug!("Replaying navigation to ?{}", url.to_query());
        let filter = url
            .cat
            .as_deref()
            .map(CategoryFilter::parse)
            .unwrap_or_default();
        if filter != self.selected_category {
            self.selected_category = filter;
            self.persist_selected_category(effects);
        }

        match url.job.as_deref() {
            Some(id) if self.history.get(id).is_some() => {
                self.open_result = Some(id.to_string());
                self.status_message = MSG_RESTORED.to_string();
            }
            Some(id) => {
                engine_warn!("Navigation names unknown result {}; closing", id);
                self.open_result = None;
            }
            None => self.open_result = None,
        }

        self.apply_share_params(&url);
        self.url = url;
        self.ensure_selected_category_valid(NavigationMode::Replace, effects);
    }

    /// With no result open, the selection must name `all`, a non-empty
    /// `uncategorized`, or a live category; anything else resets to `all`.
    pub(crate) fn ensure_selected_category_valid(
        &mut self,
        mode: NavigationMode,
        effects: &mut Vec<Effect>,
    ) {
        if self.open_result.is_some() {
            return;
        }
        let stale = match &self.selected_category {
            CategoryFilter::All => false,
            CategoryFilter::Uncategorized => self.counts().uncategorized == 0,
            CategoryFilter::Category(id) => !self.categories.contains(id),
        };
        if stale {
            engine_info!(
                "Selected category {} no longer resolves; showing all",
                self.selected_category
            );
            self.select_category(CategoryFilter::All, mode, effects);
        }
    }

    fn apply_share_params(&mut self, url: &UrlState) {
        if let Some(shared) = url.shared_mode() {
            self.shared_mode = shared;
        }
        if let Some(by) = url.by.as_deref() {
            self.shared_by = Some(by.to_string());
        }
    }

    pub(crate) fn navigate(
        &mut self,
        url: UrlState,
        mode: NavigationMode,
        effects: &mut Vec<Effect>,
    ) {
        self.url = url.clone();
        effects.push(Effect::Navigate { url, mode });
    }
}
