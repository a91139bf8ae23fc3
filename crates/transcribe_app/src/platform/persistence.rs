use std::collections::BTreeMap;
use std::path::Path;

use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use transcribe_core::{PersistedSnapshot, StorageKey};
use transcribe_engine::{KeyValueStorage, SessionHistory, StateFile, StorageError};

pub(crate) const STATE_FILENAME: &str = ".transcribe_state.ron";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default)]
    navigation: Option<SessionHistory>,
}

/// The session's durable state: stored key/values plus the address history,
/// kept together in one ron file that is rewritten on every change.
pub(crate) struct SessionFile {
    file: StateFile,
    values: BTreeMap<String, String>,
    navigation: SessionHistory,
}

impl SessionFile {
    /// Unreadable or corrupt files start an empty session.
    pub(crate) fn open(state_dir: &Path) -> Self {
        let file = StateFile::new(state_dir, STATE_FILENAME);
        let state = match file.read() {
            Ok(Some(content)) => match ron::from_str::<PersistedState>(&content) {
                Ok(state) => {
                    engine_info!("Loaded session state from {:?}", file.path());
                    state
                }
                Err(err) => {
                    engine_warn!("Failed to parse session state {:?}: {}", file.path(), err);
                    PersistedState::default()
                }
            },
            Ok(None) => PersistedState::default(),
            Err(err) => {
                engine_warn!("Failed to read session state {:?}: {}", file.path(), err);
                PersistedState::default()
            }
        };
        Self {
            file,
            values: state.values,
            navigation: state.navigation.unwrap_or_default().sanitized(),
        }
    }

    pub(crate) fn snapshot(&self) -> PersistedSnapshot {
        let mut snapshot = PersistedSnapshot::default();
        for key in StorageKey::ALL {
            snapshot.set(key, self.values.get(key.as_str()).cloned());
        }
        snapshot
    }

    pub(crate) fn navigation(&self) -> &SessionHistory {
        &self.navigation
    }

    /// Applies `change` to the address history and saves.
    pub(crate) fn navigate<R>(&mut self, change: impl FnOnce(&mut SessionHistory) -> R) -> R {
        let result = change(&mut self.navigation);
        if let Err(err) = self.save() {
            engine_warn!("Failed to save address history: {}", err);
        }
        result
    }

    fn save(&self) -> Result<(), StorageError> {
        let state = PersistedState {
            values: self.values.clone(),
            navigation: Some(self.navigation.clone()),
        };
        let content = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())
            .map_err(|err| StorageError::Encode(err.to_string()))?;
        self.file.write(&content)?;
        Ok(())
    }
}

impl KeyValueStorage for SessionFile {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}
