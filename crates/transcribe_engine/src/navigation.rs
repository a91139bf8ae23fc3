use engine_logging::engine_debug;
use serde::{Deserialize, Serialize};

/// Linear back/forward history of address query strings, the way a browser
/// tab keeps it. Pushing drops every entry ahead of the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHistory {
    entries: Vec<String>,
    index: usize,
    #[serde(skip)]
    listening: bool,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl SessionHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
            listening: false,
        }
    }

    pub fn current(&self) -> &str {
        self.entries
            .get(self.index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, query: impl Into<String>) {
        let query = query.into();
        if self.entries.is_empty() {
            self.entries.push(query);
            self.index = 0;
            return;
        }
        self.entries.truncate(self.index + 1);
        engine_debug!("History push ?{}", query);
        self.entries.push(query);
        self.index = self.entries.len() - 1;
    }

    pub fn replace(&mut self, query: impl Into<String>) {
        let query = query.into();
        engine_debug!("History replace ?{}", query);
        match self.entries.get_mut(self.index) {
            Some(entry) => *entry = query,
            None => {
                self.entries = vec![query];
                self.index = 0;
            }
        }
    }

    /// Moves the cursor back and returns the restored entry.
    pub fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Registers the navigation listener. Returns `false` if one was already
    /// registered this session.
    pub fn listen(&mut self) -> bool {
        !std::mem::replace(&mut self.listening, true)
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Drops out-of-range cursors left by hand-edited state.
    pub fn sanitized(mut self) -> Self {
        if self.entries.is_empty() {
            return Self::default();
        }
        self.index = self.index.min(self.entries.len() - 1);
        self
    }
}
