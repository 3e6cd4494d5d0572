//! Append-only in-memory chat log.
//!
//! Only broadcasts are recorded. The log is unbounded and never persisted.

#[derive(Debug, Default, Clone)]
pub(crate) struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: String) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy of all entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.clone()
    }
}
