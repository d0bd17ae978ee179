use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;

const LOG_BUFFER_MAX: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// Bounded in-memory log the UI shell tails with [`LogBuffer::get`].
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    /// Entries dropped from the front, so `get` indices stay stable.
    dropped: usize,
}

impl LogBuffer {
    pub fn new() -> Self {
        LogBuffer {
            entries: VecDeque::new(),
            dropped: 0,
        }
    }

    pub fn push(&mut self, level: &str, message: String) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.entries.push_back(LogEntry {
            timestamp,
            level: level.to_string(),
            message,
        });
        while self.entries.len() > LOG_BUFFER_MAX {
            self.entries.pop_front();
            self.dropped += 1;
        }
    }

    pub fn info(&mut self, message: String) {
        self.push("info", message);
    }

    pub fn warn(&mut self, message: String) {
        self.push("warn", message);
    }

    pub fn error(&mut self, message: String) {
        self.push("error", message);
    }

    /// Entries with a sequence number of at least `since_index`.
    pub fn get(&self, since_index: usize) -> Vec<LogEntry> {
        let skip = since_index.saturating_sub(self.dropped);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Sequence number the next entry will get.
    pub fn next_index(&self) -> usize {
        self.dropped + self.entries.len()
    }

    pub fn clear(&mut self) {
        self.dropped += self.entries.len();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}
