//! Recent results, newest first.

use std::collections::VecDeque;

use super::result::PromptResult;

pub const HISTORY_CAPACITY: usize = 3;

/// Bounded most-recent-first list of results.
#[derive(Debug, Clone)]
pub struct ResultHistory {
    entries: VecDeque<PromptResult>,
    capacity: usize,
}

impl Default for ResultHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl ResultHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepends a result, evicting the oldest beyond capacity.
    pub fn push(&mut self, result: PromptResult) {
        self.entries.push_front(result);
        self.entries.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&PromptResult> {
        self.entries.front()
    }

    pub fn get(&self, id: uuid::Uuid) -> Option<&PromptResult> {
        self.entries.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptResult> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<PromptResult> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
