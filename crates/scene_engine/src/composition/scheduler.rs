//! Deferred draw queue

use std::time::Duration;

/// Queue of work items released once their due time has passed
///
/// Items due at the same time come out in the order they were posted.
#[derive(Debug, Clone)]
pub struct FrameScheduler<T> {
    pending: Vec<(Duration, T)>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> FrameScheduler<T> {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Post `item` for release at `due`
    pub fn post(&mut self, due: Duration, item: T) {
        self.pending.push((due, item));
    }

    /// Take every item due at or before `now`, ordered by due time
    pub fn take_due(&mut self, now: Duration) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].0 <= now {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, item)| item).collect()
    }

    /// Drop pending items matching `predicate`
    pub fn cancel(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(_, item)| !predicate(item));
        before - self.pending.len()
    }

    /// Number of items not yet released
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
