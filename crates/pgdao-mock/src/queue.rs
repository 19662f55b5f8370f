//! Shared FIFO of mock expectations.

use crate::MockEntry;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Expectation queue shared by every handle derived from one mock.
#[derive(Clone, Default)]
pub struct MockQueue {
    entries: Arc<Mutex<VecDeque<MockEntry>>>,
}

impl MockQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an expectation.
    pub fn push(&self, entry: MockEntry) -> &Self {
        self.entries.lock().push_back(entry);
        self
    }

    /// Number of expectations not yet consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes the next expectation.
    ///
    /// # Panics
    ///
    /// Panics when the queue is empty: the code under test made more calls
    /// than the test programmed.
    pub fn pop(&self, operation: &str) -> MockEntry {
        let next = self.entries.lock().pop_front();
        match next {
            Some(entry) => entry,
            None => panic!("empty mocks: unexpected {} call", operation),
        }
    }

    /// Panics if expectations are left over.
    pub fn assert_drained(&self) {
        let left = self.len();
        assert!(left == 0, "{} mock expectation(s) were never consumed", left);
    }
}

impl FromIterator<MockEntry> for MockQueue {
    fn from_iter<I: IntoIterator<Item = MockEntry>>(iter: I) -> Self {
        Self {
            entries: Arc::new(Mutex::new(iter.into_iter().collect())),
        }
    }
}

impl std::fmt::Debug for MockQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockQueue").field("len", &self.len()).finish()
    }
}
