use crate::storage::VisitStore;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Visited store backed by a single mutex-guarded set
#[derive(Debug, Default)]
pub struct MemoryVisitStore {
    visited: Mutex<HashSet<String>>,
}

impl MemoryVisitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisitStore for MemoryVisitStore {
    fn try_claim(&self, url: &str) -> bool {
        // The set is never left half-updated, so poisoning is ignored
        let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
        if visited.contains(url) {
            return false;
        }
        visited.insert(url.to_string())
    }

    fn len(&self) -> usize {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
