use crate::storage::VisitStore;
use dashmap::DashSet;

/// Visited store backed by a lock-striped concurrent set
///
/// `DashSet::insert` takes the shard's write lock for the lookup and the
/// insert together, so it is the atomic test-and-insert on its own. Suited
/// to wide crawls where a single mutex becomes the bottleneck.
#[derive(Debug, Default)]
pub struct ShardedVisitStore {
    visited: DashSet<String>,
}

impl ShardedVisitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            visited: DashSet::with_capacity(capacity),
        }
    }
}

impl VisitStore for ShardedVisitStore {
    fn try_claim(&self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    fn len(&self) -> usize {
        self.visited.len()
    }
}
