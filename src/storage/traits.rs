//! Visited store trait
//!
//! This module defines the interface the crawler uses to decide whether a
//! URL is being seen for the first time.

/// First-visit membership store
///
/// Implementations must make the check and the insert a single atomic step:
/// for any URL, exactly one call to [`VisitStore::try_claim`] returns `true`
/// over the lifetime of the store, regardless of how many callers race.
/// Membership is permanent; there is no eviction.
pub trait VisitStore: Send + Sync {
    /// Claims `url`, returning `true` only for the first caller
    fn try_claim(&self, url: &str) -> bool;

    /// Number of URLs claimed so far
    fn len(&self) -> usize;

    /// Returns true if nothing has been claimed yet
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: VisitStore + ?Sized> VisitStore for std::sync::Arc<S> {
    fn try_claim(&self, url: &str) -> bool {
        (**self).try_claim(url)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
