//! Refreshable shared rule collection
//!
//! Readers take a snapshot (`Arc`) of the current collection and rewrite
//! against it without holding any lock. A refresh builds a complete new
//! collection first and then swaps it in, so readers only ever see fully
//! built collections.

use std::sync::{Arc, PoisonError, RwLock};

use crate::collection::RuleCollection;
use crate::types::RewriteResult;

/// Shared handle over the currently published [`RuleCollection`].
#[derive(Debug, Default)]
pub struct RuleStore {
    current: RwLock<Arc<RuleCollection>>,
}

impl RuleStore {
    /// Publish `collection` as the initial snapshot.
    pub fn new(collection: RuleCollection) -> Self {
        Self {
            current: RwLock::new(Arc::new(collection)),
        }
    }

    /// The collection current at the time of the call.
    pub fn snapshot(&self) -> Arc<RuleCollection> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish a new collection, returning the one it replaces.
    ///
    /// Rewrites already running keep using the snapshot they started with.
    pub fn replace(&self, collection: RuleCollection) -> Arc<RuleCollection> {
        let next = Arc::new(collection);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Rewrite `url` against the current snapshot.
    pub fn rewrite(&self, url: &str) -> RewriteResult<'static> {
        self.snapshot().rewrite(url).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchTier;

    fn collection_with(hosts: &[&str]) -> RuleCollection {
        let mut collection = RuleCollection::new();
        collection.add_simple_hosts(hosts, MatchTier::IncludeSubdomains);
        collection
    }

    #[test]
    fn test_default_store_is_empty() {
        let store = RuleStore::default();
        assert!(store.snapshot().is_empty());
        assert!(!store.rewrite("http://example.com/").matched);
    }

    #[test]
    fn test_replace_publishes_new_snapshot() {
        let store = RuleStore::new(collection_with(&["old.com"]));
        let before = store.snapshot();

        let previous = store.replace(collection_with(&["new.com"]));
        assert!(Arc::ptr_eq(&before, &previous));

        // The old snapshot stays usable and unchanged.
        assert!(before.rewrite("http://old.com/").matched);
        assert!(!before.rewrite("http://new.com/").matched);

        assert!(!store.rewrite("http://old.com/").matched);
        assert_eq!(store.rewrite("http://new.com/").url, "https://new.com/");
    }

    #[test]
    fn test_concurrent_readers_during_refresh() {
        let store = RuleStore::new(collection_with(&["example.com"]));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        // Every published snapshot covers example.com.
                        assert!(store.rewrite("http://www.example.com/").matched);
                    }
                });
            }
            scope.spawn(|| {
                for i in 0..50 {
                    let extra = format!("extra{i}.org");
                    store.replace(collection_with(&["example.com", extra.as_str()]));
                }
            });
        });
    }
}
