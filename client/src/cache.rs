use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use tracing::trace;

use crate::gateway::ObjectId;

/// Path of the root directory.
pub const ROOT_PATH: &str = "";

/// Id the remote store assigns to the root directory.
pub const ROOT_ID: ObjectId = 0;

/// Every (path, id) pair discovered so far, keyed by normalized path.
///
/// Entries are only ever added. The root is seeded at construction and
/// writes to it are ignored, so it maps to [`ROOT_ID`] for the lifetime of
/// the cache. Readers run concurrently; writers are exclusive.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, ObjectId>>,
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionCache {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(ROOT_PATH.to_string(), ROOT_ID);
        ResolutionCache {
            entries: RwLock::new(entries),
        }
    }

    pub fn get(&self, path: &str) -> Option<ObjectId> {
        // A poisoned lock still guards a consistent map: every write is a
        // single insert.
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn set(&self, path: impl Into<String>, id: ObjectId) {
        self.extend(std::iter::once((path.into(), id)));
    }

    /// Inserts a batch under one write lock, e.g. a whole directory listing.
    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = (String, ObjectId)>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for (path, id) in items {
            if path == ROOT_PATH {
                continue;
            }
            trace!(path = %path, id, "caching object id");
            entries.insert(path, id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Always false: the root entry is never removed.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn new_cache_holds_only_root() {
        let cache = ResolutionCache::new();
        assert_eq!(cache.get(""), Some(0));
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains("one"));
    }

    #[test]
    fn root_is_never_overwritten() {
        let cache = ResolutionCache::new();
        cache.set("", 42);
        cache.extend(vec![("".to_string(), 7), ("one".to_string(), 100)]);
        assert_eq!(cache.get(""), Some(0));
        assert_eq!(cache.get("one"), Some(100));
    }

    #[test]
    fn repeated_set_is_idempotent() {
        let cache = ResolutionCache::new();
        cache.set("one", 100);
        cache.set("one", 100);
        assert_eq!(cache.get("one"), Some(100));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_writers_keep_every_entry() {
        let cache = Arc::new(ResolutionCache::new());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100u64 {
                        cache.set(format!("dir{}/file{}", t, i), t * 1000 + i + 1);
                        assert_eq!(cache.get(""), Some(0));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 801);
        assert_eq!(cache.get("dir3/file7"), Some(3008));
    }
}
