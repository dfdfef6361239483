//! Content storage for entities.
//!
//! An entity's content either lives in the entity itself or in a shared
//! key-value cache. The cache is handed to entities at construction; each
//! entity lazily generates one random key the first time it touches the
//! cache and keeps it for its lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use uuid::Uuid;

/// An external key-value store for entity content.
pub trait ContentCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, content: String);

    fn remove(&self, key: &str);
}

/// A process-local content cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, content: String) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), content);
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

// =============================================================================
// Content slot
// =============================================================================

/// Where one entity keeps its content.
pub struct ContentSlot {
    storage: Storage,
}

enum Storage {
    Inline(String),
    Cached {
        cache: Arc<dyn ContentCache>,
        key: OnceLock<String>,
    },
}

impl ContentSlot {
    /// Create an empty slot, backed by `cache` if one is given.
    pub fn new(cache: Option<Arc<dyn ContentCache>>) -> Self {
        let storage = match cache {
            Some(cache) => Storage::Cached {
                cache,
                key: OnceLock::new(),
            },
            None => Storage::Inline(String::new()),
        };
        Self { storage }
    }

    pub fn get(&self) -> String {
        match &self.storage {
            Storage::Inline(content) => content.clone(),
            Storage::Cached { cache, key } => cache.get(cache_key(key)).unwrap_or_default(),
        }
    }

    pub fn set(&mut self, content: String) {
        match &mut self.storage {
            Storage::Inline(slot) => *slot = content,
            Storage::Cached { cache, key } => cache.put(cache_key(key), content),
        }
    }

    /// The cache key, if this slot is cache-backed.
    pub fn key(&self) -> Option<&str> {
        match &self.storage {
            Storage::Inline(_) => None,
            Storage::Cached { key, .. } => Some(cache_key(key)),
        }
    }

    /// A new slot on the same backend holding a copy of this content.
    ///
    /// Cache-backed forks get their own key.
    pub fn fork(&self) -> Self {
        let cache = match &self.storage {
            Storage::Inline(_) => None,
            Storage::Cached { cache, .. } => Some(Arc::clone(cache)),
        };
        let mut slot = Self::new(cache);
        slot.set(self.get());
        slot
    }
}

/// Generate the key at most once, even under concurrent first access.
fn cache_key(key: &OnceLock<String>) -> &str {
    key.get_or_init(|| {
        let key = format!("content-{}", Uuid::now_v7().simple());
        tracing::trace!(%key, "generated content cache key");
        key
    })
}

impl Drop for ContentSlot {
    fn drop(&mut self) {
        if let Storage::Cached { cache, key } = &self.storage
            && let Some(key) = key.get()
        {
            cache.remove(key);
        }
    }
}

impl fmt::Debug for ContentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage {
            Storage::Inline(content) => f.debug_tuple("Inline").field(&content.len()).finish(),
            Storage::Cached { key, .. } => f.debug_tuple("Cached").field(&key.get()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_round_trip() {
        let mut slot = ContentSlot::new(None);
        assert_eq!(slot.get(), "");
        slot.set("<p>hello</p>".to_string());
        assert_eq!(slot.get(), "<p>hello</p>");
        assert!(slot.key().is_none());
    }

    #[test]
    fn test_cached_round_trip() {
        let cache = Arc::new(MemoryCache::new());
        let mut slot = ContentSlot::new(Some(cache.clone() as Arc<dyn ContentCache>));
        slot.set("cached body".to_string());
        assert_eq!(slot.get(), "cached body");
        assert_eq!(cache.len(), 1);

        let key = slot.key().unwrap().to_string();
        assert!(key.starts_with("content-"));
        assert_eq!(slot.key(), Some(key.as_str()));
    }

    #[test]
    fn test_key_generated_once_under_concurrency() {
        let cache: Arc<dyn ContentCache> = Arc::new(MemoryCache::new());
        let slot = ContentSlot::new(Some(cache));

        let keys: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| slot.key().unwrap().to_string()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(keys.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_fork_gets_distinct_key() {
        let cache = Arc::new(MemoryCache::new());
        let mut slot = ContentSlot::new(Some(cache.clone() as Arc<dyn ContentCache>));
        slot.set("shared".to_string());

        let mut fork = slot.fork();
        assert_eq!(fork.get(), "shared");
        assert_ne!(fork.key(), slot.key());

        fork.set("changed".to_string());
        assert_eq!(slot.get(), "shared");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_drop_releases_cache_entry() {
        let cache = Arc::new(MemoryCache::new());
        {
            let mut slot = ContentSlot::new(Some(cache.clone() as Arc<dyn ContentCache>));
            slot.set("temporary".to_string());
            assert_eq!(cache.len(), 1);
        }
        assert!(cache.is_empty());
    }
}
