use std::collections::HashMap;
use std::rc::Rc;

use heightcache_core::CacheConfig;
use tracing::debug;

use crate::events::NotificationCenter;
use crate::observed::ObservedHeightCache;

/// Identity of a host view that owns a height cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

/// Side table attaching one lazily created height cache to each view.
///
/// Used when the view type cannot carry the cache as a field itself.
pub struct CacheRegistry {
    center: Rc<NotificationCenter>,
    config: CacheConfig,
    caches: HashMap<ViewId, ObservedHeightCache>,
}

impl CacheRegistry {
    pub fn new(center: Rc<NotificationCenter>, config: CacheConfig) -> Self {
        Self {
            center,
            config,
            caches: HashMap::new(),
        }
    }

    /// The view's cache, created and subscribed on first access.
    pub fn get_or_create(&mut self, view: ViewId) -> &ObservedHeightCache {
        let center = &self.center;
        let config = &self.config;
        self.caches.entry(view).or_insert_with(|| {
            debug!(?view, "attaching height cache");
            ObservedHeightCache::new(center, config)
        })
    }

    pub fn get(&self, view: ViewId) -> Option<&ObservedHeightCache> {
        self.caches.get(&view)
    }

    /// Detach and drop the view's cache. Returns false if it had none.
    pub fn remove(&mut self, view: ViewId) -> bool {
        self.caches.remove(&view).is_some()
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
