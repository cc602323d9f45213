use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use anyhow::{Context, Result};
use heightcache_core::{CacheConfig, IndexPathHeightCache};
use tracing::debug;

use crate::events::{EventHandler, NotificationCenter, Subscription, ViewEvent};

/// A height cache that clears itself on reconfiguration notifications.
///
/// Subscribes on construction and unsubscribes when dropped, so the
/// subscription lives exactly as long as the cache.
pub struct ObservedHeightCache {
    cache: Rc<RefCell<IndexPathHeightCache>>,
    automatically_invalidate: Rc<Cell<bool>>,
    _subscription: Subscription,
}

struct InvalidationHandler {
    cache: Weak<RefCell<IndexPathHeightCache>>,
    enabled: Rc<Cell<bool>>,
}

impl EventHandler for InvalidationHandler {
    fn handle_event(&mut self, event: &ViewEvent) -> Result<()> {
        if !event.is_reconfiguration() || !self.enabled.get() {
            return Ok(());
        }
        if let Some(cache) = self.cache.upgrade() {
            debug!(?event, "reconfiguration, dropping cached heights");
            cache
                .try_borrow_mut()
                .context("height cache is borrowed during invalidation")?
                .invalidate_all();
        }
        Ok(())
    }
}

impl ObservedHeightCache {
    pub fn new(center: &Rc<NotificationCenter>, config: &CacheConfig) -> Self {
        let cache = Rc::new(RefCell::new(IndexPathHeightCache::from_config(config)));
        let automatically_invalidate = Rc::new(Cell::new(config.automatically_invalidate));
        let handler = InvalidationHandler {
            cache: Rc::downgrade(&cache),
            enabled: Rc::clone(&automatically_invalidate),
        };
        Self {
            cache,
            automatically_invalidate,
            _subscription: Subscription::new(center, Box::new(handler)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, IndexPathHeightCache> {
        self.cache.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, IndexPathHeightCache> {
        self.cache.borrow_mut()
    }

    pub fn automatically_invalidate(&self) -> bool {
        self.automatically_invalidate.get()
    }

    pub fn set_automatically_invalidate(&self, enabled: bool) {
        self.automatically_invalidate.set(enabled);
    }
}
