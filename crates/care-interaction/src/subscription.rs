// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scoped, single-threaded listener registries.
//!
//! [`Listeners::subscribe`] hands back a [`Subscription`]; dropping the handle
//! unregisters the callback. There is no separate `remove` call to forget.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Entry<E> {
    id: u64,
    key: Option<usize>,
    callback: Callback<E>,
}

struct Registry<E> {
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

impl<E> Registry<E> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }
}

trait Unregister {
    fn unregister(&self, id: u64);
}

impl<E> Unregister for RefCell<Registry<E>> {
    fn unregister(&self, id: u64) {
        // Dropped outside the borrow: a callback may own other handles on
        // this registry.
        let removed: Vec<Entry<E>> = {
            let mut registry = self.borrow_mut();
            let (removed, kept) = std::mem::take(&mut registry.entries)
                .into_iter()
                .partition(|e| e.id == id);
            registry.entries = kept;
            removed
        };
        drop(removed);
    }
}

/// Ordered set of callbacks receiving `&E`.
///
/// Cloning shares the registry. Callbacks run in subscription order.
pub struct Listeners<E: 'static> {
    inner: Rc<RefCell<Registry<E>>>,
}

/// Listener registry used as an interaction event source.
pub type EventChannel<E> = Listeners<E>;

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry::default())),
        }
    }
}

impl<E: 'static> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Listeners<E> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback`; it stays registered while the returned handle lives.
    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> Subscription {
        self.insert(None, Rc::new(RefCell::new(callback)))
    }

    /// Registers `callback` under `key`, rejecting a second live registration
    /// with the same key. Returns `None` on a duplicate.
    pub fn subscribe_keyed(
        &self,
        key: usize,
        callback: impl FnMut(&E) + 'static,
    ) -> Option<Subscription> {
        if self
            .inner
            .borrow()
            .entries
            .iter()
            .any(|e| e.key == Some(key))
        {
            return None;
        }
        Some(self.insert(Some(key), Rc::new(RefCell::new(callback))))
    }

    fn insert(&self, key: Option<usize>, callback: Callback<E>) -> Subscription {
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry { id, key, callback });
            id
        };
        let registry: Weak<dyn Unregister> = Rc::downgrade(&self.inner) as Weak<dyn Unregister>;
        Subscription { id, registry }
    }

    /// Delivers `event` to every live callback. Returns how many ran.
    ///
    /// Callbacks may subscribe or drop subscriptions while running; a
    /// callback dropped mid-delivery is not invoked afterwards. A callback
    /// that re-enters the same registry does not receive its own nested event.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<(u64, Callback<E>)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|e| (e.id, Rc::clone(&e.callback)))
            .collect();
        let mut delivered = 0;
        for (id, callback) in snapshot {
            if !self.inner.borrow().contains(id) {
                continue;
            }
            let Ok(mut callback) = callback.try_borrow_mut() else {
                debug!(listener = id, "skipping re-entrant listener");
                continue;
            };
            callback(event);
            delivered += 1;
        }
        delivered
    }

    /// Number of live callbacks.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// True when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned registration handle; dropping it unregisters the callback.
#[must_use = "dropping a Subscription unregisters the listener immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unregister>,
}

impl Subscription {
    /// True while the registry still exists.
    pub fn is_active(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
