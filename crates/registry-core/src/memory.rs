//! In-memory [`RegistryStore`]: the item set is an ordered `Vec`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::Result;
use crate::model::{Filter, RegItem};
use crate::store::{Callback, CallbackId, RegistryStore};

/// Two logical rwlocks, one for items and one for callbacks, held
/// separately so that evaluating callbacks never blocks a concurrent
/// `Lookup`-only caller on the callbacks list, and vice versa.
pub struct InMemoryStore {
    items: RwLock<Vec<RegItem>>,
    callbacks: RwLock<Vec<(CallbackId, Filter, Callback)>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// For each registered `(filter, callback)` pair, in registration
    /// order, computes the full current match set and invokes the
    /// callback. Takes items-read together with callbacks-read; never
    /// holds the items-write lock while a callback runs, so a callback
    /// cannot deadlock against the mutation that triggered it.
    fn evaluate_callbacks(&self) {
        let items = self.items.read().expect("items lock poisoned");
        let callbacks = self.callbacks.read().expect("callbacks lock poisoned");
        for (_, filter, cb) in callbacks.iter() {
            let matches: Vec<RegItem> =
                items.iter().filter(|r| filter.matches(r)).cloned().collect();
            cb(&matches);
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryStore for InMemoryStore {
    fn register(&self, ri: RegItem) -> Result<()> {
        {
            let mut items = self.items.write().expect("items lock poisoned");
            if !items.contains(&ri) {
                items.push(ri);
            }
        }
        self.evaluate_callbacks();
        Ok(())
    }

    fn unregister(&self, ri: RegItem) -> Result<()> {
        {
            let mut items = self.items.write().expect("items lock poisoned");
            if let Some(pos) = items.iter().position(|item| item == &ri) {
                items.remove(pos);
            }
        }
        self.evaluate_callbacks();
        Ok(())
    }

    fn lookup(&self, f: &Filter) -> Result<Vec<RegItem>> {
        let items = self.items.read().expect("items lock poisoned");
        Ok(items.iter().filter(|r| f.matches(r)).cloned().collect())
    }

    fn add_callback(&self, f: Filter, cb: Callback) -> Result<CallbackId> {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut callbacks = self.callbacks.write().expect("callbacks lock poisoned");
            callbacks.push((id, f.clone(), cb));
        }
        // The callback was just moved into the list, so deliver its
        // synchronous first call by borrowing it back out rather than
        // keeping a second owned copy (Callback is a non-Clone trait
        // object).
        let items = self.items.read().expect("items lock poisoned");
        let matches: Vec<RegItem> = items.iter().filter(|r| f.matches(r)).cloned().collect();
        drop(items);
        let callbacks = self.callbacks.read().expect("callbacks lock poisoned");
        if let Some((_, _, cb)) = callbacks.iter().find(|(cid, _, _)| *cid == id) {
            cb(&matches);
        }
        Ok(id)
    }

    fn remove_callback(&self, id: CallbackId) {
        let mut callbacks = self.callbacks.write().expect("callbacks lock poisoned");
        callbacks.retain(|(cid, _, _)| *cid != id);
    }
}
