//! Change notification: listener registry and the event handed to listeners.

use crate::store::Entry;
use datamodel_common::{ListenerId, Patch, Path};
use datamodel_value::Value;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

/// Callback invoked once per committed change.
pub type StoreChangeListener = Box<dyn FnMut(&StoreChange<'_>) + Send>;

/// Read-only view of the store's entries at the moment a change commits.
#[derive(Clone, Copy)]
pub struct StoreView<'a> {
    entries: &'a IndexMap<String, Entry>,
}

impl<'a> StoreView<'a> {
    pub(crate) fn new(entries: &'a IndexMap<String, Entry>) -> Self {
        Self { entries }
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn has_in(&self, id: &str, path: impl Into<Path>) -> bool {
        self.get_in(id, path).is_some()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&'a Value> {
        self.entries.get(id).map(Entry::document)
    }

    pub fn get_in(&self, id: &str, path: impl Into<Path>) -> Option<&'a Value> {
        self.get_by_id(id)?.get_in(path.into().segments())
    }

    pub fn ids(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A committed change: the store as it stands after the change, plus the patch.
pub struct StoreChange<'a> {
    pub store: StoreView<'a>,
    pub patch: &'a Patch,
}

/// Subscribed listeners, keyed by handle.
///
/// Handles increase monotonically, so iterating the map visits listeners in
/// subscription order.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, StoreChangeListener>,
}

impl ListenerRegistry {
    pub(crate) fn subscribe(&mut self, listener: StoreChangeListener) -> ListenerId {
        self.next_id = self.next_id.saturating_add(1);
        let id = ListenerId(self.next_id);
        self.listeners.insert(id, listener);
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Invoke every listener in order. A panicking listener is logged and
    /// skipped; the remaining listeners still run.
    pub(crate) fn dispatch(&mut self, change: &StoreChange<'_>) {
        for (id, listener) in self.listeners.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(change)));
            if let Err(payload) = outcome {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                tracing::error!(
                    listener = %id,
                    patch_id = %change.patch.patch_id,
                    store_id = %change.patch.store_id,
                    "store change listener panicked: {reason}"
                );
            }
        }
    }
}
