use crate::clock::{Clock, SystemClock};
use crate::listeners::{ListenerRegistry, StoreChange, StoreView};
use datamodel_common::{ListenerId, Patch, PatchId, Path, StoreAction};
use datamodel_value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Errors from data model store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid data model id: ids must be non-empty")]
    InvalidKey,
    #[error("invalid data model: a document is required")]
    InvalidDocument,
    #[error(
        "data model '{0}' is already registered; register with overwrite set to replace it"
    )]
    DuplicateKey(String),
    #[error("no patch with id '{0}' in the store history")]
    PatchNotFound(PatchId),
    #[error("no data model registered under '{0}'")]
    NoSuchEntry(String),
}

/// Per-registration behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Replace an entry already registered under the same id.
    pub overwrite: bool,
    /// Adopt the caller's value as-is instead of storing a private deep clone.
    /// Writes to a mutable entry update it in place where nothing else
    /// shares the touched nodes.
    ///
    /// This is not live aliasing. Nodes are copy-on-write, so a caller who
    /// mutates their own handle after registering gets a private copy and the
    /// store never sees the change. The only effect at registration is that
    /// the deep clone is skipped.
    pub mutable: bool,
}

impl RegisterOptions {
    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            ..Self::default()
        }
    }

    pub fn mutable() -> Self {
        Self {
            mutable: true,
            ..Self::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }
}

/// One registered document and its mutability flag.
#[derive(Debug, Clone)]
pub struct Entry {
    document: Value,
    mutable: bool,
}

impl Entry {
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}

/// Whether writing `next` over `current` counts as a change.
///
/// Composites always count. Scalars count only when strictly unequal.
fn is_change(current: Option<&Value>, next: Option<&Value>) -> bool {
    match (current, next) {
        (_, Some(next)) if next.is_composite() => true,
        (Some(current), Some(next)) => !current.strict_eq(next),
        (None, None) => false,
        _ => true,
    }
}

/// Registry of named documents with path-addressed writes, a patch history
/// and synchronous change notification.
///
/// Every successful write replaces the containers along the written path
/// and shares everything else, so any `Value` obtained before the write keeps
/// reporting what it held. Every write produces an edit patch carrying the
/// prior value at its path; `apply_patch` replays that prior value as a new
/// write. Listeners run in subscription order, once per committed change.
pub struct DataModelStore {
    entries: IndexMap<String, Entry>,
    /// Edit patches across all entries, oldest first.
    history: Vec<Patch>,
    listeners: ListenerRegistry,
    clock: Arc<dyn Clock>,
}

impl DataModelStore {
    /// Create an empty store stamping patches with wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store with a specific time source.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: IndexMap::new(),
            history: Vec::new(),
            listeners: ListenerRegistry::default(),
            clock,
        }
    }

    /// Register a document under `id`.
    ///
    /// Fails with `InvalidKey` for an empty id, `InvalidDocument` when no
    /// document is given, and `DuplicateKey` when `id` is taken and
    /// `options.overwrite` is false. Overwriting keeps the old entry's patches
    /// in history. Listeners are notified with a registration patch that is
    /// never added to history.
    pub fn register_data_model(
        &mut self,
        id: &str,
        document: impl Into<Option<Value>>,
        options: RegisterOptions,
    ) -> Result<(), StoreError> {
        if id.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let document = document.into().ok_or(StoreError::InvalidDocument)?;
        if self.entries.contains_key(id) && !options.overwrite {
            return Err(StoreError::DuplicateKey(id.to_owned()));
        }

        let document = if options.mutable {
            document
        } else {
            document.deep_clone()
        };
        let replaced = self
            .entries
            .insert(
                id.to_owned(),
                Entry {
                    document,
                    mutable: options.mutable,
                },
            )
            .is_some();
        debug!(
            store_id = id,
            mutable = options.mutable,
            replaced,
            "registered data model"
        );

        self.commit(Patch::register(id, self.clock.now_millis()));
        Ok(())
    }

    /// Remove the entry under `id` and purge its patches from history.
    ///
    /// Unknown ids are not an error. Listeners are notified with a delete
    /// patch that is never added to history.
    pub fn deregister_data_model(&mut self, id: &str) -> Result<(), StoreError> {
        if id.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let removed = self.entries.shift_remove(id).is_some();
        let before = self.history.len();
        self.history.retain(|patch| patch.store_id != id);
        debug!(
            store_id = id,
            removed,
            purged = before - self.history.len(),
            "deregistered data model"
        );

        self.commit(Patch::delete(id, self.clock.now_millis()));
        Ok(())
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether `path` fully resolves inside the document under `id`.
    pub fn has_in(&self, id: &str, path: impl Into<Path>) -> bool {
        self.view().has_in(id, path)
    }

    /// The current document under `id`.
    ///
    /// Clone the returned value to keep it across later writes; the clone is
    /// cheap and will keep reporting what it holds now.
    pub fn get_by_id(&self, id: &str) -> Option<&Value> {
        self.entries.get(id).map(Entry::document)
    }

    /// The value at `path` in the document under `id`.
    pub fn get_in(&self, id: &str, path: impl Into<Path>) -> Option<&Value> {
        self.get_by_id(id)?.get_in(path.into().segments())
    }

    /// The entry under `id`, including its mutability flag.
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Write `value` at `path` in the document under `id`.
    ///
    /// Returns the id of the edit patch, or `None` when `value` is a scalar
    /// strictly equal to what `path` already holds (nothing is written or
    /// recorded). Missing intermediate containers are created as objects.
    pub fn set_in(
        &mut self,
        id: &str,
        path: impl Into<Path>,
        value: impl Into<Value>,
    ) -> Result<Option<PatchId>, StoreError> {
        self.set_value(id, &path.into(), Some(value.into()), false)
    }

    /// Write `value` at `path`, always recording a patch.
    ///
    /// With `overwrite` the value replaces whatever `path` holds. Without it,
    /// an object value is merged one level deep into an object already at
    /// `path` (incoming keys win); any other shape replaces.
    pub fn extend(
        &mut self,
        id: &str,
        path: impl Into<Path>,
        value: impl Into<Value>,
        overwrite: bool,
    ) -> Result<PatchId, StoreError> {
        let path = path.into();
        let value = value.into();
        let value = match self.get_in(id, &path) {
            Some(current) if !overwrite => current.merged_with(value),
            _ => value,
        };
        self.commit_write(id, &path, Some(value), false)
    }

    /// Revert the write recorded by `patch_id` by writing its previous value
    /// back. The reversion is itself a new patch, so history only grows.
    ///
    /// Registration and delete patches are accepted and do nothing.
    pub fn apply_patch(&mut self, patch_id: &PatchId) -> Result<Option<PatchId>, StoreError> {
        let patch = self
            .history
            .iter()
            .find(|patch| patch.patch_id == *patch_id)
            .ok_or(StoreError::PatchNotFound(*patch_id))?;
        let Some((path, previous)) = patch.reversal() else {
            return Ok(None);
        };
        let store_id = patch.store_id.clone();
        debug!(store_id = %store_id, patch_id = %patch_id, path = %path, "replaying patch");
        self.set_value(&store_id, &path, previous, true)
    }

    /// All recorded edit patches, oldest first.
    pub fn get_store_changes(&self) -> &[Patch] {
        &self.history
    }

    /// Registered ids in registration order.
    pub fn get_all_data_model_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Remove every entry and the whole history. Listeners stay subscribed.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.history.clear();
        info!("all data models cleared");
    }

    /// Return the store to its freshly constructed state, dropping listeners too.
    pub fn reset(&mut self) {
        self.clear_all();
        self.listeners.clear();
        info!("data model store reset");
    }

    /// Subscribe to committed changes. The returned handle unsubscribes.
    ///
    /// Listeners run synchronously inside the triggering call. A listener that
    /// panics is logged and skipped; the write it observed still completes.
    pub fn on_store_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StoreChange<'_>) + Send + 'static,
    {
        self.listeners.subscribe(Box::new(listener))
    }

    /// Unsubscribe a listener. Returns false if the handle was not subscribed.
    pub fn off_store_change(&mut self, listener: ListenerId) -> bool {
        self.listeners.unsubscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view over the entries.
    pub fn view(&self) -> StoreView<'_> {
        StoreView::new(&self.entries)
    }

    /// Write unless the value is a scalar strictly equal to the current one.
    fn set_value(
        &mut self,
        id: &str,
        path: &Path,
        value: Option<Value>,
        inner_action: bool,
    ) -> Result<Option<PatchId>, StoreError> {
        let document = self
            .get_by_id(id)
            .ok_or_else(|| StoreError::NoSuchEntry(id.to_owned()))?;
        if !is_change(document.get_in(path.segments()), value.as_ref()) {
            debug!(store_id = id, path = %path, "skipped write of unchanged value");
            return Ok(None);
        }
        self.commit_write(id, path, value, inner_action).map(Some)
    }

    fn commit_write(
        &mut self,
        id: &str,
        path: &Path,
        value: Option<Value>,
        inner_action: bool,
    ) -> Result<PatchId, StoreError> {
        let timestamp = self.clock.now_millis();
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NoSuchEntry(id.to_owned()))?;
        let segments = path.segments();
        // Values are never mutated in place while shared, so a shallow clone
        // is a stable snapshot of the prior value.
        let previous = entry.document.get_in(segments).cloned();
        let reshaped = entry.document.reshape_point(segments).and_then(|depth| {
            let prefix = &segments[..depth];
            entry.document.get_in(prefix).cloned().map(|array| (prefix, array))
        });

        if entry.mutable {
            entry.document.set_in_place(segments, value.clone());
        } else {
            let incoming = value.as_ref().map(Value::deep_clone);
            entry.document = entry.document.with_value_at(segments, incoming);
        }

        let mut patch =
            Patch::edit(id, timestamp, path, value, previous).with_inner_action(inner_action);
        if let Some((prefix, array)) = reshaped {
            patch = patch.with_restore(prefix, array);
        }
        let patch_id = patch.patch_id;
        debug!(store_id = id, path = %path, patch_id = %patch_id, "committed edit");
        self.commit(patch);
        Ok(patch_id)
    }

    /// Notify listeners, then record the patch if it belongs in history.
    fn commit(&mut self, patch: Patch) {
        let change = StoreChange {
            store: StoreView::new(&self.entries),
            patch: &patch,
        };
        self.listeners.dispatch(&change);
        if patch.operation == StoreAction::Edit {
            self.history.push(patch);
        }
    }
}

impl Default for DataModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataModelStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataModelStore")
            .field("entries", &self.entries.len())
            .field("history", &self.history.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
