use crate::store::DataModelStore;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A cloneable, thread-safe handle to one [`DataModelStore`].
///
/// A single mutex guards the entries and the history together, so a
/// read-then-write sequence done under one lock can never interleave with
/// another writer. Listeners run while the lock is held and must not lock
/// the same handle.
#[derive(Clone, Default)]
pub struct SharedDataModelStore {
    inner: Arc<Mutex<DataModelStore>>,
}

impl SharedDataModelStore {
    pub fn new(store: DataModelStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, DataModelStore> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut DataModelStore) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<DataModelStore> for SharedDataModelStore {
    fn from(store: DataModelStore) -> Self {
        Self::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RegisterOptions;
    use datamodel_value::Value;
    use std::thread;

    #[test]
    fn concurrent_writers_serialize() {
        let shared = SharedDataModelStore::default();
        shared
            .with(|s| s.register_data_model("counter", Value::object(), RegisterOptions::default()))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let key = format!("w{worker}.i{i}");
                        shared.with(|s| s.set_in("counter", key.as_str(), i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = shared.lock();
        assert_eq!(store.get_store_changes().len(), 8 * 25);
        assert!(store.has_in("counter", "w7.i24"));
    }
}
