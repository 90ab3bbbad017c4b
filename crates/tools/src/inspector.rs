use datamodel_common::Patch;
use datamodel_kernel::DataModelStore;

/// Store inspector for developer tooling.
///
/// Provides read-only queries against the store for debugging and CLI
/// output.
pub struct StoreInspector;

impl StoreInspector {
    /// Produce a summary of the store state.
    pub fn summary(store: &DataModelStore) -> StoreSummary {
        StoreSummary {
            entry_count: store.len(),
            history_len: store.get_store_changes().len(),
            listener_count: store.listener_count(),
        }
    }

    /// Describe a single entry.
    pub fn inspect_entry(store: &DataModelStore, id: &str) -> Option<EntryInfo> {
        store.entry(id).map(|entry| {
            let document = entry.document();
            EntryInfo {
                id: id.to_owned(),
                mutable: entry.is_mutable(),
                kind: document.kind(),
                keys: document
                    .as_object()
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default(),
                patch_count: Self::history_for(store, id).len(),
            }
        })
    }

    /// Patches recorded against one entry, oldest first.
    pub fn history_for<'a>(store: &'a DataModelStore, id: &str) -> Vec<&'a Patch> {
        store
            .get_store_changes()
            .iter()
            .filter(|patch| patch.store_id == id)
            .collect()
    }
}

/// Summary of store state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub entry_count: usize,
    pub history_len: usize,
    pub listener_count: usize,
}

impl std::fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Store: entries={} patches={} listeners={}",
            self.entry_count, self.history_len, self.listener_count
        )
    }
}

/// Detailed info about a single entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub id: String,
    pub mutable: bool,
    /// Node kind of the document root.
    pub kind: &'static str,
    /// Top-level keys when the root is an object.
    pub keys: Vec<String>,
    pub patch_count: usize,
}

impl std::fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entry [{}] {} mutable={} keys=[{}] patches={}",
            self.id,
            self.kind,
            self.mutable,
            self.keys.join(", "),
            self.patch_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datamodel_kernel::{RegisterOptions, Value};
    use serde_json::json;

    fn store() -> DataModelStore {
        let mut store = DataModelStore::new();
        store
            .register_data_model(
                "user",
                Value::from(json!({"id": "user-123", "profile": {"name": "John"}})),
                RegisterOptions::default(),
            )
            .unwrap();
        store
            .register_data_model("flags", Value::object(), RegisterOptions::mutable())
            .unwrap();
        store
    }

    #[test]
    fn summary_empty_store() {
        let summary = StoreInspector::summary(&DataModelStore::new());
        assert_eq!(summary.entry_count, 0);
        assert_eq!(summary.history_len, 0);
    }

    #[test]
    fn summary_with_entries() {
        let mut store = store();
        store.set_in("user", "profile.age", 30).unwrap();
        store.on_store_change(|_| {});

        let summary = StoreInspector::summary(&store);
        assert_eq!(
            summary,
            StoreSummary {
                entry_count: 2,
                history_len: 1,
                listener_count: 1,
            }
        );
    }

    #[test]
    fn inspect_entry_found() {
        let mut store = store();
        store.set_in("user", "profile.age", 30).unwrap();
        store.set_in("flags", "beta", true).unwrap();

        let info = StoreInspector::inspect_entry(&store, "user").unwrap();
        assert_eq!(info.keys, vec!["id", "profile"]);
        assert_eq!(info.kind, "object");
        assert!(!info.mutable);
        assert_eq!(info.patch_count, 1);

        assert!(StoreInspector::inspect_entry(&store, "flags").unwrap().mutable);
    }

    #[test]
    fn inspect_entry_not_found() {
        assert!(StoreInspector::inspect_entry(&store(), "missing").is_none());
    }

    #[test]
    fn history_for_filters_by_entry() {
        let mut store = store();
        store.set_in("user", "profile.age", 30).unwrap();
        store.set_in("flags", "beta", true).unwrap();
        store.set_in("user", "profile.age", 31).unwrap();

        let history = StoreInspector::history_for(&store, "user");
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|p| p.store_id == "user"));
    }

    #[test]
    fn summary_display() {
        let s = format!("{}", StoreInspector::summary(&store()));
        assert!(s.contains("entries=2"));
    }
}
