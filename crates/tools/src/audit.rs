//! Audit trail: a listener that records every committed change.

use datamodel_kernel::{StoreAction, StoreChange};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// One observed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub store_id: String,
    pub operation: StoreAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub first_change: bool,
    pub inner_action: bool,
    pub timestamp: u64,
}

/// Shared record sink. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener suitable for `DataModelStore::on_store_change`.
    pub fn listener(&self) -> impl FnMut(&StoreChange<'_>) + Send + 'static {
        let records = Arc::clone(&self.records);
        move |change: &StoreChange<'_>| {
            let patch = change.patch;
            let record = AuditRecord {
                store_id: patch.store_id.clone(),
                operation: patch.operation,
                path: patch.patched_path.clone(),
                first_change: patch.first_change,
                inner_action: patch.inner_action,
                timestamp: patch.timestamp,
            };
            tracing::info!(
                store_id = %record.store_id,
                operation = record.operation.as_str(),
                path = record.path.as_deref().unwrap_or(""),
                "audit"
            );
            records.lock().push(record);
        }
    }

    /// Snapshot of the records so far, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Records as a pretty-printed JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.records.lock())
    }
}
