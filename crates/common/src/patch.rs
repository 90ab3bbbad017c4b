use crate::path::Path;
use crate::types::PatchId;
use chrono::{DateTime, Utc};
use datamodel_value::Value;
use serde::{Deserialize, Serialize};

/// Kind of change a patch records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreAction {
    /// A document was registered (or re-registered with overwrite).
    Register,
    /// A value was written at a path.
    Edit,
    /// A document was deregistered.
    Delete,
}

impl StoreAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// An immutable record of one committed change.
///
/// Edit patches carry the path, the value written and a snapshot of what
/// the path held just before, which is enough to reverse the write.
/// `None` for `patched_value`/`previous_value` means the path held nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub patch_id: PatchId,
    pub store_id: String,
    /// Set only on registration patches; those are notified but never logged.
    pub first_change: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub operation: StoreAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patched_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patched_segments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patched_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    /// Shallowest array on the path that the write resized or turned into an
    /// object. Reversal writes `restore_value` back here instead of
    /// `previous_value` at the patched path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_segments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_value: Option<Value>,
    /// True when the patch was emitted by replaying another patch.
    pub inner_action: bool,
}

impl Patch {
    pub fn register(store_id: impl Into<String>, timestamp: u64) -> Self {
        Self::lifecycle(store_id.into(), timestamp, StoreAction::Register, true)
    }

    pub fn delete(store_id: impl Into<String>, timestamp: u64) -> Self {
        Self::lifecycle(store_id.into(), timestamp, StoreAction::Delete, false)
    }

    pub fn edit(
        store_id: impl Into<String>,
        timestamp: u64,
        path: &Path,
        patched_value: Option<Value>,
        previous_value: Option<Value>,
    ) -> Self {
        Self {
            patch_id: PatchId::new(),
            store_id: store_id.into(),
            first_change: false,
            timestamp,
            operation: StoreAction::Edit,
            patched_path: Some(path.joined()),
            patched_segments: Some(path.segments().to_vec()),
            patched_value,
            previous_value,
            restore_segments: None,
            restore_value: None,
            inner_action: false,
        }
    }

    fn lifecycle(store_id: String, timestamp: u64, operation: StoreAction, first_change: bool) -> Self {
        Self {
            patch_id: PatchId::new(),
            store_id,
            first_change,
            timestamp,
            operation,
            patched_path: None,
            patched_segments: None,
            patched_value: None,
            previous_value: None,
            restore_segments: None,
            restore_value: None,
            inner_action: false,
        }
    }

    pub fn with_inner_action(mut self, inner_action: bool) -> Self {
        self.inner_action = inner_action;
        self
    }

    /// Record the prior content of an array the write reshaped.
    pub fn with_restore(mut self, segments: &[String], array: Value) -> Self {
        self.restore_segments = Some(segments.to_vec());
        self.restore_value = Some(array);
        self
    }

    /// The write that reverses this patch: a path and the value to put there
    /// (`None` removes). `None` for register and delete patches.
    pub fn reversal(&self) -> Option<(Path, Option<Value>)> {
        if let (Some(segments), Some(array)) = (&self.restore_segments, &self.restore_value) {
            return Some((Path::from(segments.as_slice()), Some(array.clone())));
        }
        Some((self.path()?, self.previous_value.clone()))
    }

    /// The path this patch wrote to, if it is an edit.
    pub fn path(&self) -> Option<Path> {
        self.patched_segments.as_deref().map(Path::from)
    }

    /// Whether replaying this patch can revert anything.
    pub fn is_reversible(&self) -> bool {
        self.patched_segments.is_some()
    }

    /// The timestamp as a calendar time.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.timestamp).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_patch_is_first_change_without_path() {
        let p = Patch::register("cart", 10);
        assert!(p.first_change);
        assert_eq!(p.operation, StoreAction::Register);
        assert!(!p.is_reversible());
        assert!(p.path().is_none());
    }

    #[test]
    fn delete_patch_is_not_first_change() {
        let p = Patch::delete("cart", 10);
        assert!(!p.first_change);
        assert_eq!(p.operation, StoreAction::Delete);
        assert!(!p.is_reversible());
    }

    #[test]
    fn edit_patch_records_both_path_forms() {
        let path = Path::from("cart.total");
        let p = Patch::edit("cart", 10, &path, Some(Value::from(30)), Some(Value::from(0)));
        assert_eq!(p.patched_path.as_deref(), Some("cart.total"));
        assert_eq!(p.patched_segments, Some(vec!["cart".to_owned(), "total".to_owned()]));
        assert_eq!(p.path(), Some(path));
        assert!(p.is_reversible());
        assert!(!p.inner_action);
        assert!(p.with_inner_action(true).inner_action);
    }

    #[test]
    fn reversal_prefers_the_restored_array() {
        let path = Path::from("items.5");
        let plain = Patch::edit("cart", 0, &path, Some(Value::from(1)), None);
        assert_eq!(plain.reversal(), Some((path.clone(), None)));

        let items = Value::from(vec![Value::from("a")]);
        let reshaped = Patch::edit("cart", 0, &path, Some(Value::from(1)), None)
            .with_restore(&path.segments()[..1], items.clone());
        assert_eq!(reshaped.reversal(), Some((Path::from("items"), Some(items))));
        assert!(Patch::register("cart", 0).reversal().is_none());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let p = Patch::edit("cart", 0, &Path::from("total"), Some(Value::from(30)), None);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["storeId"], "cart");
        assert_eq!(json["operation"], "edit");
        assert_eq!(json["patchedValue"], 30);
        assert!(json.get("previousValue").is_none());
        assert!(json.get("restoreSegments").is_none());
        assert_eq!(json["firstChange"], false);
    }

    #[test]
    fn recorded_at_converts_millis() {
        let p = Patch::register("x", 1_700_000_000_000);
        let at = p.recorded_at().unwrap();
        assert_eq!(at.timestamp_millis(), 1_700_000_000_000);
    }
}
