//! Data model kernel: the in-process store of named documents.
//!
//! # Invariants
//! - A value read out of the store never changes afterwards, whatever is
//!   written later.
//! - Every committed write appends exactly one edit patch holding the prior
//!   value at its path; registration and deletion are notified, never logged.
//! - Listeners are invoked synchronously in subscription order.

pub mod clock;
pub mod listeners;
pub mod shared;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use listeners::{StoreChange, StoreChangeListener, StoreView};
pub use shared::SharedDataModelStore;
pub use store::{DataModelStore, Entry, RegisterOptions, StoreError};

pub use datamodel_common::{ListenerId, Patch, PatchId, Path, StoreAction};
pub use datamodel_value::Value;

pub fn crate_info() -> &'static str {
    "datamodel-kernel v0.1.0"
}
