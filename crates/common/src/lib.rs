//! Shared types for the data model store.
//!
//! # Invariants
//! - Patches are immutable records; nothing in this crate mutates one after
//!   construction.
//! - Every path form (dotted string, bracket indices, segment list) resolves
//!   to the same ordered segment list.

pub mod patch;
pub mod path;
pub mod types;

pub use patch::{Patch, StoreAction};
pub use path::Path;
pub use types::{ListenerId, PatchId};

pub fn crate_info() -> &'static str {
    "datamodel-common v0.1.0"
}
