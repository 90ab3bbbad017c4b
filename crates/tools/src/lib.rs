//! Developer tooling: store inspector and audit trail.
//!
//! # Invariants
//! - Tools only read the store; nothing here writes to it.

pub mod audit;
pub mod inspector;

pub use audit::{AuditRecord, AuditTrail};
pub use inspector::{EntryInfo, StoreInspector, StoreSummary};

pub fn crate_info() -> &'static str {
    "datamodel-tools v0.1.0"
}
