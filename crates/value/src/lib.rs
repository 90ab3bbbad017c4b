//! Document values: a JSON-shaped tree with structural sharing.
//!
//! # Invariants
//! - Cloning a value never copies a composite node; mutating one always does
//!   when it is shared.
//! - Path writes rebuild only the containers on the path.

pub mod path;
mod serde_impl;
pub mod value;

pub use value::{Map, Value};

pub fn crate_info() -> &'static str {
    "datamodel-value v0.1.0"
}
