//! Core primitives for `jcv`, a JSON/data comparison toolkit.
//!
//! The library owns the structural diff summarizer, key-sort and key-filter
//! normalization, conversion of external formats (YAML, CSV, XML, XLSX)
//! into JSON, report exports, shareable-state encoding, and snapshot
//! persistence. Rendering an interactive diff is deliberately somebody
//! else's job; see [`session::DiffSurface`].
//!
//! ```
//! use serde_json::json;
//! use jcv_core::diff::ChangeSummary;
//!
//! let summary = ChangeSummary::between(
//!     &json!({"name": "jcv", "version": 1}),
//!     &json!({"name": "jcv", "version": 2}),
//! );
//! assert_eq!(summary.modified.len(), 1);
//! assert_eq!(summary.modified[0].path, "version");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
mod error;
pub mod format;
pub mod normalize;
pub mod report;
pub mod session;
pub mod share;
pub mod store;

pub use diff::{ChangeKind, ChangeRecord, ChangeSummary};
pub use error::{FormatError, ShareError, StoreError};
pub use format::Format;
pub use session::{Debouncer, DiffSurface, Session, Side};
pub use share::SharedState;
pub use store::{Snapshot, SnapshotStore};

/// Returns the semantic version of the `jcv-core` crate.
///
/// ```
/// assert!(!jcv_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
