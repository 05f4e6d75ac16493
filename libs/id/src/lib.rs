//! # ssta-id
//!
//! Typed identities for the entities of a simulated cluster.
//!
//! ## Design Principles
//!
//! - IDs are plain monotonic integers issued by the cluster state, never reused
//! - IDs are typed to prevent mixing node and workload identities
//! - The canonical string form is `{prefix}-{number}` (e.g. `node-3`)
//! - Serialized form is the bare integer, so snapshots stay compact
//!
//! ## Examples
//!
//! - `node-1`, `node-17`
//! - `wl-4`

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;
