//! Typed ID definitions for simulated cluster entities.
//!
//! Each ID type has a unique prefix used in its string form.

use crate::define_id;

// =============================================================================
// Cluster Entities
// =============================================================================

define_id!(NodeId, "node");
define_id!(WorkloadId, "wl");

// =============================================================================
// Tests
// =============================================================================
