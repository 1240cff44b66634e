//! Core types for focus fog: line spans, host fold ranges, and the regions
//! dimmed around the scope containing the cursor.

/// Host-supplied fold ranges and target selection.
pub mod fold;
/// Identifier types for host entities.
pub mod ids;
/// Half-open line spans.
pub mod range;
/// Fog region derivation.
pub mod region;

pub use fold::{FoldRange, select_target};
pub use ids::DocumentId;
pub use range::{LineIdx, LineSpan};
pub use region::FogRegions;
