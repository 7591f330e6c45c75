//! Geoclip Geo - Geometry extents and the bounding box calculator
//!
//! In-memory extent computation over feature collections. The extraction
//! engine exposes a second, push-down strategy for the same calculations;
//! both fold per-geometry extents through the helpers in [`extent`], so the
//! two paths produce bit-identical boxes.

pub mod calculator;
pub mod extent;

pub use calculator::{calculate_from_features, calculate_intersection, calculate_union};
pub use extent::{fold_extents, geometry_extent};
