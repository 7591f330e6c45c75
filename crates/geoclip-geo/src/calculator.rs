//! Bounding box calculator.
//!
//! Derives a bounding box from an already-opened feature collection,
//! optionally restricted by an attribute-equality filter. This is the
//! in-memory strategy; `ExtractionEngine::calculate_extent` pushes the same
//! filter and fold into the scan for large inputs.

use geoclip_core::models::{AttributeFilter, BoundingBox, FeatureCollection};
use geoclip_core::{GeoclipError, Result};

use crate::extent::fold_extents;

/// Union of the geometry extents of all features matching the filter.
///
/// Zero remaining features is an error: a bounding box over nothing is
/// undefined and must not silently default to a degenerate or
/// world-spanning box.
pub fn calculate_from_features(
    collection: &FeatureCollection,
    feature_filter: Option<&AttributeFilter>,
) -> Result<BoundingBox> {
    let geometries = collection
        .features
        .iter()
        .filter(|f| feature_filter.map_or(true, |filter| f.matches(filter)))
        .map(|f| &f.geometry);

    let bbox = fold_extents(geometries).ok_or(GeoclipError::EmptyCollection)?;
    tracing::debug!(count = collection.len(), %bbox, "calculated bbox from features");
    Ok(bbox)
}

/// Pairwise union of a sequence of boxes.
pub fn calculate_union(boxes: &[BoundingBox]) -> Result<BoundingBox> {
    boxes
        .iter()
        .copied()
        .reduce(|acc, b| acc.union(&b))
        .ok_or(GeoclipError::EmptyInput)
}

/// Common region of a sequence of boxes, `None` when they are disjoint.
pub fn calculate_intersection(boxes: &[BoundingBox]) -> Result<Option<BoundingBox>> {
    let mut iter = boxes.iter().copied();
    let first = iter.next().ok_or(GeoclipError::EmptyInput)?;
    Ok(iter.try_fold(first, |acc, b| acc.intersection(&b)))
}
