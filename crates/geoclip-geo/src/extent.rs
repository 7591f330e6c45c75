//! Per-geometry extents and extent folding.

use std::str::FromStr;

use geo::algorithm::bounding_rect::BoundingRect;
use geo::Geometry;
use geoclip_core::models::BoundingBox;
use geoclip_core::{GeoclipError, Result};

/// Extent of a single geometry, or `None` for empty geometries.
///
/// Extents are not validated: a point's extent is a degenerate box with
/// `min == max`, which is fine for unioning but is rejected if used as an
/// extraction predicate.
pub fn geometry_extent(geometry: &Geometry<f64>) -> Option<BoundingBox> {
    geometry.bounding_rect().map(BoundingBox::from)
}

/// Fold the extents of many geometries into one box with a componentwise
/// min/max reduction. Both calculation strategies (in-memory and engine
/// push-down) go through this fold, which keeps their results bit-identical.
pub fn fold_extents<'a, I>(geometries: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    geometries
        .into_iter()
        .filter_map(geometry_extent)
        .reduce(|acc, extent| acc.union(&extent))
}

/// Extent of a geometry given in Well-Known Text.
pub fn wkt_extent(text: &str) -> Result<BoundingBox> {
    let parsed = wkt::Wkt::<f64>::from_str(text).map_err(|e| GeoclipError::Format {
        format: "WKT".to_string(),
        message: format!("Failed to parse WKT: {}", e),
    })?;
    let geometry = Geometry::try_from(parsed).map_err(|e| GeoclipError::Format {
        format: "WKT".to_string(),
        message: format!("Unsupported WKT geometry: {}", e),
    })?;
    geometry_extent(&geometry).ok_or_else(|| GeoclipError::Format {
        format: "WKT".to_string(),
        message: "Geometry has no extent".to_string(),
    })
}
