//! Geographic bounding box value type and arithmetic.
//!
//! A `BoundingBox` is an axis-aligned rectangle in WGS84 degrees. Values are
//! immutable: `buffer` and `union` return new boxes. Boxes that span the
//! antimeridian are not representable; the ordering rule in `validate`
//! rejects them rather than guessing wraparound semantics.

use geo::{Coord, Intersects, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{GeoclipError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a validated bounding box.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let bbox = Self { min_lon, min_lat, max_lon, max_lat };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the box invariants: coordinates ordered and within geographic
    /// ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.min_lon.is_finite()
            || !self.min_lat.is_finite()
            || !self.max_lon.is_finite()
            || !self.max_lat.is_finite()
        {
            return Err(GeoclipError::InvalidBounds {
                reason: "coordinates must be finite".to_string(),
            });
        }
        if self.min_lon >= self.max_lon {
            return Err(GeoclipError::InvalidBounds {
                reason: format!(
                    "min_lon ({}) must be less than max_lon ({})",
                    self.min_lon, self.max_lon
                ),
            });
        }
        if self.min_lat >= self.max_lat {
            return Err(GeoclipError::InvalidBounds {
                reason: format!(
                    "min_lat ({}) must be less than max_lat ({})",
                    self.min_lat, self.max_lat
                ),
            });
        }
        if self.min_lon < -180.0 || self.max_lon > 180.0 {
            return Err(GeoclipError::InvalidBounds {
                reason: format!(
                    "longitudes [{}, {}] outside [-180, 180]",
                    self.min_lon, self.max_lon
                ),
            });
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(GeoclipError::InvalidBounds {
                reason: format!(
                    "latitudes [{}, {}] outside [-90, 90]",
                    self.min_lat, self.max_lat
                ),
            });
        }
        Ok(())
    }

    /// Expand all four edges outward by `degrees`. Negative values shrink
    /// the box; the result is re-validated and shrinking a box past its
    /// center is an error.
    pub fn buffer(&self, degrees: f64) -> Result<Self> {
        Self::new(
            self.min_lon - degrees,
            self.min_lat - degrees,
            self.max_lon + degrees,
            self.max_lat + degrees,
        )
    }

    /// Smallest box containing both boxes. Componentwise min/max, so the
    /// operation is commutative and associative and N boxes can be reduced
    /// pairwise in any order.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Overlapping region of two boxes, or `None` when they are disjoint.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min_lon = self.min_lon.max(other.min_lon);
        let min_lat = self.min_lat.max(other.min_lat);
        let max_lon = self.max_lon.min(other.max_lon);
        let max_lat = self.max_lat.min(other.max_lat);
        if min_lon >= max_lon || min_lat >= max_lat {
            return None;
        }
        Some(Self { min_lon, min_lat, max_lon, max_lat })
    }

    /// Parameter values for the extraction engine's intersects filter. Pure
    /// projection of the four coordinates; no side effects.
    pub fn to_query_predicate(&self) -> QueryPredicate {
        QueryPredicate { rect: self.to_rect() }
    }

    /// Coordinates in `[min_lon, min_lat, max_lon, max_lat]` order.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.min_lon, y: self.min_lat },
            Coord { x: self.max_lon, y: self.max_lat },
        )
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Spatial filter handed to the extraction engine: a feature passes when its
/// geometry intersects the query rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPredicate {
    rect: Rect<f64>,
}

impl QueryPredicate {
    pub fn matches(&self, geometry: &geo::Geometry<f64>) -> bool {
        geometry.intersects(&self.rect)
    }

    pub fn rect(&self) -> Rect<f64> {
        self.rect
    }

    pub fn to_array(&self) -> [f64; 4] {
        [
            self.rect.min().x,
            self.rect.min().y,
            self.rect.max().x,
            self.rect.max().y,
        ]
    }
}
