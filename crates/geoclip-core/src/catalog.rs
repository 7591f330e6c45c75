//! Catalog of predefined sources and locations.
//!
//! The catalog maps short identifiers to source descriptors and named
//! bounding boxes so jobs can say `source = "fws_wetlands"` instead of
//! repeating endpoint details. It is populated once (builtins plus optional
//! catalog files) and read-only afterwards, so it is safe to share across
//! threads.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GeoclipError, Result};
use crate::models::{BoundingBox, SourceKind, SpatialSource};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sources: HashMap<String, SpatialSource>,
    locations: HashMap<String, BoundingBox>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in entries.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.register_source(
            "fws_wetlands",
            SpatialSource {
                name: "FWS National Wetlands Inventory".to_string(),
                geometry_column: "geometry".to_string(),
                kind: SourceKind::ArcgisRest {
                    url: "https://fwspublicservices.wim.usgs.gov/wetlandsmapservice/rest/services/Wetlands/MapServer/0".to_string(),
                    max_records: 1000,
                },
                description: "US Fish and Wildlife Service wetlands polygons".to_string(),
            },
        );

        catalog.register_location(
            "disney_animal_kingdom",
            BoundingBox {
                min_lon: -81.613_034_765_070_55,
                min_lat: 28.344_413_457_225_94,
                max_lon: -81.568_309_353_546_68,
                max_lat: 28.376_817_943_072_7,
            },
        );

        catalog
    }

    pub fn register_source(&mut self, id: impl Into<String>, source: SpatialSource) {
        self.sources.insert(id.into(), source);
    }

    pub fn register_location(&mut self, id: impl Into<String>, bbox: BoundingBox) {
        self.locations.insert(id.into(), bbox);
    }

    pub fn source(&self, id: &str) -> Result<&SpatialSource> {
        self.sources
            .get(id)
            .ok_or_else(|| GeoclipError::UnknownSource { name: id.to_string() })
    }

    pub fn location(&self, id: &str) -> Result<&BoundingBox> {
        self.locations
            .get(id)
            .ok_or_else(|| GeoclipError::UnknownLocation { name: id.to_string() })
    }

    /// Source entries sorted by identifier.
    pub fn sources(&self) -> Vec<(&str, &SpatialSource)> {
        let mut entries: Vec<_> =
            self.sources.iter().map(|(id, s)| (id.as_str(), s)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Location entries sorted by identifier.
    pub fn locations(&self) -> Vec<(&str, &BoundingBox)> {
        let mut entries: Vec<_> =
            self.locations.iter().map(|(id, b)| (id.as_str(), b)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Merge entries from a TOML catalog file; file entries win over
    /// builtins with the same identifier.
    pub fn load_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let file: CatalogFile =
            toml::from_str(&content).map_err(|e| GeoclipError::ConfigInvalid {
                key: "catalog".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        for (id, source) in file.sources {
            self.sources.insert(id, source);
        }
        for (id, bbox) in file.locations {
            bbox.validate()?;
            self.locations.insert(id, bbox);
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sources: HashMap<String, SpatialSource>,
    #[serde(default)]
    locations: HashMap<String, BoundingBox>,
}
