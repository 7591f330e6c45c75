//! Spatial source descriptors.
//!
//! A `SpatialSource` says where feature data comes from and which column
//! carries geometry. Each API flavor is a distinct `SourceKind` variant with
//! an explicit field set, validated at deserialization time, rather than an
//! untyped parameter map.

use serde::{Deserialize, Serialize};

/// Declarative description of one data origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialSource {
    /// Human-readable name, also used in default artifact metadata.
    pub name: String,

    /// Name of the geometry-bearing column in the source schema.
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,

    #[serde(flatten)]
    pub kind: SourceKind,

    #[serde(default)]
    pub description: String,
}

/// Where and how the features are retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// A vector dataset addressed by locator: local path, http(s) URL, or
    /// s3:// path. Format is inferred from the file extension.
    Dataset {
        locator: String,
        /// Layer to select in multi-layer containers.
        #[serde(default)]
        layer: Option<String>,
    },

    /// ArcGIS REST feature service layer endpoint.
    ArcgisRest {
        url: String,
        /// Page size for resultOffset pagination.
        #[serde(default = "default_page_size")]
        max_records: usize,
    },

    /// OGC Web Feature Service.
    Wfs {
        url: String,
        type_name: String,
        #[serde(default = "default_wfs_version")]
        version: String,
    },

    /// OGC API - Features collection.
    OgcApiFeatures {
        url: String,
        collection: String,
        #[serde(default = "default_page_size")]
        limit: usize,
    },
}

impl SpatialSource {
    /// Convenience constructor for a file/URL dataset source.
    pub fn dataset(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry_column: default_geometry_column(),
            kind: SourceKind::Dataset { locator: locator.into(), layer: None },
            description: String::new(),
        }
    }

    pub fn with_geometry_column(mut self, column: impl Into<String>) -> Self {
        self.geometry_column = column.into();
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        if let SourceKind::Dataset { layer: l, .. } = &mut self.kind {
            *l = Some(layer.into());
        }
        self
    }

    /// The retrieval locator, for logging and scheme detection.
    pub fn locator(&self) -> &str {
        match &self.kind {
            SourceKind::Dataset { locator, .. } => locator,
            SourceKind::ArcgisRest { url, .. } => url,
            SourceKind::Wfs { url, .. } => url,
            SourceKind::OgcApiFeatures { url, .. } => url,
        }
    }

    /// True when the source is fetched through a GIS API rather than read as
    /// a dataset file.
    pub fn is_api(&self) -> bool {
        !matches!(self.kind, SourceKind::Dataset { .. })
    }
}

fn default_geometry_column() -> String {
    "geometry".to_string()
}

fn default_page_size() -> usize {
    1000
}

fn default_wfs_version() -> String {
    "2.0.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_constructor() {
        let source = SpatialSource::dataset("parcels", "data/parcels.geojson")
            .with_geometry_column("geom")
            .with_layer("parcels_2024");

        assert_eq!(source.locator(), "data/parcels.geojson");
        assert_eq!(source.geometry_column, "geom");
        assert!(!source.is_api());
        assert!(matches!(source.kind, SourceKind::Dataset { layer: Some(_), .. }));
    }

    #[test]
    fn test_tagged_deserialization() {
        let toml = r#"
            name = "wetlands"
            type = "arcgis_rest"
            url = "https://example.com/rest/services/Wetlands/MapServer/0"
        "#;
        let source: SpatialSource = toml::from_str(toml).unwrap();

        assert!(source.is_api());
        assert_eq!(source.geometry_column, "geometry");
        match source.kind {
            SourceKind::ArcgisRest { max_records, .. } => assert_eq!(max_records, 1000),
            other => panic!("expected arcgis_rest, got {:?}", other),
        }
    }

    #[test]
    fn test_wfs_defaults() {
        let toml = r#"
            name = "roads"
            type = "wfs"
            url = "https://example.com/wfs"
            type_name = "ns:roads"
        "#;
        let source: SpatialSource = toml::from_str(toml).unwrap();
        match source.kind {
            SourceKind::Wfs { version, .. } => assert_eq!(version, "2.0.0"),
            other => panic!("expected wfs, got {:?}", other),
        }
    }
}
