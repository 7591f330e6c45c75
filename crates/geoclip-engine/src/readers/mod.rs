//! Dataset readers: one module per on-disk format.
//!
//! Each reader turns raw object bytes into a [`FeatureCollection`] with the
//! source's native geometry column name. Spatial filtering happens after the
//! read, in the engine.

pub mod csv;
pub mod geojson;
pub mod shapefile;

pub use csv::GEOMETRY_COLUMN_CANDIDATES;

use geoclip_core::models::{FeatureCollection, SourceKind, SpatialSource};
use geoclip_core::{GeoclipError, Result};

use crate::store;

/// Formats the engine can scan directly from an object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    GeoJson,
    Shapefile,
    Csv,
}

impl DatasetFormat {
    pub fn from_locator(locator: &str) -> Result<Self> {
        let lower = locator.to_ascii_lowercase();
        let ext = lower.rsplit('.').next().unwrap_or_default();
        match ext {
            "geojson" | "json" => Ok(DatasetFormat::GeoJson),
            "shp" => Ok(DatasetFormat::Shapefile),
            "csv" => Ok(DatasetFormat::Csv),
            other => Err(GeoclipError::Format {
                format: other.to_string(),
                message: format!("No reader for dataset '{}'", locator),
            }),
        }
    }
}

/// Read a dataset source in full.
pub async fn read_dataset(source: &SpatialSource) -> Result<FeatureCollection> {
    let SourceKind::Dataset { locator, layer } = &source.kind else {
        return Err(GeoclipError::Format {
            format: "api".to_string(),
            message: "API sources are fetched, not scanned".to_string(),
        });
    };
    if let Some(layer) = layer {
        // None of the scannable formats are multi-layer containers.
        tracing::debug!(layer, "layer selector ignored for single-layer format");
    }

    match DatasetFormat::from_locator(locator)? {
        DatasetFormat::GeoJson => {
            let bytes = store::fetch(locator).await?;
            let text = String::from_utf8(bytes)
                .map_err(|e| GeoclipError::Serialization(e.to_string()))?;
            geojson::parse_geojson(&text)
        }
        DatasetFormat::Shapefile => {
            let shp = store::fetch(locator).await?;
            let dbf_locator = sibling_with_extension(locator, "dbf");
            let dbf = match store::fetch(&dbf_locator).await {
                Ok(bytes) => Some(bytes),
                Err(_) => {
                    tracing::warn!(locator = %dbf_locator, "no .dbf sidecar, attributes will be empty");
                    None
                }
            };
            shapefile::parse_shapefile(&shp, dbf.as_deref())
        }
        DatasetFormat::Csv => {
            let bytes = store::fetch(locator).await?;
            csv::parse_csv(&bytes, &source.geometry_column)
        }
    }
}

fn sibling_with_extension(locator: &str, ext: &str) -> String {
    match locator.rsplit_once('.') {
        Some((stem, _)) => format!("{}.{}", stem, ext),
        None => format!("{}.{}", locator, ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_locator() {
        assert_eq!(
            DatasetFormat::from_locator("s3://b/wetlands.GeoJSON").unwrap(),
            DatasetFormat::GeoJson
        );
        assert_eq!(
            DatasetFormat::from_locator("parcels.shp").unwrap(),
            DatasetFormat::Shapefile
        );
        assert_eq!(
            DatasetFormat::from_locator("points.csv").unwrap(),
            DatasetFormat::Csv
        );
        assert!(DatasetFormat::from_locator("layers.gdb").is_err());
    }

    #[test]
    fn test_sibling_with_extension() {
        assert_eq!(sibling_with_extension("a/b/c.shp", "dbf"), "a/b/c.dbf");
        assert_eq!(
            sibling_with_extension("https://h/c.shp", "dbf"),
            "https://h/c.dbf"
        );
    }
}
