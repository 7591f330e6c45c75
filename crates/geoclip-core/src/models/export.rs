//! Export format identifiers and per-format results.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeoclipError;

/// Closed set of supported output formats. Dispatch on this enum is
/// exhaustive; unknown format names are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Geojson,
    Shapefile,
    Geopackage,
    Filegdb,
    Csv,
    Parquet,
}

impl ExportFormat {
    /// Canonical file extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Geojson => "geojson",
            ExportFormat::Shapefile => "shp",
            ExportFormat::Geopackage => "gpkg",
            ExportFormat::Filegdb => "gdb",
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }

    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Geojson,
            ExportFormat::Shapefile,
            ExportFormat::Geopackage,
            ExportFormat::Filegdb,
            ExportFormat::Csv,
            ExportFormat::Parquet,
        ]
    }
}

impl FromStr for ExportFormat {
    type Err = GeoclipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geojson" => Ok(ExportFormat::Geojson),
            "shapefile" | "shp" => Ok(ExportFormat::Shapefile),
            "geopackage" | "gpkg" => Ok(ExportFormat::Geopackage),
            "filegdb" | "gdb" => Ok(ExportFormat::Filegdb),
            "csv" => Ok(ExportFormat::Csv),
            "parquet" => Ok(ExportFormat::Parquet),
            other => Err(GeoclipError::Format {
                format: other.to_string(),
                message: "unsupported export format (expected one of: geojson, shapefile, geopackage, filegdb, csv, parquet)"
                    .to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportFormat::Geojson => "geojson",
            ExportFormat::Shapefile => "shapefile",
            ExportFormat::Geopackage => "geopackage",
            ExportFormat::Filegdb => "filegdb",
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one (collection, format) export attempt. Driver failures are
/// carried here as data rather than raised, so a multi-format request can
/// partially succeed.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub feature_count: usize,
    pub byte_size: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl ExportResult {
    pub fn succeeded(
        format: ExportFormat,
        path: PathBuf,
        feature_count: usize,
        byte_size: u64,
    ) -> Self {
        Self { format, path, feature_count, byte_size, success: true, error: None }
    }

    pub fn failed(format: ExportFormat, path: PathBuf, error: String) -> Self {
        Self { format, path, feature_count: 0, byte_size: 0, success: false, error: Some(error) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        assert_eq!("geojson".parse::<ExportFormat>().unwrap(), ExportFormat::Geojson);
        assert_eq!("GPKG".parse::<ExportFormat>().unwrap(), ExportFormat::Geopackage);
        assert_eq!("filegdb".parse::<ExportFormat>().unwrap(), ExportFormat::Filegdb);
    }

    #[test]
    fn test_parse_unknown_format_is_error() {
        assert!("nonexistent_format".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_extensions() {
        assert_eq!(ExportFormat::Geojson.extension(), "geojson");
        assert_eq!(ExportFormat::Filegdb.extension(), "gdb");
        assert_eq!(ExportFormat::Parquet.extension(), "parquet");
    }

    #[test]
    fn test_display_roundtrip() {
        for format in ExportFormat::all() {
            assert_eq!(format.to_string().parse::<ExportFormat>().unwrap(), *format);
        }
    }
}
