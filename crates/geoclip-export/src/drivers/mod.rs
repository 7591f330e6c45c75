//! Format drivers.
//!
//! A driver owns one concrete way of writing a collection to disk. A format
//! maps to an ordered driver list; the exporter tries each in turn, so a
//! format whose primary driver is unavailable in this build can still land
//! on disk through a fallback (FileGDB falls back to GeoPackage).

mod csv;
mod filegdb;
mod geojson;
mod gpkg;
mod parquet;
mod shapefile;
mod table;

use std::path::Path;

use async_trait::async_trait;

use geoclip_core::models::{ExportFormat, FeatureCollection};
use geoclip_core::Result;

pub use csv::CsvDriver;
pub use filegdb::FileGdbDriver;
pub use geojson::GeoJsonDriver;
pub use gpkg::GeoPackageDriver;
pub use parquet::ParquetDriver;
pub use shapefile::ShapefileDriver;

/// Whether a driver can run in this build and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable { reason: String },
}

#[async_trait]
pub trait FormatDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extension of the artifact this driver writes. A fallback driver's
    /// extension may differ from the requested format's canonical one.
    fn extension(&self) -> &'static str;

    fn availability(&self) -> Availability {
        Availability::Available
    }

    async fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()>;
}

/// Drivers for a format, in the order the exporter should try them.
pub fn drivers_for(format: ExportFormat) -> Vec<Box<dyn FormatDriver>> {
    match format {
        ExportFormat::Geojson => vec![Box::new(GeoJsonDriver)],
        ExportFormat::Shapefile => vec![Box::new(ShapefileDriver)],
        ExportFormat::Geopackage => vec![Box::new(GeoPackageDriver)],
        ExportFormat::Filegdb => vec![Box::new(FileGdbDriver), Box::new(GeoPackageDriver)],
        ExportFormat::Csv => vec![Box::new(CsvDriver)],
        ExportFormat::Parquet => vec![Box::new(ParquetDriver)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filegdb_has_a_fallback() {
        let drivers = drivers_for(ExportFormat::Filegdb);
        assert_eq!(drivers.len(), 2);
        assert!(matches!(drivers[0].availability(), Availability::Unavailable { .. }));
        assert_eq!(drivers[1].availability(), Availability::Available);
        assert_eq!(drivers[1].extension(), "gpkg");
    }

    #[test]
    fn test_every_format_has_drivers() {
        for format in ExportFormat::all() {
            assert!(!drivers_for(*format).is_empty());
        }
    }
}
