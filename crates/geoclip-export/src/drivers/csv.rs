//! CSV driver. Geometry is kept as a WKT text column rather than dropped,
//! so a CSV export still round-trips through the CSV reader.

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;

use geoclip_core::models::FeatureCollection;
use geoclip_core::{GeoclipError, Result};

use super::table::{record_batch, GeometryEncoding};
use super::FormatDriver;

pub struct CsvDriver;

#[async_trait]
impl FormatDriver for CsvDriver {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    async fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()> {
        let batch = record_batch(collection, GeometryEncoding::Wkt)?;
        let file = File::create(path)?;
        let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(file);
        writer
            .write(&batch)
            .map_err(|e| GeoclipError::Serialization(format!("csv write: {}", e)))
    }
}
