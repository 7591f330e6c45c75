//! Parquet driver. Geometry travels as a WKB binary column.

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use parquet::arrow::ArrowWriter;

use geoclip_core::models::FeatureCollection;
use geoclip_core::{GeoclipError, Result};

use super::table::{record_batch, GeometryEncoding};
use super::FormatDriver;

pub struct ParquetDriver;

#[async_trait]
impl FormatDriver for ParquetDriver {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn extension(&self) -> &'static str {
        "parquet"
    }

    async fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()> {
        let parquet_error =
            |e: parquet::errors::ParquetError| GeoclipError::Serialization(format!("parquet: {}", e));

        let batch = record_batch(collection, GeometryEncoding::Wkb)?;
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).map_err(parquet_error)?;
        writer.write(&batch).map_err(parquet_error)?;
        writer.close().map_err(parquet_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use geoclip_core::models::Feature;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use serde_json::json;

    #[tokio::test]
    async fn test_parquet_roundtrip_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");

        let mut collection = FeatureCollection::new("geometry");
        for i in 0..5 {
            collection.push(
                Feature::new(geo::Geometry::Point(Point::new(i as f64, 0.0)))
                    .with_property("idx", json!(i)),
            );
        }

        ParquetDriver.write(&collection, &path).await.unwrap();

        let file = File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(rows, 5);
    }
}
