//! CSV parsing with a WKT geometry column.
//!
//! CSV is the one scannable format whose geometry column is a real named
//! column, so this reader owns geometry column resolution: the configured
//! name first, then the conventional candidates, then a hard error listing
//! what the file actually has.

use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use geoclip_core::models::{Feature, FeatureCollection};
use geoclip_core::{GeoclipError, Result};

/// Column names probed when the configured geometry column is absent.
pub const GEOMETRY_COLUMN_CANDIDATES: [&str; 4] = ["geom", "geometry", "shape", "wkb_geometry"];

pub fn parse_csv(bytes: &[u8], geometry_column: &str) -> Result<FeatureCollection> {
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(Cursor::new(bytes), None)
        .map_err(|e| GeoclipError::Serialization(format!("CSV schema inference: {}", e)))?;

    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let geometry_column = resolve_geometry_column(geometry_column, &columns)?;

    // Read the geometry column as text regardless of what inference guessed.
    let mut fields: Vec<arrow::datatypes::Field> = Vec::with_capacity(columns.len());
    for field in schema.fields() {
        if field.name() == &geometry_column {
            fields.push(arrow::datatypes::Field::new(
                field.name(),
                DataType::Utf8,
                true,
            ));
        } else {
            fields.push(field.as_ref().clone());
        }
    }
    let schema = Arc::new(arrow::datatypes::Schema::new(fields));

    let reader = ReaderBuilder::new(schema)
        .with_format(format)
        .build(Cursor::new(bytes))
        .map_err(|e| GeoclipError::Serialization(format!("CSV reader: {}", e)))?;

    let mut collection = FeatureCollection::new(&geometry_column);
    for batch in reader {
        let batch =
            batch.map_err(|e| GeoclipError::Serialization(format!("CSV batch: {}", e)))?;
        append_batch(&mut collection, &batch, &geometry_column)?;
    }
    Ok(collection)
}

fn resolve_geometry_column(configured: &str, columns: &[String]) -> Result<String> {
    if columns.iter().any(|c| c == configured) {
        return Ok(configured.to_string());
    }
    for candidate in GEOMETRY_COLUMN_CANDIDATES {
        if columns.iter().any(|c| c == candidate) {
            tracing::warn!(
                configured,
                detected = candidate,
                "configured geometry column not found, using detected column"
            );
            return Ok(candidate.to_string());
        }
    }
    Err(GeoclipError::MissingGeometryColumn {
        column: configured.to_string(),
        available: columns.to_vec(),
    })
}

fn append_batch(
    collection: &mut FeatureCollection,
    batch: &RecordBatch,
    geometry_column: &str,
) -> Result<()> {
    let schema = batch.schema();
    let geometry_index = schema.index_of(geometry_column).map_err(|e| {
        GeoclipError::Serialization(format!("geometry column vanished: {}", e))
    })?;
    let geometry = batch
        .column(geometry_index)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| GeoclipError::Serialization("geometry column is not text".to_string()))?;

    for row in 0..batch.num_rows() {
        if geometry.is_null(row) {
            continue;
        }
        let mut feature = Feature::new(parse_wkt(geometry.value(row))?);
        for (index, field) in schema.fields().iter().enumerate() {
            if index == geometry_index {
                continue;
            }
            feature
                .properties
                .insert(field.name().clone(), cell_to_json(batch.column(index), row));
        }
        collection.push(feature);
    }
    Ok(())
}

fn parse_wkt(text: &str) -> Result<geo::Geometry<f64>> {
    let parsed = wkt::Wkt::<f64>::from_str(text).map_err(|e| GeoclipError::Format {
        format: "WKT".to_string(),
        message: format!("Failed to parse WKT: {}", e),
    })?;
    geo::Geometry::try_from(parsed).map_err(|e| GeoclipError::Format {
        format: "WKT".to_string(),
        message: format!("Unsupported WKT geometry: {}", e),
    })
}

fn cell_to_json(column: &Arc<dyn Array>, row: usize) -> serde_json::Value {
    if column.is_null(row) {
        return serde_json::Value::Null;
    }
    match column.data_type() {
        DataType::Utf8 => column
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| serde_json::json!(a.value(row)))
            .unwrap_or(serde_json::Value::Null),
        DataType::Int64 => column
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| serde_json::json!(a.value(row)))
            .unwrap_or(serde_json::Value::Null),
        DataType::Float64 => column
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| serde_json::json!(a.value(row)))
            .unwrap_or(serde_json::Value::Null),
        DataType::Boolean => column
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| serde_json::json!(a.value(row)))
            .unwrap_or(serde_json::Value::Null),
        _ => serde_json::Value::Null,
    }
}
