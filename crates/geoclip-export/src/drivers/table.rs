//! Arrow record batch construction shared by the CSV and Parquet drivers.
//!
//! Attribute columns are typed from their first non-null value; the geometry
//! column goes last, as WKT text for CSV and WKB bytes for Parquet.

use std::sync::Arc;

use arrow::array::{ArrayRef, BinaryArray, BooleanArray, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use wkt::ToWkt;

use geoclip_core::models::FeatureCollection;
use geoclip_core::{GeoclipError, Result};

use crate::wkb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEncoding {
    /// Well-Known Text in a string column.
    Wkt,
    /// Well-Known Binary in a bytes column.
    Wkb,
}

#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Text,
    Float,
    Bool,
}

pub fn record_batch(
    collection: &FeatureCollection,
    encoding: GeometryEncoding,
) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(collection.columns.len() + 1);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(collection.columns.len() + 1);

    for column in &collection.columns {
        let kind = infer_kind(collection, column);
        let (data_type, array) = build_column(collection, column, kind)?;
        fields.push(Field::new(column, data_type, true));
        arrays.push(array);
    }

    let geometry_type = match encoding {
        GeometryEncoding::Wkt => DataType::Utf8,
        GeometryEncoding::Wkb => DataType::Binary,
    };
    fields.push(Field::new(&collection.geometry_column, geometry_type, false));
    arrays.push(geometry_array(collection, encoding));

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, arrays)
        .map_err(|e| GeoclipError::Serialization(format!("record batch: {}", e)))
}

fn infer_kind(collection: &FeatureCollection, column: &str) -> ColumnKind {
    collection
        .features
        .iter()
        .find_map(|f| f.properties.get(column).filter(|v| !v.is_null()))
        .map(|value| match value {
            serde_json::Value::Number(_) => ColumnKind::Float,
            serde_json::Value::Bool(_) => ColumnKind::Bool,
            _ => ColumnKind::Text,
        })
        .unwrap_or(ColumnKind::Text)
}

fn build_column(
    collection: &FeatureCollection,
    column: &str,
    kind: ColumnKind,
) -> Result<(DataType, ArrayRef)> {
    let values = collection
        .features
        .iter()
        .map(|f| f.properties.get(column).filter(|v| !v.is_null()));

    match kind {
        ColumnKind::Text => {
            let cells: Vec<Option<String>> = values
                .map(|v| {
                    v.map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                })
                .collect();
            Ok((DataType::Utf8, Arc::new(StringArray::from(cells))))
        }
        ColumnKind::Float => {
            let cells: Vec<Option<f64>> = values
                .map(|v| {
                    v.map(|v| {
                        v.as_f64().ok_or_else(|| {
                            GeoclipError::Serialization(format!(
                                "non-numeric value in numeric column '{}'",
                                column
                            ))
                        })
                    })
                    .transpose()
                })
                .collect::<Result<_>>()?;
            Ok((DataType::Float64, Arc::new(Float64Array::from(cells))))
        }
        ColumnKind::Bool => {
            let cells: Vec<Option<bool>> = values.map(|v| v.and_then(|v| v.as_bool())).collect();
            Ok((DataType::Boolean, Arc::new(BooleanArray::from(cells))))
        }
    }
}

fn geometry_array(collection: &FeatureCollection, encoding: GeometryEncoding) -> ArrayRef {
    match encoding {
        GeometryEncoding::Wkt => {
            let cells: Vec<String> = collection
                .features
                .iter()
                .map(|f| f.geometry.wkt_string())
                .collect();
            Arc::new(StringArray::from(cells))
        }
        GeometryEncoding::Wkb => {
            let blobs: Vec<Vec<u8>> = collection
                .features
                .iter()
                .map(|f| wkb::encode(&f.geometry))
                .collect();
            Arc::new(BinaryArray::from_iter_values(
                blobs.iter().map(|b| b.as_slice()),
            ))
        }
    }
}
