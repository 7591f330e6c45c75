//! Shapefile (.shp + .dbf sidecar) parsing.

use std::io::Cursor;

use shapefile::dbase;
use shapefile::Shape;

use geoclip_core::models::{Feature, FeatureCollection};
use geoclip_core::{GeoclipError, Result};

/// Parse shapefile geometry bytes plus an optional attribute table.
///
/// Null shapes are skipped rather than failing the whole read; shapefiles in
/// the wild routinely carry a few.
pub fn parse_shapefile(shp: &[u8], dbf: Option<&[u8]>) -> Result<FeatureCollection> {
    let shape_reader =
        shapefile::ShapeReader::new(Cursor::new(shp)).map_err(shapefile_error)?;

    let mut collection = FeatureCollection::new("geometry");
    match dbf {
        Some(dbf) => {
            let dbf_reader =
                dbase::Reader::new(Cursor::new(dbf)).map_err(|e| GeoclipError::Format {
                    format: "shapefile".to_string(),
                    message: format!("invalid .dbf sidecar: {}", e),
                })?;
            let mut reader = shapefile::Reader::new(shape_reader, dbf_reader);
            for pair in reader.iter_shapes_and_records() {
                let (shape, record) = pair.map_err(shapefile_error)?;
                if let Some(geometry) = convert_shape(shape)? {
                    let mut feature = Feature::new(geometry);
                    for (name, value) in record {
                        feature.properties.insert(name, field_to_json(value));
                    }
                    collection.push(feature);
                }
            }
        }
        None => {
            let mut shape_reader = shape_reader;
            for shape in shape_reader.iter_shapes() {
                let shape = shape.map_err(shapefile_error)?;
                if let Some(geometry) = convert_shape(shape)? {
                    collection.push(Feature::new(geometry));
                }
            }
        }
    }
    Ok(collection)
}

fn shapefile_error(e: shapefile::Error) -> GeoclipError {
    GeoclipError::Format {
        format: "shapefile".to_string(),
        message: e.to_string(),
    }
}

fn convert_shape(shape: Shape) -> Result<Option<geo::Geometry<f64>>> {
    if matches!(shape, Shape::NullShape) {
        return Ok(None);
    }
    geo::Geometry::<f64>::try_from(shape)
        .map(Some)
        .map_err(|e| GeoclipError::Format {
            format: "shapefile".to_string(),
            message: format!("unsupported shape: {}", e),
        })
}

fn field_to_json(value: dbase::FieldValue) -> serde_json::Value {
    use dbase::FieldValue;
    match value {
        FieldValue::Character(Some(s)) => serde_json::Value::String(s),
        FieldValue::Character(None) => serde_json::Value::Null,
        FieldValue::Numeric(Some(n)) => serde_json::json!(n),
        FieldValue::Numeric(None) => serde_json::Value::Null,
        FieldValue::Float(Some(f)) => serde_json::json!(f),
        FieldValue::Float(None) => serde_json::Value::Null,
        FieldValue::Logical(Some(b)) => serde_json::Value::Bool(b),
        FieldValue::Logical(None) => serde_json::Value::Null,
        FieldValue::Integer(i) => serde_json::json!(i),
        FieldValue::Double(d) => serde_json::json!(d),
        other => serde_json::Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use shapefile::dbase::TableWriterBuilder;
    use shapefile::ShapeWriter;

    fn sample_bytes() -> (Vec<u8>, Vec<u8>) {
        let mut shp = Cursor::new(Vec::new());
        let mut shx = Cursor::new(Vec::new());
        let writer = ShapeWriter::with_shx(&mut shp, &mut shx);
        writer
            .write_shapes(&[
                shapefile::Point::new(-81.58, 28.35),
                shapefile::Point::new(-81.50, 28.40),
            ])
            .unwrap();

        let mut dbf = Cursor::new(Vec::new());
        let table = TableWriterBuilder::new()
            .add_character_field("name".try_into().unwrap(), 16)
            .build_with_dest(&mut dbf);
        #[derive(Debug)]
        struct Row(&'static str);
        impl shapefile::dbase::WritableRecord for Row {
            fn write_using<'a, W: std::io::Write>(
                &self,
                writer: &mut shapefile::dbase::FieldWriter<'a, W>,
            ) -> std::result::Result<(), shapefile::dbase::FieldIOError> {
                writer.write_next_field_value(&self.0.to_string())
            }
        }
        table.write_records(&[Row("pond"), Row("marsh")]).unwrap();

        (shp.into_inner(), dbf.into_inner())
    }

    #[test]
    fn test_parse_with_attributes() {
        let (shp, dbf) = sample_bytes();
        let collection = parse_shapefile(&shp, Some(&dbf)).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection.features[0].geometry,
            geo::Geometry::Point(Point::new(-81.58, 28.35))
        );
        assert_eq!(
            collection.features[0].properties["name"],
            serde_json::json!("pond")
        );
    }

    #[test]
    fn test_parse_without_attributes() {
        let (shp, _) = sample_bytes();
        let collection = parse_shapefile(&shp, None).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.features[0].properties.is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail() {
        assert!(matches!(
            parse_shapefile(b"not a shapefile", None),
            Err(GeoclipError::Format { .. })
        ));
    }
}
