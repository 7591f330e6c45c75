//! Shapefile driver.
//!
//! Shapefiles hold exactly one shape class per file, so the class is taken
//! from the first feature and every other feature must map to it. Attribute
//! names are truncated to the 10-character dBase limit.

use std::path::Path;

use async_trait::async_trait;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point as ShpPoint, PolygonRing};

use geoclip_core::models::{Feature, FeatureCollection};
use geoclip_core::{GeoclipError, Result};

use super::FormatDriver;

pub struct ShapefileDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeClass {
    Point,
    Polyline,
    Polygon,
    Multipoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Character,
    Numeric,
    Logical,
}

#[async_trait]
impl FormatDriver for ShapefileDriver {
    fn name(&self) -> &'static str {
        "shapefile"
    }

    fn extension(&self) -> &'static str {
        "shp"
    }

    async fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()> {
        let first = collection.features.first().ok_or_else(|| format_error(
            "cannot determine shape class for an empty collection".to_string(),
        ))?;
        let class = shape_class(&first.geometry)?;

        let fields = field_kinds(collection);
        let mut builder = TableWriterBuilder::new();
        for (name, kind) in &fields {
            let field_name = dbase_name(name)?;
            builder = match kind {
                FieldKind::Character => builder.add_character_field(field_name, 254),
                FieldKind::Numeric => builder.add_numeric_field(field_name, 20, 8),
                FieldKind::Logical => builder.add_logical_field(field_name),
            };
        }

        let records: Vec<Record> = collection
            .features
            .iter()
            .map(|feature| build_record(feature, &fields))
            .collect::<Result<_>>()?;

        match class {
            ShapeClass::Point => {
                let shapes = convert_all(collection, to_point)?;
                write_all(path, builder, &shapes, &records)
            }
            ShapeClass::Polyline => {
                let shapes = convert_all(collection, to_polyline)?;
                write_all(path, builder, &shapes, &records)
            }
            ShapeClass::Polygon => {
                let shapes = convert_all(collection, to_polygon)?;
                write_all(path, builder, &shapes, &records)
            }
            ShapeClass::Multipoint => {
                let shapes = convert_all(collection, to_multipoint)?;
                write_all(path, builder, &shapes, &records)
            }
        }
    }
}

fn format_error(message: String) -> GeoclipError {
    GeoclipError::Format { format: "shapefile".to_string(), message }
}

fn shape_class(geometry: &geo::Geometry<f64>) -> Result<ShapeClass> {
    use geo::Geometry::*;
    match geometry {
        Point(_) => Ok(ShapeClass::Point),
        Line(_) | LineString(_) | MultiLineString(_) => Ok(ShapeClass::Polyline),
        Polygon(_) | MultiPolygon(_) | Rect(_) | Triangle(_) => Ok(ShapeClass::Polygon),
        MultiPoint(_) => Ok(ShapeClass::Multipoint),
        GeometryCollection(_) => Err(format_error(
            "geometry collections cannot be written to a shapefile".to_string(),
        )),
    }
}

fn convert_all<S>(
    collection: &FeatureCollection,
    convert: fn(&geo::Geometry<f64>) -> Result<S>,
) -> Result<Vec<S>> {
    collection.features.iter().map(|f| convert(&f.geometry)).collect()
}

fn write_all<S: shapefile::record::EsriShape>(
    path: &Path,
    builder: TableWriterBuilder,
    shapes: &[S],
    records: &[Record],
) -> Result<()> {
    let mut writer = shapefile::Writer::from_path(path, builder)
        .map_err(|e| format_error(e.to_string()))?;
    for (shape, record) in shapes.iter().zip(records) {
        writer
            .write_shape_and_record(shape, record)
            .map_err(|e| format_error(e.to_string()))?;
    }
    Ok(())
}

fn shp_points(ls: &geo::LineString<f64>) -> Vec<ShpPoint> {
    ls.0.iter().map(|c| ShpPoint::new(c.x, c.y)).collect()
}

fn to_point(geometry: &geo::Geometry<f64>) -> Result<ShpPoint> {
    match geometry {
        geo::Geometry::Point(p) => Ok(ShpPoint::new(p.x(), p.y())),
        other => Err(mixed_class(other)),
    }
}

fn to_polyline(geometry: &geo::Geometry<f64>) -> Result<shapefile::Polyline> {
    match geometry {
        geo::Geometry::Line(l) => Ok(shapefile::Polyline::new(vec![
            ShpPoint::new(l.start.x, l.start.y),
            ShpPoint::new(l.end.x, l.end.y),
        ])),
        geo::Geometry::LineString(ls) => Ok(shapefile::Polyline::new(shp_points(ls))),
        geo::Geometry::MultiLineString(mls) => Ok(shapefile::Polyline::with_parts(
            mls.0.iter().map(shp_points).collect(),
        )),
        other => Err(mixed_class(other)),
    }
}

fn polygon_rings(polygon: &geo::Polygon<f64>) -> Vec<PolygonRing<ShpPoint>> {
    let mut rings = vec![PolygonRing::Outer(shp_points(polygon.exterior()))];
    for interior in polygon.interiors() {
        rings.push(PolygonRing::Inner(shp_points(interior)));
    }
    rings
}

fn to_polygon(geometry: &geo::Geometry<f64>) -> Result<shapefile::Polygon> {
    match geometry {
        geo::Geometry::Polygon(p) => Ok(shapefile::Polygon::with_rings(polygon_rings(p))),
        geo::Geometry::MultiPolygon(mp) => Ok(shapefile::Polygon::with_rings(
            mp.0.iter().flat_map(polygon_rings).collect(),
        )),
        geo::Geometry::Rect(r) => Ok(shapefile::Polygon::with_rings(polygon_rings(&r.to_polygon()))),
        geo::Geometry::Triangle(t) => {
            Ok(shapefile::Polygon::with_rings(polygon_rings(&t.to_polygon())))
        }
        other => Err(mixed_class(other)),
    }
}

fn to_multipoint(geometry: &geo::Geometry<f64>) -> Result<shapefile::Multipoint> {
    match geometry {
        geo::Geometry::MultiPoint(mp) => Ok(shapefile::Multipoint::new(
            mp.0.iter().map(|p| ShpPoint::new(p.x(), p.y())).collect(),
        )),
        other => Err(mixed_class(other)),
    }
}

fn mixed_class(geometry: &geo::Geometry<f64>) -> GeoclipError {
    format_error(format!(
        "geometry {:?} does not match the shape class of the first feature",
        std::mem::discriminant(geometry)
    ))
}

/// Per-column dBase field types, inferred from the first non-null value.
fn field_kinds(collection: &FeatureCollection) -> Vec<(String, FieldKind)> {
    collection
        .columns
        .iter()
        .map(|column| {
            let kind = collection
                .features
                .iter()
                .find_map(|f| f.properties.get(column).filter(|v| !v.is_null()))
                .map(|value| match value {
                    serde_json::Value::Number(_) => FieldKind::Numeric,
                    serde_json::Value::Bool(_) => FieldKind::Logical,
                    _ => FieldKind::Character,
                })
                .unwrap_or(FieldKind::Character);
            (column.clone(), kind)
        })
        .collect()
}

fn dbase_name(column: &str) -> Result<FieldName> {
    let truncated: String = column.chars().take(10).collect();
    FieldName::try_from(truncated.as_str())
        .map_err(|e| format_error(format!("invalid attribute name '{}': {}", column, e)))
}

fn build_record(feature: &Feature, fields: &[(String, FieldKind)]) -> Result<Record> {
    let mut record = Record::default();
    for (column, kind) in fields {
        let value = feature.properties.get(column);
        let name: String = column.chars().take(10).collect();
        let value = value.filter(|v| !v.is_null());
        let field_value = match kind {
            FieldKind::Character => match value {
                None => FieldValue::Character(None),
                Some(serde_json::Value::String(s)) => FieldValue::Character(Some(s.clone())),
                Some(other) => FieldValue::Character(Some(other.to_string())),
            },
            FieldKind::Numeric => match value {
                None => FieldValue::Numeric(None),
                Some(v) => FieldValue::Numeric(Some(v.as_f64().ok_or_else(|| {
                    format_error(format!("non-numeric value in numeric column '{}'", column))
                })?)),
            },
            FieldKind::Logical => match value {
                None => FieldValue::Logical(None),
                Some(v) => FieldValue::Logical(Some(v.as_bool().ok_or_else(|| {
                    format_error(format!("non-boolean value in logical column '{}'", column))
                })?)),
            },
        };
        record.insert(name, field_value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon};
    use serde_json::json;

    fn poly(x0: f64, y0: f64) -> geo::Geometry<f64> {
        geo::Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + 1.0, y0),
                (x0 + 1.0, y0 + 1.0),
                (x0, y0),
            ]),
            vec![],
        ))
    }

    #[tokio::test]
    async fn test_write_points_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pts.shp");

        let mut collection = FeatureCollection::new("geometry");
        collection.push(
            Feature::new(geo::Geometry::Point(Point::new(1.0, 2.0)))
                .with_property("name", json!("a"))
                .with_property("value", json!(3.5)),
        );
        collection.push(
            Feature::new(geo::Geometry::Point(Point::new(4.0, 5.0)))
                .with_property("name", json!("b")),
        );

        ShapefileDriver.write(&collection, &path).await.unwrap();

        let mut reader = shapefile::Reader::from_path(&path).unwrap();
        let rows: Vec<_> = reader
            .iter_shapes_and_records()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_polygons_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polys.shp");

        let mut collection = FeatureCollection::new("geometry");
        collection.push(Feature::new(poly(0.0, 0.0)));
        collection.push(Feature::new(poly(5.0, 5.0)));

        ShapefileDriver.write(&collection, &path).await.unwrap();
        assert!(path.exists());
        assert!(path.with_extension("dbf").exists());
    }

    #[tokio::test]
    async fn test_mixed_shape_classes_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.shp");

        let mut collection = FeatureCollection::new("geometry");
        collection.push(Feature::new(geo::Geometry::Point(Point::new(0.0, 0.0))));
        collection.push(Feature::new(poly(0.0, 0.0)));

        assert!(ShapefileDriver.write(&collection, &path).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_collection_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.shp");
        let err = ShapefileDriver
            .write(&FeatureCollection::new("geometry"), &path)
            .await
            .unwrap_err();
        assert!(matches!(err, GeoclipError::Format { .. }));
    }

    #[test]
    fn test_long_attribute_names_truncate() {
        assert!(dbase_name("a_really_long_column_name").is_ok());
    }
}
