use geo::Point;
use geoclip_core::models::{ExportFormat, Feature, FeatureCollection};
use geoclip_export::{export, export_multiple};
use serde_json::json;

fn sample() -> FeatureCollection {
    let mut collection = FeatureCollection::new("geometry");
    collection.push(
        Feature::new(geo::Geometry::Point(Point::new(-81.58, 28.35)))
            .with_property("name", json!("pond")),
    );
    collection
}

#[tokio::test]
async fn export_writes_the_requested_format() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("wetlands");

    let result = export(&sample(), ExportFormat::Geojson, &stem).await;

    assert!(result.success);
    assert_eq!(result.feature_count, 1);
    assert!(result.byte_size > 0);
    assert_eq!(result.path, stem.with_extension("geojson"));
    assert!(result.path.exists());
}

#[tokio::test]
async fn filegdb_falls_back_to_an_open_container() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("wetlands");

    let result = export(&sample(), ExportFormat::Filegdb, &stem).await;

    assert!(result.success);
    assert_eq!(result.format, ExportFormat::Filegdb);
    assert_eq!(result.path, dir.path().join("wetlands_gdb.gpkg"));
    assert!(result.path.exists());
}

#[tokio::test]
async fn geopackage_and_filegdb_together_write_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("wetlands");

    let results = export_multiple(
        &sample(),
        &[ExportFormat::Geopackage, ExportFormat::Filegdb],
        &stem,
    )
    .await;

    assert!(results.iter().all(|r| r.success));
    assert_eq!(results[0].path, stem.with_extension("gpkg"));
    assert_eq!(results[1].path, dir.path().join("wetlands_gdb.gpkg"));
    assert_ne!(results[0].path, results[1].path);
    assert!(results[0].path.exists());
    assert!(results[1].path.exists());
}

#[tokio::test]
async fn export_multiple_reports_partial_failure() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("empty");

    // An empty collection exports fine as GeoJSON but cannot become a
    // shapefile, whose shape class comes from the first feature.
    let empty = FeatureCollection::new("geometry");
    let results = export_multiple(
        &empty,
        &[ExportFormat::Geojson, ExportFormat::Shapefile],
        &stem,
    )
    .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert_eq!(results[0].format, ExportFormat::Geojson);
    assert!(!results[1].success);
    assert!(results[1].error.as_deref().unwrap().contains("shapefile"));
    assert!(results[0].path.exists());
}

#[tokio::test]
async fn export_multiple_preserves_request_order() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("ordered");

    let formats = [ExportFormat::Csv, ExportFormat::Parquet, ExportFormat::Geojson];
    let results = export_multiple(&sample(), &formats, &stem).await;

    let reported: Vec<ExportFormat> = results.iter().map(|r| r.format).collect();
    assert_eq!(reported, formats);
    assert!(results.iter().all(|r| r.success));
}

#[tokio::test]
async fn failed_export_collects_every_driver_reason() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("nope");

    // Point + polygon in one collection fails the shapefile driver.
    let mut mixed = FeatureCollection::new("geometry");
    mixed.push(Feature::new(geo::Geometry::Point(Point::new(0.0, 0.0))));
    mixed.push(Feature::new(geo::Geometry::Rect(geo::Rect::new(
        geo::Coord { x: 0.0, y: 0.0 },
        geo::Coord { x: 1.0, y: 1.0 },
    ))));

    let result = export(&mixed, ExportFormat::Shapefile, &stem).await;
    assert!(!result.success);
    assert_eq!(result.byte_size, 0);
    assert!(result.error.is_some());
}
