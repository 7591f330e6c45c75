use std::io::Write;

use geoclip_core::models::{BoundingBox, SpatialSource};
use geoclip_core::GeoclipError;
use geoclip_engine::{EngineState, ExtractionEngine};

const PONDS_GEOJSON: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-81.58, 28.35]},
            "properties": {"name": "inside"}
        },
        {
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-80.00, 27.00]},
            "properties": {"name": "outside"}
        },
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-81.60, 28.30], [-81.40, 28.30], [-81.40, 28.50], [-81.60, 28.50], [-81.60, 28.30]]]
            },
            "properties": {"name": "overlapping"}
        }
    ]
}"#;

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents).unwrap();
    path.to_string_lossy().to_string()
}

fn disney_bbox() -> BoundingBox {
    BoundingBox::new(-81.62, 28.33, -81.55, 28.38).unwrap()
}

#[tokio::test]
async fn extract_keeps_exactly_the_intersecting_features() {
    let dir = tempfile::tempdir().unwrap();
    let locator = write_file(&dir, "ponds.geojson", PONDS_GEOJSON.as_bytes());

    let mut engine = ExtractionEngine::new(SpatialSource::dataset("ponds", locator));
    engine.connect().unwrap();

    let collection = engine.extract(&disney_bbox()).await.unwrap();
    assert_eq!(engine.state(), EngineState::Queried);

    let mut names: Vec<&str> = collection
        .features
        .iter()
        .map(|f| f.properties["name"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["inside", "overlapping"]);
}

#[tokio::test]
async fn extracting_with_the_union_of_known_extents_keeps_those_features() {
    let dir = tempfile::tempdir().unwrap();
    let locator = write_file(&dir, "ponds.geojson", PONDS_GEOJSON.as_bytes());

    let mut engine = ExtractionEngine::new(SpatialSource::dataset("ponds", locator));
    engine.connect().unwrap();

    // Union of every feature's extent must select every feature back.
    let all = engine.calculate_extent(None).await.unwrap();
    let collection = engine.extract(&all).await.unwrap();
    assert_eq!(collection.len(), 3);
}

#[tokio::test]
async fn extract_from_csv_resolves_geometry_column() {
    let dir = tempfile::tempdir().unwrap();
    let locator = write_file(
        &dir,
        "ponds.csv",
        b"name,geom\ninside,POINT(-81.58 28.35)\noutside,POINT(-80.0 27.0)\n",
    );

    let mut engine = ExtractionEngine::new(SpatialSource::dataset("ponds", locator));
    engine.connect().unwrap();

    let collection = engine.extract(&disney_bbox()).await.unwrap();
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.geometry_column, "geom");
}

#[tokio::test]
async fn extract_fails_before_predicate_when_geometry_column_missing() {
    let dir = tempfile::tempdir().unwrap();
    let locator = write_file(&dir, "table.csv", b"name,pop\na,1\nb,2\n");

    let mut engine = ExtractionEngine::new(SpatialSource::dataset("table", locator));
    engine.connect().unwrap();

    let err = engine.extract(&disney_bbox()).await.unwrap_err();
    match err {
        GeoclipError::MissingGeometryColumn { column, available } => {
            assert_eq!(column, "geometry");
            assert_eq!(available, vec!["name".to_string(), "pop".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn pushed_down_extent_matches_in_memory_calculator() {
    let dir = tempfile::tempdir().unwrap();
    let locator = write_file(&dir, "ponds.geojson", PONDS_GEOJSON.as_bytes());

    let mut engine = ExtractionEngine::new(SpatialSource::dataset("ponds", locator));
    engine.connect().unwrap();

    let pushed = engine.calculate_extent(None).await.unwrap();
    let collection = engine.collect().await.unwrap();
    let in_memory = geoclip_geo::calculate_from_features(&collection, None).unwrap();

    assert_eq!(pushed.to_array(), in_memory.to_array());
}

#[tokio::test]
async fn schema_lists_columns_with_geometry_last() {
    let dir = tempfile::tempdir().unwrap();
    let locator = write_file(&dir, "ponds.geojson", PONDS_GEOJSON.as_bytes());

    let mut engine = ExtractionEngine::new(SpatialSource::dataset("ponds", locator));
    engine.connect().unwrap();

    let schema = engine.schema().await.unwrap();
    assert_eq!(schema, vec!["name".to_string(), "geometry".to_string()]);
}

#[tokio::test]
async fn closed_engine_rejects_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let locator = write_file(&dir, "ponds.geojson", PONDS_GEOJSON.as_bytes());

    let mut engine = ExtractionEngine::new(SpatialSource::dataset("ponds", locator));
    engine.connect().unwrap();
    engine.close();

    let err = engine.extract(&disney_bbox()).await.unwrap_err();
    assert!(matches!(err, GeoclipError::EngineState { .. }));
}
