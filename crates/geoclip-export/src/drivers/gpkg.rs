//! GeoPackage driver.
//!
//! Writes a minimal, standard-conformant GeoPackage: the three required
//! metadata tables, one feature table, and geometry blobs with the GP header
//! and an envelope. Spatial index triggers are not created.

use std::path::Path;

use async_trait::async_trait;
use geo::algorithm::bounding_rect::BoundingRect;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};

use geoclip_core::models::{Feature, FeatureCollection};
use geoclip_core::{GeoclipError, Result};

use super::FormatDriver;
use crate::wkb;

const GPKG_APPLICATION_ID: i32 = 0x4750_4B47; // "GPKG"
const WGS84_SRS_ID: i32 = 4326;

pub struct GeoPackageDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Text,
    Real,
    Integer,
}

impl ColumnType {
    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
            ColumnType::Integer => "INTEGER",
        }
    }
}

#[async_trait]
impl FormatDriver for GeoPackageDriver {
    fn name(&self) -> &'static str {
        "geopackage"
    }

    fn extension(&self) -> &'static str {
        "gpkg"
    }

    async fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()> {
        // SQLite appends to an existing database; exports must replace.
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let table = table_name(path);
        let geometry_column = sanitize(&collection.geometry_column);
        let columns = column_types(collection);

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(db_error)?;

        sqlx::query(&format!("PRAGMA application_id = {}", GPKG_APPLICATION_ID))
            .execute(&mut conn)
            .await
            .map_err(db_error)?;
        sqlx::query("PRAGMA user_version = 10300")
            .execute(&mut conn)
            .await
            .map_err(db_error)?;

        create_metadata_tables(&mut conn).await?;
        create_feature_table(&mut conn, &table, &geometry_column, &columns).await?;
        register_layer(&mut conn, &table, &geometry_column, collection).await?;

        let insert = insert_statement(&table, &geometry_column, &columns);
        for feature in &collection.features {
            let mut query = sqlx::query(&insert).bind(gpkg_blob(&feature.geometry));
            for (column, column_type) in &columns {
                let value = feature.properties.get(column).filter(|v| !v.is_null());
                query = match column_type {
                    ColumnType::Text => query.bind(value.map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })),
                    ColumnType::Real => query.bind(value.and_then(|v| v.as_f64())),
                    ColumnType::Integer => query.bind(value.and_then(|v| match v {
                        serde_json::Value::Bool(b) => Some(*b as i64),
                        other => other.as_i64(),
                    })),
                };
            }
            query.execute(&mut conn).await.map_err(db_error)?;
        }

        conn.close().await.map_err(db_error)?;
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> GeoclipError {
    GeoclipError::Format { format: "geopackage".to_string(), message: e.to_string() }
}

fn table_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "features".to_string());
    sanitize(&stem)
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("t_{}", cleaned)
    } else if cleaned.is_empty() {
        "features".to_string()
    } else {
        cleaned
    }
}

fn column_types(collection: &FeatureCollection) -> Vec<(String, ColumnType)> {
    collection
        .columns
        .iter()
        .map(|column| {
            let column_type = collection
                .features
                .iter()
                .find_map(|f| f.properties.get(column).filter(|v| !v.is_null()))
                .map(|value| match value {
                    serde_json::Value::Number(n) if n.is_i64() => ColumnType::Integer,
                    serde_json::Value::Number(_) => ColumnType::Real,
                    serde_json::Value::Bool(_) => ColumnType::Integer,
                    _ => ColumnType::Text,
                })
                .unwrap_or(ColumnType::Text);
            (column.clone(), column_type)
        })
        .collect()
}

async fn create_metadata_tables(conn: &mut SqliteConnection) -> Result<()> {
    let ddl = [
        "CREATE TABLE gpkg_spatial_ref_sys (
            srs_name TEXT NOT NULL,
            srs_id INTEGER PRIMARY KEY,
            organization TEXT NOT NULL,
            organization_coordsys_id INTEGER NOT NULL,
            definition TEXT NOT NULL,
            description TEXT
        )",
        "CREATE TABLE gpkg_contents (
            table_name TEXT PRIMARY KEY,
            data_type TEXT NOT NULL,
            identifier TEXT UNIQUE,
            description TEXT DEFAULT '',
            last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            min_x DOUBLE,
            min_y DOUBLE,
            max_x DOUBLE,
            max_y DOUBLE,
            srs_id INTEGER
        )",
        "CREATE TABLE gpkg_geometry_columns (
            table_name TEXT NOT NULL,
            column_name TEXT NOT NULL,
            geometry_type_name TEXT NOT NULL,
            srs_id INTEGER NOT NULL,
            z TINYINT NOT NULL,
            m TINYINT NOT NULL,
            PRIMARY KEY (table_name, column_name)
        )",
    ];
    for statement in ddl {
        sqlx::query(statement).execute(&mut *conn).await.map_err(db_error)?;
    }

    let srs = [
        ("Undefined Cartesian SRS", -1, "NONE", -1, "undefined"),
        ("Undefined Geographic SRS", 0, "NONE", 0, "undefined"),
        (
            "WGS 84",
            WGS84_SRS_ID,
            "EPSG",
            WGS84_SRS_ID,
            "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]]",
        ),
    ];
    for (name, srs_id, organization, coordsys_id, definition) in srs {
        sqlx::query(
            "INSERT INTO gpkg_spatial_ref_sys
                (srs_name, srs_id, organization, organization_coordsys_id, definition)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(srs_id)
        .bind(organization)
        .bind(coordsys_id)
        .bind(definition)
        .execute(&mut *conn)
        .await
        .map_err(db_error)?;
    }
    Ok(())
}

async fn create_feature_table(
    conn: &mut SqliteConnection,
    table: &str,
    geometry_column: &str,
    columns: &[(String, ColumnType)],
) -> Result<()> {
    let mut ddl = format!(
        "CREATE TABLE \"{}\" (fid INTEGER PRIMARY KEY AUTOINCREMENT, \"{}\" BLOB NOT NULL",
        table, geometry_column
    );
    for (column, column_type) in columns {
        ddl.push_str(&format!(", \"{}\" {}", sanitize(column), column_type.sql()));
    }
    ddl.push(')');
    sqlx::query(&ddl).execute(conn).await.map_err(db_error)?;
    Ok(())
}

async fn register_layer(
    conn: &mut SqliteConnection,
    table: &str,
    geometry_column: &str,
    collection: &FeatureCollection,
) -> Result<()> {
    let extent = collection
        .features
        .iter()
        .filter_map(|f: &Feature| f.geometry.bounding_rect())
        .reduce(|a, b| {
            geo::Rect::new(
                geo::Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                geo::Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        });

    sqlx::query(
        "INSERT INTO gpkg_contents
            (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id)
         VALUES (?, 'features', ?, ?, ?, ?, ?, ?)",
    )
    .bind(table)
    .bind(table)
    .bind(extent.map(|r| r.min().x))
    .bind(extent.map(|r| r.min().y))
    .bind(extent.map(|r| r.max().x))
    .bind(extent.map(|r| r.max().y))
    .bind(WGS84_SRS_ID)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    sqlx::query(
        "INSERT INTO gpkg_geometry_columns
            (table_name, column_name, geometry_type_name, srs_id, z, m)
         VALUES (?, ?, 'GEOMETRY', ?, 0, 0)",
    )
    .bind(table)
    .bind(geometry_column)
    .bind(WGS84_SRS_ID)
    .execute(conn)
    .await
    .map_err(db_error)?;
    Ok(())
}

fn insert_statement(
    table: &str,
    geometry_column: &str,
    columns: &[(String, ColumnType)],
) -> String {
    let mut names = format!("\"{}\"", geometry_column);
    let mut placeholders = "?".to_string();
    for (column, _) in columns {
        names.push_str(&format!(", \"{}\"", sanitize(column)));
        placeholders.push_str(", ?");
    }
    format!("INSERT INTO \"{}\" ({}) VALUES ({})", table, names, placeholders)
}

/// GeoPackage geometry blob: GP magic, version 0, flags, srs id, envelope,
/// then the WKB body.
fn gpkg_blob(geometry: &geo::Geometry<f64>) -> Vec<u8> {
    let mut buf = vec![b'G', b'P', 0u8];
    match geometry.bounding_rect() {
        Some(rect) => {
            // little endian with an XY envelope
            buf.push(0x03);
            buf.extend_from_slice(&WGS84_SRS_ID.to_le_bytes());
            buf.extend_from_slice(&rect.min().x.to_le_bytes());
            buf.extend_from_slice(&rect.max().x.to_le_bytes());
            buf.extend_from_slice(&rect.min().y.to_le_bytes());
            buf.extend_from_slice(&rect.max().y.to_le_bytes());
        }
        None => {
            // little endian, no envelope
            buf.push(0x01);
            buf.extend_from_slice(&WGS84_SRS_ID.to_le_bytes());
        }
    }
    buf.extend_from_slice(&wkb::encode(geometry));
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use serde_json::json;
    use sqlx::Row;

    fn sample() -> FeatureCollection {
        let mut collection = FeatureCollection::new("geom");
        collection.push(
            Feature::new(geo::Geometry::Point(Point::new(-81.58, 28.35)))
                .with_property("name", json!("pond"))
                .with_property("acres", json!(1.5)),
        );
        collection.push(
            Feature::new(geo::Geometry::Point(Point::new(-81.50, 28.40)))
                .with_property("name", json!("marsh"))
                .with_property("acres", json!(40.0)),
        );
        collection
    }

    #[tokio::test]
    async fn test_gpkg_readback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wetlands.gpkg");

        GeoPackageDriver.write(&sample(), &path).await.unwrap();

        let options = SqliteConnectOptions::new().filename(&path).read_only(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM wetlands")
            .fetch_one(&mut conn)
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 2);

        let registered: String =
            sqlx::query("SELECT column_name FROM gpkg_geometry_columns WHERE table_name = 'wetlands'")
                .fetch_one(&mut conn)
                .await
                .unwrap()
                .get("column_name");
        assert_eq!(registered, "geom");

        let blob: Vec<u8> = sqlx::query("SELECT geom FROM wetlands LIMIT 1")
            .fetch_one(&mut conn)
            .await
            .unwrap()
            .get("geom");
        assert_eq!(&blob[..2], b"GP");
        assert_eq!(blob[3], 0x03);
    }

    #[tokio::test]
    async fn test_existing_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("again.gpkg");

        GeoPackageDriver.write(&sample(), &path).await.unwrap();
        GeoPackageDriver.write(&sample(), &path).await.unwrap();

        let options = SqliteConnectOptions::new().filename(&path).read_only(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM again")
            .fetch_one(&mut conn)
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_sanitize_identifiers() {
        assert_eq!(sanitize("wetlands 2024"), "wetlands_2024");
        assert_eq!(sanitize("2024"), "t_2024");
        assert_eq!(sanitize(""), "features");
    }
}
