//! GeoJSON driver.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use async_trait::async_trait;
use geojson::{FeatureCollection as GeoJsonCollection, JsonObject};

use geoclip_core::models::FeatureCollection;
use geoclip_core::{GeoclipError, Result};

use super::FormatDriver;

pub struct GeoJsonDriver;

#[async_trait]
impl FormatDriver for GeoJsonDriver {
    fn name(&self) -> &'static str {
        "geojson"
    }

    fn extension(&self) -> &'static str {
        "geojson"
    }

    /// An empty collection writes a valid, empty FeatureCollection document.
    async fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()> {
        let features = collection
            .features
            .iter()
            .map(|feature| geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &feature.geometry,
                ))),
                id: None,
                properties: Some(
                    feature
                        .properties
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect::<JsonObject>(),
                ),
                foreign_members: None,
            })
            .collect();

        let document = GeoJsonCollection { bbox: None, features, foreign_members: None };
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), &document)
            .map_err(|e| GeoclipError::Serialization(e.to_string()))
    }
}
