//! GeoJSON parsing into feature collections.

use geojson::GeoJson;

use geoclip_core::models::{Feature, FeatureCollection};
use geoclip_core::{GeoclipError, Result};

/// Parse a GeoJSON document. Accepts a FeatureCollection, a single Feature,
/// or a bare Geometry; the geometry column is always named `geometry`.
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let document = text
        .parse::<GeoJson>()
        .map_err(|e| GeoclipError::Serialization(format!("invalid GeoJSON: {}", e)))?;

    let mut collection = FeatureCollection::new("geometry");
    match document {
        GeoJson::FeatureCollection(fc) => {
            for feature in fc.features {
                collection.push(convert_feature(feature)?);
            }
        }
        GeoJson::Feature(feature) => collection.push(convert_feature(feature)?),
        GeoJson::Geometry(geometry) => {
            collection.push(Feature::new(convert_geometry(geometry)?));
        }
    }
    Ok(collection)
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature.geometry.ok_or_else(|| {
        GeoclipError::Serialization("GeoJSON feature has no geometry".to_string())
    })?;
    let mut converted = Feature::new(convert_geometry(geometry)?);
    if let Some(properties) = feature.properties {
        converted.properties = properties.into_iter().collect();
    }
    Ok(converted)
}

fn convert_geometry(geometry: geojson::Geometry) -> Result<geo::Geometry<f64>> {
    geo::Geometry::try_from(geometry.value)
        .map_err(|e| GeoclipError::Serialization(format!("unsupported GeoJSON geometry: {}", e)))
}
