//! GIS API clients: ArcGIS REST, WFS, and OGC API - Features.
//!
//! Each client pushes the bounding box to the server as a coarse filter and
//! paginates until a short page. Servers filter on envelope overlap, which
//! over-selects; the engine re-applies the exact intersects predicate after
//! the fetch, so these clients only have to be not-lossy, never precise.

use std::time::Duration;

use reqwest::Client;

use geoclip_core::models::{BoundingBox, FeatureCollection, SourceKind, SpatialSource};
use geoclip_core::{GeoclipError, Result};

use crate::readers::geojson::parse_geojson;

pub async fn fetch(
    source: &SpatialSource,
    bbox: Option<&BoundingBox>,
    timeout: Duration,
) -> Result<FeatureCollection> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GeoclipError::Connection { reason: e.to_string() })?;

    match &source.kind {
        SourceKind::ArcgisRest { url, max_records } => {
            fetch_arcgis(&client, url, *max_records, bbox).await
        }
        SourceKind::Wfs { url, type_name, version } => {
            fetch_wfs(&client, url, type_name, version, bbox).await
        }
        SourceKind::OgcApiFeatures { url, collection, limit } => {
            fetch_ogc_api(&client, url, collection, *limit, bbox).await
        }
        SourceKind::Dataset { locator, .. } => Err(GeoclipError::Format {
            format: "dataset".to_string(),
            message: format!("'{}' is scanned, not fetched", locator),
        }),
    }
}

async fn fetch_arcgis(
    client: &Client,
    url: &str,
    max_records: usize,
    bbox: Option<&BoundingBox>,
) -> Result<FeatureCollection> {
    let query_url = format!("{}/query", url.trim_end_matches('/'));
    let mut collection = FeatureCollection::new("geometry");
    let mut offset = 0usize;
    loop {
        let params = arcgis_params(bbox, offset, max_records);
        let text = get_text(client, &query_url, &params).await?;
        let page = parse_geojson(&text)?;
        let page_len = page.len();
        for feature in page.features {
            collection.push(feature);
        }
        tracing::debug!(offset, page_len, "arcgis page fetched");
        if page_len < max_records {
            break;
        }
        offset += page_len;
    }
    Ok(collection)
}

/// ArcGIS `query` operation parameters for one page.
pub fn arcgis_params(
    bbox: Option<&BoundingBox>,
    offset: usize,
    max_records: usize,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("f".to_string(), "geojson".to_string()),
        ("where".to_string(), "1=1".to_string()),
        ("outFields".to_string(), "*".to_string()),
        ("returnGeometry".to_string(), "true".to_string()),
        ("resultOffset".to_string(), offset.to_string()),
        ("resultRecordCount".to_string(), max_records.to_string()),
    ];
    if let Some(bbox) = bbox {
        params.push((
            "geometry".to_string(),
            format!("{},{},{},{}", bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat),
        ));
        params.push(("geometryType".to_string(), "esriGeometryEnvelope".to_string()));
        params.push(("spatialRel".to_string(), "esriSpatialRelIntersects".to_string()));
        params.push(("inSR".to_string(), "4326".to_string()));
    }
    params
}

async fn fetch_wfs(
    client: &Client,
    url: &str,
    type_name: &str,
    version: &str,
    bbox: Option<&BoundingBox>,
) -> Result<FeatureCollection> {
    let params = wfs_params(type_name, version, bbox);
    let text = get_text(client, url, &params).await?;
    parse_geojson(&text)
}

/// WFS GetFeature parameters. The type name key changed between WFS 1.x and
/// 2.x; everything else is shared.
pub fn wfs_params(
    type_name: &str,
    version: &str,
    bbox: Option<&BoundingBox>,
) -> Vec<(String, String)> {
    let type_key = if version.starts_with('2') { "typeNames" } else { "typeName" };
    let mut params = vec![
        ("service".to_string(), "WFS".to_string()),
        ("version".to_string(), version.to_string()),
        ("request".to_string(), "GetFeature".to_string()),
        (type_key.to_string(), type_name.to_string()),
        ("outputFormat".to_string(), "application/json".to_string()),
        ("srsName".to_string(), "EPSG:4326".to_string()),
    ];
    if let Some(bbox) = bbox {
        params.push((
            "bbox".to_string(),
            format!(
                "{},{},{},{},EPSG:4326",
                bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
            ),
        ));
    }
    params
}

async fn fetch_ogc_api(
    client: &Client,
    url: &str,
    collection: &str,
    limit: usize,
    bbox: Option<&BoundingBox>,
) -> Result<FeatureCollection> {
    let mut next = format!(
        "{}/collections/{}/items",
        url.trim_end_matches('/'),
        collection
    );
    let mut params = Some(ogc_api_params(limit, bbox));

    let mut result = FeatureCollection::new("geometry");
    loop {
        let text = match params.take() {
            Some(params) => get_text(client, &next, &params).await?,
            None => get_text(client, &next, &[]).await?,
        };
        let page = parse_geojson(&text)?;
        for feature in page.features {
            result.push(feature);
        }
        match next_link(&text)? {
            Some(link) => next = link,
            None => break,
        }
    }
    Ok(result)
}

/// OGC API - Features `items` parameters for the first page; later pages
/// come from `next` links verbatim.
pub fn ogc_api_params(limit: usize, bbox: Option<&BoundingBox>) -> Vec<(String, String)> {
    let mut params = vec![
        ("f".to_string(), "json".to_string()),
        ("limit".to_string(), limit.to_string()),
    ];
    if let Some(bbox) = bbox {
        params.push((
            "bbox".to_string(),
            format!("{},{},{},{}", bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat),
        ));
    }
    params
}

/// Pull the `rel=next` link out of an items page, if any.
fn next_link(body: &str) -> Result<Option<String>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GeoclipError::Serialization(e.to_string()))?;
    let Some(links) = value.get("links").and_then(|l| l.as_array()) else {
        return Ok(None);
    };
    Ok(links
        .iter()
        .find(|link| link.get("rel").and_then(|r| r.as_str()) == Some("next"))
        .and_then(|link| link.get("href").and_then(|h| h.as_str()))
        .map(str::to_string))
}

async fn get_text(client: &Client, url: &str, params: &[(String, String)]) -> Result<String> {
    let unreachable = |reason: String| GeoclipError::SourceUnreachable {
        locator: url.to_string(),
        reason,
    };
    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| unreachable(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(unreachable(format!("HTTP {}", status)));
    }
    response.text().await.map_err(|e| unreachable(e.to_string()))
}
