//! Bbox command implementation

use anyhow::{bail, Result};

use geoclip_core::catalog::Catalog;
use geoclip_core::models::AttributeFilter;
use geoclip_engine::ExtractionEngine;
use geoclip_geo::calculate_from_features;

use crate::cli::BboxArgs;
use crate::commands::resolve_source;
use crate::output::OutputWriter;

pub async fn execute(args: BboxArgs, catalog: &Catalog, output: &OutputWriter) -> Result<()> {
    let source = resolve_source(&args.input, catalog, args.geometry_column.as_deref());
    let filter = parse_filters(&args.filters)?;

    let mut engine = ExtractionEngine::new(source);
    engine.connect()?;
    let bbox = if args.push_down {
        engine.calculate_extent(filter.as_ref()).await?
    } else {
        let collection = engine.collect().await?;
        calculate_from_features(&collection, filter.as_ref())?
    };
    engine.close();

    let bbox = match args.buffer {
        Some(degrees) => bbox.buffer(degrees)?,
        None => bbox,
    };

    if output.is_json() {
        output.result(serde_json::json!({ "bbox": bbox.to_array() }))?;
    } else {
        output.kv("Bounding box", bbox);
        output.kv("Width (deg)", bbox.max_lon - bbox.min_lon);
        output.kv("Height (deg)", bbox.max_lat - bbox.min_lat);
    }
    Ok(())
}

/// Parse FIELD=VALUE pairs. Values are interpreted as JSON when possible,
/// so `pop=3` matches a numeric attribute and `name=pond` a string one.
fn parse_filters(pairs: &[String]) -> Result<Option<AttributeFilter>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut filter = AttributeFilter::new();
    for pair in pairs {
        let Some((field, value)) = pair.split_once('=') else {
            bail!("invalid filter '{}': expected FIELD=VALUE", pair);
        };
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        filter.insert(field.trim().to_string(), value);
    }
    Ok(Some(filter))
}
