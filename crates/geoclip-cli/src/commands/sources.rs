//! Sources command implementation

use anyhow::Result;
use tabled::Tabled;

use geoclip_core::catalog::Catalog;
use geoclip_core::models::SourceKind;

use crate::cli::SourcesArgs;
use crate::output::OutputWriter;

#[derive(Tabled, serde::Serialize)]
struct SourceRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Locator")]
    locator: String,
}

#[derive(Tabled, serde::Serialize)]
struct LocationRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Bounding box")]
    bbox: String,
}

pub fn execute(args: SourcesArgs, catalog: &Catalog, output: &OutputWriter) -> Result<()> {
    if !args.locations {
        let rows: Vec<SourceRow> = catalog
            .sources()
            .into_iter()
            .map(|(id, source)| SourceRow {
                id: id.to_string(),
                name: source.name.clone(),
                kind: kind_name(&source.kind).to_string(),
                locator: source.locator().to_string(),
            })
            .collect();
        output.section("Sources");
        output.table(rows);
    }

    let rows: Vec<LocationRow> = catalog
        .locations()
        .into_iter()
        .map(|(id, bbox)| LocationRow { id: id.to_string(), bbox: bbox.to_string() })
        .collect();
    output.section("Locations");
    output.table(rows);
    Ok(())
}

fn kind_name(kind: &SourceKind) -> &'static str {
    match kind {
        SourceKind::Dataset { .. } => "dataset",
        SourceKind::ArcgisRest { .. } => "arcgis_rest",
        SourceKind::Wfs { .. } => "wfs",
        SourceKind::OgcApiFeatures { .. } => "ogc_api_features",
    }
}
