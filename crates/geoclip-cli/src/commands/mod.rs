//! Command implementations

mod bbox;
mod extract;
mod sources;

use anyhow::Result;
use geoclip_core::catalog::Catalog;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let catalog = match &cli.catalog {
        Some(path) => Catalog::builtin().load_file(path)?,
        None => Catalog::builtin(),
    };

    match cli.command {
        Commands::Extract(args) => extract::execute(args, &catalog, &output, cli.dry_run).await,
        Commands::Bbox(args) => bbox::execute(args, &catalog, &output).await,
        Commands::Sources(args) => sources::execute(args, &catalog, &output),
    }
}

/// Resolve a source argument: catalog id first, then a dataset path/URL.
pub(crate) fn resolve_source(
    input: &str,
    catalog: &Catalog,
    geometry_column: Option<&str>,
) -> geoclip_core::models::SpatialSource {
    use geoclip_core::models::SpatialSource;

    let mut source = match catalog.source(input) {
        Ok(source) => source.clone(),
        Err(_) => {
            let name = std::path::Path::new(input)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| input.to_string());
            SpatialSource::dataset(name, input)
        }
    };
    if let Some(column) = geometry_column {
        source = source.with_geometry_column(column);
    }
    source
}
