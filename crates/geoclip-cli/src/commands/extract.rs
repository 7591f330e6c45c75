//! Extract command implementation

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tabled::Tabled;

use geoclip_core::catalog::Catalog;
use geoclip_core::config::load_job_file;
use geoclip_core::models::{BoundingBox, ExportFormat, ExportResult, ExtractionJob};
use geoclip_core::ports::ArtifactSink;
use geoclip_engine::ExtractionEngine;
use geoclip_export::export_multiple;

use crate::cli::ExtractArgs;
use crate::commands::resolve_source;
use crate::manifest::ManifestSink;
use crate::output::OutputWriter;

#[derive(Tabled, serde::Serialize)]
struct ResultRow {
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Features")]
    features: usize,
    #[tabled(rename = "Bytes")]
    bytes: u64,
    #[tabled(rename = "Path")]
    path: String,
}

impl From<&ExportResult> for ResultRow {
    fn from(result: &ExportResult) -> Self {
        Self {
            format: result.format.to_string(),
            status: if result.success {
                "ok".to_string()
            } else {
                result.error.clone().unwrap_or_else(|| "failed".to_string())
            },
            features: result.feature_count,
            bytes: result.byte_size,
            path: result.path.display().to_string(),
        }
    }
}

pub async fn execute(
    args: ExtractArgs,
    catalog: &Catalog,
    output: &OutputWriter,
    dry_run: bool,
) -> Result<()> {
    let job = resolve_job(&args, catalog)?;

    output.section("Extraction");
    output.kv("Job", &job.name);
    output.kv("Source", &job.source.name);
    output.kv("Bounding box", job.bbox);
    output.kv(
        "Formats",
        job.formats
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    );

    if dry_run {
        output.info("Dry run: no data extracted, no files written");
        return Ok(());
    }

    let mut engine = ExtractionEngine::new(job.source.clone());
    engine.connect()?;
    let collection = engine.extract(&job.bbox).await?;
    engine.close();

    if collection.is_empty() {
        output.warning("No features intersect the bounding box");
    } else {
        output.success(format!("Extracted {} features", collection.len()));
    }

    std::fs::create_dir_all(&args.output_dir)?;
    let stem = args.output_dir.join(job.artifact_stem());
    let results = export_multiple(&collection, &job.formats, &stem).await;

    output.section("Artifacts");
    output.table(results.iter().map(ResultRow::from).collect());

    if args.manifest {
        let sink = ManifestSink::new(&args.output_dir);
        for result in results.iter().filter(|r| r.success) {
            let artifact = sink.upload(result, &job.metadata).await?;
            output.info(format!("Recorded {} in {}", artifact.name, sink.sink_name()));
        }
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if failed == results.len() {
        bail!("every requested format failed to export");
    }
    if failed > 0 {
        output.warning(format!("{} of {} formats failed", failed, results.len()));
    }
    Ok(())
}

fn resolve_job(args: &ExtractArgs, catalog: &Catalog) -> Result<ExtractionJob> {
    let mut job = match &args.job {
        Some(path) => load_job_file(path, catalog)?,
        None => {
            let source_arg = args
                .source
                .as_deref()
                .context("either --job or --source is required")?;
            let source = resolve_source(source_arg, catalog, args.geometry_column.as_deref());
            let bbox = bbox_from_flags(args, catalog)?;
            ExtractionJob::new("extraction", source, bbox)
        }
    };

    // Flags refine a job file where both are given.
    if args.job.is_some() && (args.bbox.is_some() || args.location.is_some()) {
        job.bbox = bbox_from_flags(args, catalog)?;
    }
    if let Some(buffer) = args.buffer {
        job.bbox = job.bbox.buffer(buffer)?;
    }
    if !args.formats.is_empty() {
        let formats = args
            .formats
            .iter()
            .map(|f| ExportFormat::from_str(f))
            .collect::<geoclip_core::Result<Vec<_>>>()?;
        job = job.with_formats(formats);
    }
    if let Some(prefix) = &args.output_prefix {
        job = job.with_output_prefix(prefix);
    }

    Ok(job.with_default_metadata())
}

fn bbox_from_flags(args: &ExtractArgs, catalog: &Catalog) -> Result<BoundingBox> {
    match (&args.bbox, &args.location) {
        (Some(coords), _) => Ok(parse_bbox(coords)?),
        (None, Some(location)) => Ok(*catalog.location(location)?),
        (None, None) => bail!("either --bbox or --location is required"),
    }
}

fn parse_bbox(coords: &str) -> geoclip_core::Result<BoundingBox> {
    let parts: Vec<f64> = coords
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| geoclip_core::GeoclipError::InvalidBounds {
            reason: format!("unparsable coordinate in '{}': {}", coords, e),
        })?;
    let [min_lon, min_lat, max_lon, max_lat]: [f64; 4] =
        parts
            .try_into()
            .map_err(|_| geoclip_core::GeoclipError::InvalidBounds {
                reason: "expected exactly four coordinates: min_lon,min_lat,max_lon,max_lat"
                    .to_string(),
            })?;
    BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
}
