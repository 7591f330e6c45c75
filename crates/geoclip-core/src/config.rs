//! Job file loading.
//!
//! A job file is a TOML document describing one extraction run. Sources and
//! bounding boxes can be given inline or by catalog identifier:
//!
//! ```toml
//! job_name = "wetlands_ak"
//! source = "fws_wetlands"              # or an inline [source] table
//! location = "disney_animal_kingdom"   # or bounding_box = [minlon, minlat, maxlon, maxlat]
//! formats = ["geojson", "filegdb"]
//! output_prefix = "extracted_data"
//!
//! [metadata]
//! requested_by = "gis-team"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::error::{GeoclipError, Result};
use crate::models::{BoundingBox, ExportFormat, ExtractionJob, SpatialSource};

#[derive(Debug, Deserialize)]
struct JobFile {
    job_name: Option<String>,
    source: SourceRef,
    bounding_box: Option<BboxRef>,
    location: Option<String>,
    formats: Option<Vec<ExportFormat>>,
    output_prefix: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
}

/// Source given either as a catalog identifier or inline.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceRef {
    Id(String),
    Inline(SpatialSource),
}

/// Box given either as the four ordered coordinates or as a table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BboxRef {
    Array([f64; 4]),
    Struct(BoundingBox),
}

/// Load and validate an extraction job from a TOML file.
pub fn load_job_file<P: AsRef<Path>>(path: P, catalog: &Catalog) -> Result<ExtractionJob> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let file: JobFile = toml::from_str(&content).map_err(|e| GeoclipError::ConfigInvalid {
        key: "job".to_string(),
        reason: format!("Failed to parse TOML: {}", e),
    })?;
    build_job(file, catalog)
}

fn build_job(file: JobFile, catalog: &Catalog) -> Result<ExtractionJob> {
    let source = match file.source {
        SourceRef::Id(id) => catalog.source(&id)?.clone(),
        SourceRef::Inline(source) => source,
    };

    let bbox = match (file.bounding_box, file.location) {
        (Some(BboxRef::Array([min_lon, min_lat, max_lon, max_lat])), _) => {
            BoundingBox::new(min_lon, min_lat, max_lon, max_lat)?
        }
        (Some(BboxRef::Struct(bbox)), _) => {
            bbox.validate()?;
            bbox
        }
        (None, Some(location)) => *catalog.location(&location)?,
        (None, None) => {
            return Err(GeoclipError::ConfigInvalid {
                key: "bounding_box".to_string(),
                reason: "either bounding_box or location must be provided".to_string(),
            })
        }
    };

    let mut job = ExtractionJob::new(
        file.job_name.unwrap_or_else(|| "extraction".to_string()),
        source,
        bbox,
    )
    .with_metadata(file.metadata);

    if let Some(formats) = file.formats {
        if formats.is_empty() {
            return Err(GeoclipError::ConfigInvalid {
                key: "formats".to_string(),
                reason: "at least one output format is required".to_string(),
            });
        }
        job = job.with_formats(formats);
    }
    if let Some(prefix) = file.output_prefix {
        job = job.with_output_prefix(prefix);
    }

    Ok(job.with_default_metadata())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_job(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_job_with_catalog_references() {
        let file = write_job(
            r#"
            job_name = "wetlands_ak"
            source = "fws_wetlands"
            location = "disney_animal_kingdom"
            formats = ["geojson", "csv"]
            "#,
        );

        let job = load_job_file(file.path(), &Catalog::builtin()).unwrap();
        assert_eq!(job.name, "wetlands_ak");
        assert_eq!(job.source.name, "FWS National Wetlands Inventory");
        assert_eq!(job.formats, vec![ExportFormat::Geojson, ExportFormat::Csv]);
        assert!(job.metadata.contains_key("extraction_date"));
    }

    #[test]
    fn test_job_with_inline_source_and_bbox_array() {
        let file = write_job(
            r#"
            bounding_box = [-81.61, 28.34, -81.56, 28.37]

            [source]
            name = "parcels"
            type = "dataset"
            locator = "data/parcels.geojson"
            geometry_column = "geom"
            "#,
        );

        let job = load_job_file(file.path(), &Catalog::builtin()).unwrap();
        assert_eq!(job.name, "extraction");
        assert_eq!(job.source.geometry_column, "geom");
        assert_eq!(job.bbox.to_array(), [-81.61, 28.34, -81.56, 28.37]);
    }

    #[test]
    fn test_job_requires_some_bbox() {
        let file = write_job(
            r#"
            source = "fws_wetlands"
            "#,
        );
        assert!(load_job_file(file.path(), &Catalog::builtin()).is_err());
    }

    #[test]
    fn test_job_rejects_invalid_bbox() {
        let file = write_job(
            r#"
            source = "fws_wetlands"
            bounding_box = [-81.56, 28.34, -81.61, 28.37]
            "#,
        );
        assert!(load_job_file(file.path(), &Catalog::builtin()).is_err());
    }

    #[test]
    fn test_unknown_source_id() {
        let file = write_job(
            r#"
            source = "not_a_source"
            bounding_box = [-81.61, 28.34, -81.56, 28.37]
            "#,
        );
        assert!(matches!(
            load_job_file(file.path(), &Catalog::builtin()),
            Err(GeoclipError::UnknownSource { .. })
        ));
    }
}
