//! Extraction job description.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::json;

use crate::models::{BoundingBox, ExportFormat, SpatialSource};

/// One extraction run: a source, a box, and the desired outputs.
/// Constructed once from CLI flags or a job file; read-only thereafter.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub name: String,
    pub source: SpatialSource,
    pub bbox: BoundingBox,
    pub formats: Vec<ExportFormat>,
    pub output_prefix: String,
    /// Free-form metadata attached to artifacts on upload.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ExtractionJob {
    pub fn new(name: impl Into<String>, source: SpatialSource, bbox: BoundingBox) -> Self {
        Self {
            name: name.into(),
            source,
            bbox,
            formats: vec![ExportFormat::Geojson, ExportFormat::Filegdb],
            output_prefix: "extracted_data".to_string(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_formats(mut self, formats: Vec<ExportFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Fill in the standard metadata keys recorded with every run. Caller
    /// supplied values win.
    pub fn with_default_metadata(mut self) -> Self {
        self.metadata
            .entry("extraction_date".to_string())
            .or_insert_with(|| json!(Utc::now().to_rfc3339()));
        self.metadata
            .entry("source".to_string())
            .or_insert_with(|| json!(self.source.name.clone()));
        self.metadata
            .entry("bbox".to_string())
            .or_insert_with(|| json!(self.bbox.to_array().to_vec()));
        self
    }

    /// Base file name for artifacts of this run: `{prefix}_{job}_{timestamp}`.
    pub fn artifact_stem(&self) -> String {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        format!("{}_{}_{}", self.output_prefix, self.name, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> ExtractionJob {
        let source = SpatialSource::dataset("parcels", "parcels.geojson");
        let bbox = BoundingBox::new(-81.61, 28.34, -81.56, 28.37).unwrap();
        ExtractionJob::new("nightly", source, bbox)
    }

    #[test]
    fn test_defaults() {
        let job = sample_job();
        assert_eq!(job.formats, vec![ExportFormat::Geojson, ExportFormat::Filegdb]);
        assert_eq!(job.output_prefix, "extracted_data");
    }

    #[test]
    fn test_default_metadata_does_not_override() {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), json!("custom"));

        let job = sample_job().with_metadata(metadata).with_default_metadata();

        assert_eq!(job.metadata["source"], json!("custom"));
        assert!(job.metadata.contains_key("extraction_date"));
        assert_eq!(job.metadata["bbox"], json!([-81.61, 28.34, -81.56, 28.37]));
    }

    #[test]
    fn test_artifact_stem_shape() {
        let stem = sample_job().artifact_stem();
        assert!(stem.starts_with("extracted_data_nightly_"));
    }
}
