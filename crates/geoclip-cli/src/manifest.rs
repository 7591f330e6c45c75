//! Local manifest sink.
//!
//! Records successful exports in an `upload_manifest.json` next to the
//! artifacts. It implements the same sink port a real upload destination
//! would, which keeps the extract command's handoff identical whether the
//! artifacts stay local or get shipped somewhere.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;

use geoclip_core::models::ExportResult;
use geoclip_core::ports::{ArtifactSink, RemoteArtifact};
use geoclip_core::{GeoclipError, Result};

pub struct ManifestSink {
    path: PathBuf,
}

impl ManifestSink {
    pub fn new(directory: &Path) -> Self {
        Self { path: directory.join("upload_manifest.json") }
    }

    fn read_entries(&self) -> Result<Vec<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| GeoclipError::Upload {
            path: self.path.clone(),
            reason: format!("existing manifest is not valid JSON: {}", e),
        })
    }
}

#[async_trait]
impl ArtifactSink for ManifestSink {
    async fn upload(
        &self,
        artifact: &ExportResult,
        metadata: &BTreeMap<String, serde_json::Value>,
    ) -> Result<RemoteArtifact> {
        let name = artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| artifact.format.to_string());
        let id = format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S%3f"), name);

        let mut entries = self.read_entries()?;
        entries.push(serde_json::json!({
            "id": id,
            "name": name,
            "path": artifact.path,
            "format": artifact.format,
            "feature_count": artifact.feature_count,
            "byte_size": artifact.byte_size,
            "metadata": metadata,
        }));

        let text = serde_json::to_string_pretty(&entries).map_err(|e| GeoclipError::Upload {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, text)?;

        tracing::debug!(manifest = %self.path.display(), %id, "artifact recorded");
        Ok(RemoteArtifact { id, name })
    }

    fn sink_name(&self) -> &str {
        "local manifest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoclip_core::models::ExportFormat;

    fn artifact(path: PathBuf) -> ExportResult {
        ExportResult::succeeded(ExportFormat::Geojson, path, 3, 128)
    }

    #[tokio::test]
    async fn test_manifest_accumulates_entries() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ManifestSink::new(dir.path());
        let metadata = BTreeMap::new();

        let first = sink
            .upload(&artifact(dir.path().join("a.geojson")), &metadata)
            .await
            .unwrap();
        sink.upload(&artifact(dir.path().join("b.geojson")), &metadata)
            .await
            .unwrap();

        assert_eq!(first.name, "a.geojson");

        let text = std::fs::read_to_string(dir.path().join("upload_manifest.json")).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["feature_count"], 3);
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_an_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("upload_manifest.json"), "not json").unwrap();

        let sink = ManifestSink::new(dir.path());
        let err = sink
            .upload(&artifact(dir.path().join("a.geojson")), &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoclipError::Upload { .. }));
    }
}
