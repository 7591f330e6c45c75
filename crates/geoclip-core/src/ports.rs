//! Port definitions for external collaborators.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ExportResult;

/// Identifier returned by an upload destination.
#[derive(Debug, Clone)]
pub struct RemoteArtifact {
    pub id: String,
    pub name: String,
}

/// Destination for exported artifacts (Box.com, S3, a local manifest, ...).
/// The pipeline hands over only successful export results together with the
/// job's metadata mapping; retry policy belongs to the implementation.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn upload(
        &self,
        artifact: &ExportResult,
        metadata: &BTreeMap<String, serde_json::Value>,
    ) -> Result<RemoteArtifact>;

    fn sink_name(&self) -> &str;
}
