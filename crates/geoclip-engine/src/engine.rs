//! The extraction engine and its connection lifecycle.

use std::fmt;
use std::time::Duration;

use geoclip_core::models::{
    AttributeFilter, BoundingBox, FeatureCollection, SourceKind, SpatialSource,
};
use geoclip_core::{GeoclipError, Result};
use geoclip_geo::fold_extents;

use crate::api;
use crate::readers::{self, GEOMETRY_COLUMN_CANDIDATES};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection lifecycle of an [`ExtractionEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Connected,
    Queried,
    Closed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Connected => "connected",
            EngineState::Queried => "queried",
            EngineState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Access capabilities an engine needs before it can scan a source. Each
/// maps to a loadable access layer; an unknown scheme has no layer to load
/// and connecting fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCapability {
    /// Geometry predicates and format decoding. Always required.
    Spatial,
    /// HTTP(S) reads, both raw objects and GIS APIs.
    HttpFs,
    /// S3 reads. Requires credentials in the environment.
    S3Fs,
}

impl EngineCapability {
    pub fn name(&self) -> &'static str {
        match self {
            EngineCapability::Spatial => "spatial",
            EngineCapability::HttpFs => "httpfs",
            EngineCapability::S3Fs => "s3fs",
        }
    }

    /// Capabilities a source needs, derived from its locator scheme.
    pub fn required_for(source: &SpatialSource) -> Result<Vec<Self>> {
        let mut required = vec![EngineCapability::Spatial];
        match &source.kind {
            SourceKind::Dataset { locator, .. } => {
                let scheme = locator.split_once("://").map(|(s, _)| s);
                match scheme {
                    None | Some("file") => {}
                    Some("http") | Some("https") => required.push(EngineCapability::HttpFs),
                    Some("s3") => required.push(EngineCapability::S3Fs),
                    Some(other) => {
                        return Err(GeoclipError::ExtensionLoad {
                            name: other.to_string(),
                            reason: "no filesystem capability for this scheme".to_string(),
                        })
                    }
                }
            }
            // Every API flavor speaks HTTP.
            _ => required.push(EngineCapability::HttpFs),
        }
        Ok(required)
    }

    fn load(&self) -> Result<()> {
        match self {
            EngineCapability::Spatial | EngineCapability::HttpFs => Ok(()),
            EngineCapability::S3Fs => {
                let has_credentials = std::env::var("AWS_ACCESS_KEY_ID").is_ok()
                    && std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
                if has_credentials {
                    Ok(())
                } else {
                    Err(GeoclipError::ExtensionLoad {
                        name: self.name().to_string(),
                        reason: "AWS credentials not found in environment".to_string(),
                    })
                }
            }
        }
    }
}

/// Scans one spatial source and materializes bbox-filtered collections.
///
/// Lifecycle: `Idle` until [`connect`](Self::connect) succeeds, `Connected`
/// once capabilities are loaded, `Queried` after the first successful scan,
/// `Closed` after [`close`](Self::close). Extraction is only legal in
/// `Connected` or `Queried`.
#[derive(Debug)]
pub struct ExtractionEngine {
    source: SpatialSource,
    timeout: Duration,
    state: EngineState,
    capabilities: Vec<EngineCapability>,
}

impl ExtractionEngine {
    pub fn new(source: SpatialSource) -> Self {
        Self {
            source,
            timeout: DEFAULT_TIMEOUT,
            state: EngineState::Idle,
            capabilities: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn source(&self) -> &SpatialSource {
        &self.source
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Capabilities loaded by the last successful [`connect`](Self::connect).
    pub fn capabilities(&self) -> &[EngineCapability] {
        &self.capabilities
    }

    /// Load every capability the source requires. On failure the engine
    /// stays `Idle` and can be retried; on a closed engine this is an error.
    pub fn connect(&mut self) -> Result<()> {
        if self.state == EngineState::Closed {
            return Err(GeoclipError::EngineState {
                state: self.state.to_string(),
                expected: "idle".to_string(),
            });
        }
        let required = EngineCapability::required_for(&self.source)?;
        for capability in &required {
            capability.load().map_err(|e| {
                tracing::error!(capability = capability.name(), error = %e, "capability load failed");
                e
            })?;
        }
        tracing::info!(
            source = %self.source.name,
            capabilities = ?required.iter().map(|c| c.name()).collect::<Vec<_>>(),
            "engine connected"
        );
        self.capabilities = required;
        self.state = EngineState::Connected;
        Ok(())
    }

    /// Extract exactly the features whose geometry intersects `bbox`.
    ///
    /// The box is validated first, so a degenerate or inverted box never
    /// reaches the scan. The source's geometry column is resolved before the
    /// predicate is applied; a source with no usable geometry column fails
    /// here, not with an empty result.
    pub async fn extract(&mut self, bbox: &BoundingBox) -> Result<FeatureCollection> {
        bbox.validate()?;
        self.require_open()?;

        let mut collection = self.scan(Some(bbox)).await?;
        self.resolve_geometry_column(&mut collection)?;

        let predicate = bbox.to_query_predicate();
        let before = collection.len();
        let collection = collection.filter_bbox(&predicate);
        tracing::info!(
            source = %self.source.name,
            scanned = before,
            matched = collection.len(),
            %bbox,
            "extraction complete"
        );
        self.state = EngineState::Queried;
        Ok(collection)
    }

    /// Read the whole source without a spatial predicate.
    pub async fn collect(&mut self) -> Result<FeatureCollection> {
        self.require_open()?;
        let mut collection = self.scan(None).await?;
        self.resolve_geometry_column(&mut collection)?;
        self.state = EngineState::Queried;
        Ok(collection)
    }

    /// Bounding box of the source, folding extents during the scan instead
    /// of materializing a filtered collection first. Produces the same box
    /// as running the in-memory calculator over [`collect`](Self::collect).
    pub async fn calculate_extent(
        &mut self,
        feature_filter: Option<&AttributeFilter>,
    ) -> Result<BoundingBox> {
        self.require_open()?;
        let mut collection = self.scan(None).await?;
        self.resolve_geometry_column(&mut collection)?;

        let geometries = collection
            .features
            .iter()
            .filter(|f| feature_filter.map_or(true, |filter| f.matches(filter)))
            .map(|f| &f.geometry);
        let bbox = fold_extents(geometries).ok_or(GeoclipError::EmptyCollection)?;
        self.state = EngineState::Queried;
        Ok(bbox)
    }

    /// Column names of the source, geometry column last.
    pub async fn schema(&mut self) -> Result<Vec<String>> {
        self.require_open()?;
        let mut collection = self.scan(None).await?;
        self.resolve_geometry_column(&mut collection)?;
        self.state = EngineState::Queried;
        Ok(collection.schema())
    }

    /// Close the engine. Idempotent; a closed engine rejects every scan.
    pub fn close(&mut self) {
        if self.state != EngineState::Closed {
            tracing::debug!(source = %self.source.name, "engine closed");
        }
        self.state = EngineState::Closed;
        self.capabilities.clear();
    }

    fn require_open(&self) -> Result<()> {
        match self.state {
            EngineState::Connected | EngineState::Queried => Ok(()),
            other => Err(GeoclipError::EngineState {
                state: other.to_string(),
                expected: "connected or queried".to_string(),
            }),
        }
    }

    async fn scan(&self, bbox: Option<&BoundingBox>) -> Result<FeatureCollection> {
        match &self.source.kind {
            SourceKind::Dataset { .. } => readers::read_dataset(&self.source).await,
            _ => api::fetch(&self.source, bbox, self.timeout).await,
        }
    }

    /// Reconcile the configured geometry column with what the scan produced.
    /// A mismatch is tolerated when the scan's column is one of the
    /// conventional names; anything else is a hard error carrying the
    /// columns that do exist.
    fn resolve_geometry_column(&self, collection: &mut FeatureCollection) -> Result<()> {
        let configured = &self.source.geometry_column;
        if &collection.geometry_column == configured {
            return Ok(());
        }
        if GEOMETRY_COLUMN_CANDIDATES.contains(&collection.geometry_column.as_str()) {
            tracing::warn!(
                configured,
                detected = %collection.geometry_column,
                "configured geometry column not found, using detected column"
            );
            return Ok(());
        }
        Err(GeoclipError::MissingGeometryColumn {
            column: configured.clone(),
            available: collection.schema(),
        })
    }
}
