//! Domain models for the extraction pipeline

pub mod bbox;
pub mod export;
pub mod feature;
pub mod job;
pub mod source;

pub use bbox::{BoundingBox, QueryPredicate};
pub use export::{ExportFormat, ExportResult};
pub use feature::{AttributeFilter, Feature, FeatureCollection};
pub use job::ExtractionJob;
pub use source::{SourceKind, SpatialSource};
