//! Geoclip Engine - Spatially filtered extraction from tabular+geometry sources
//!
//! The engine connects to a source (local file, URL, S3 path, or GIS API),
//! reads its native format as rows, applies an exact intersects predicate
//! against a bounding box, and materializes a feature collection. It is a
//! thin, swappable layer: it guarantees that the returned collection
//! contains exactly the features intersecting the box, and nothing else. It
//! does not reproject and it does not retry.

pub mod api;
pub mod engine;
pub mod readers;
pub mod store;

pub use engine::{EngineCapability, EngineState, ExtractionEngine};
