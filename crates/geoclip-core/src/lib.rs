//! Geoclip Core - Domain models, source catalog, and configuration
//!
//! This crate contains the core domain types of the extraction pipeline:
//! bounding boxes, source descriptors, jobs, feature collections, and the
//! export result model, plus the error taxonomy shared by all crates.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{GeoclipError, Result};
