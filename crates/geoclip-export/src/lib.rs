//! Geoclip Export - Format drivers and the multi-format exporter
//!
//! One driver per output format, behind a common trait. The exporter walks
//! the driver list for a format (a format may have a fallback driver),
//! reports each attempt as an [`ExportResult`], and never aborts a batch
//! because one format failed.

pub mod drivers;
pub mod exporter;
pub mod wkb;

pub use drivers::{Availability, FormatDriver};
pub use exporter::{export, export_multiple};
