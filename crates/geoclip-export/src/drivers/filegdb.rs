//! FileGDB driver stub.
//!
//! There is no writable FileGDB implementation available to this build, so
//! the driver always reports itself unavailable and the exporter falls
//! through to the GeoPackage driver, which writes an open container with the
//! same layer contents.

use std::path::Path;

use async_trait::async_trait;

use geoclip_core::models::FeatureCollection;
use geoclip_core::{GeoclipError, Result};

use super::{Availability, FormatDriver};

pub struct FileGdbDriver;

#[async_trait]
impl FormatDriver for FileGdbDriver {
    fn name(&self) -> &'static str {
        "filegdb"
    }

    fn extension(&self) -> &'static str {
        "gdb"
    }

    fn availability(&self) -> Availability {
        Availability::Unavailable {
            reason: "no writable FileGDB driver in this build".to_string(),
        }
    }

    async fn write(&self, _collection: &FeatureCollection, _path: &Path) -> Result<()> {
        Err(GeoclipError::DriverUnavailable {
            driver: "filegdb".to_string(),
            reason: "no writable FileGDB driver in this build".to_string(),
        })
    }
}
