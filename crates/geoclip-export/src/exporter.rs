//! Multi-format export orchestration.

use std::path::{Path, PathBuf};

use futures::future::join_all;

use geoclip_core::models::{ExportFormat, ExportResult, FeatureCollection};

use crate::drivers::{drivers_for, Availability, FormatDriver};

/// A fallback driver writes a different container than the requested format,
/// so the requested format's extension is folded into the file name. Keeps
/// `filegdb` and `geopackage` in one request from landing on the same file.
fn artifact_path(stem: &Path, format: ExportFormat, driver: &dyn FormatDriver) -> PathBuf {
    if driver.extension() == format.extension() {
        return stem.with_extension(driver.extension());
    }
    let mut name = stem.as_os_str().to_os_string();
    name.push("_");
    name.push(format.extension());
    PathBuf::from(name).with_extension(driver.extension())
}

/// Export a collection to one format, trying the format's drivers in order.
///
/// Never returns an error: a failed export is an [`ExportResult`] with
/// `success == false` and the reasons from every driver that was tried.
/// `stem` is the output path without an extension; the winning driver
/// appends its own.
pub async fn export(
    collection: &FeatureCollection,
    format: ExportFormat,
    stem: &Path,
) -> ExportResult {
    let mut reasons = Vec::new();
    for driver in drivers_for(format) {
        if let Availability::Unavailable { reason } = driver.availability() {
            tracing::warn!(
                driver = driver.name(),
                %format,
                reason,
                "driver unavailable, trying next"
            );
            reasons.push(format!("{}: {}", driver.name(), reason));
            continue;
        }

        let path = artifact_path(stem, format, driver.as_ref());
        match driver.write(collection, &path).await {
            Ok(()) => {
                let byte_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                tracing::info!(
                    driver = driver.name(),
                    path = %path.display(),
                    features = collection.len(),
                    byte_size,
                    "export complete"
                );
                return ExportResult::succeeded(format, path, collection.len(), byte_size);
            }
            Err(e) => {
                tracing::error!(driver = driver.name(), error = %e, "export failed");
                reasons.push(format!("{}: {}", driver.name(), e));
            }
        }
    }

    ExportResult::failed(
        format,
        stem.with_extension(format.extension()),
        reasons.join("; "),
    )
}

/// Export to several formats. Results come back in request order, one per
/// format, and a failing format never aborts the others.
pub async fn export_multiple(
    collection: &FeatureCollection,
    formats: &[ExportFormat],
    stem: &Path,
) -> Vec<ExportResult> {
    let results = join_all(
        formats
            .iter()
            .map(|format| export(collection, *format, stem)),
    )
    .await;

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        tracing::warn!(
            requested = formats.len(),
            failed,
            "some formats failed to export"
        );
    }
    results
}
