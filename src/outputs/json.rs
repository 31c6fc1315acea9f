//! JSON output for the storage layer.
//!
//! One file per run, grouped by local date and named after the edition:
//! `{output_dir}/{local_date}/{time_of_day}.json`. A later run of the same
//! edition replaces the earlier file.

use crate::error::Result;
use crate::models::IngestBatch;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Where [`write_batch`] puts `batch`.
pub fn batch_path(batch: &IngestBatch, output_dir: &str) -> PathBuf {
    Path::new(output_dir)
        .join(&batch.local_date)
        .join(format!("{}.json", batch.time_of_day))
}

/// Serialize `batch` and write it under `output_dir`, creating the date
/// directory as needed.
///
/// # Arguments
///
/// * `batch` - The ingested articles with their date and edition
/// * `output_dir` - Base directory for JSON output
///
/// # Returns
///
/// The path of the written file, or an error if directory creation,
/// serialization or the write fails.
///
/// # Output Path
///
/// The file is written to: `{output_dir}/{local_date}/{time_of_day}.json`.
/// A later run of the same edition replaces it.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_batch(batch: &IngestBatch, output_dir: &str) -> Result<PathBuf> {
    let json = serde_json::to_string(batch)?;
    let path = batch_path(batch, output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = batch.articles.len(), "Wrote JSON batch");
    Ok(path)
}
