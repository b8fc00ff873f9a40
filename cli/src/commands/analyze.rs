//! `metaprobe analyze`: run the artifact pipeline on a local file.

use super::artifacts::print_record;
use anyhow::{Context, Result};
use metaprobe_core::AppConfig;
use metaprobe_db::Database;
use metaprobe_scanner::ScanController;
use std::path::Path;

pub async fn run(config: &AppConfig, db: Database, file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let controller = ScanController::new(config, db)?;
    let record = controller.pipeline().analyze_upload(&filename, bytes).await?;
    print_record(&record);
    Ok(())
}
