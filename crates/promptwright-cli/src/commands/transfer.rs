use crate::app::App;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn export(app: &App, project_id: &str, output: Option<&Path>) -> Result<()> {
    let json = app.transfer.export_project_json(project_id).await?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote export");
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn import(app: &App, file: &Path) -> Result<()> {
    let json = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let report = app.transfer.import_project_json(&json).await?;

    println!("{}", report.project.id);
    if report.malformed_discarded + report.orphans_discarded > 0 {
        eprintln!(
            "Discarded {} malformed and {} orphaned entries",
            report.malformed_discarded, report.orphans_discarded
        );
    }
    Ok(())
}
