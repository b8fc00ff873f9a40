//! `metaprobe list`, `metaprobe clear` and `metaprobe stats`.

use anyhow::Result;
use metaprobe_core::ArtifactRecord;
use metaprobe_db::{ArtifactFilter, Database};

pub async fn list(
    db: &Database,
    domain: Option<String>,
    query: Option<String>,
    json: bool,
) -> Result<()> {
    let filter = ArtifactFilter {
        domain,
        text_query: query,
    };
    let records = db.list_artifacts(&filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No artifacts recorded.");
        return Ok(());
    }
    for record in &records {
        print_record(record);
    }
    println!("{} artifact(s)", records.len());
    Ok(())
}

pub async fn clear(db: &Database, domain: &str) -> Result<()> {
    let summary = db.purge_domain(domain).await?;
    println!(
        "Cleared {}: {} record(s), {} file(s) removed",
        domain, summary.records_deleted, summary.files_removed
    );
    if summary.file_errors > 0 {
        eprintln!("{} file(s) could not be removed", summary.file_errors);
    }
    Ok(())
}

pub async fn stats(db: &Database) -> Result<()> {
    let totals = db.totals().await?;
    println!("Files: {}", totals.total_files);
    println!("Bytes: {}", totals.total_bytes);
    Ok(())
}

pub(crate) fn print_record(record: &ArtifactRecord) {
    println!("{}  [{}]  {} bytes", record.url, record.domain, record.filesize);
    let meta = &record.metadata;
    let fields = [
        ("Author", &meta.author),
        ("Title", &meta.title),
        ("CreateDate", &meta.create_date),
        ("ModifyDate", &meta.modify_date),
        ("CreatorTool", &meta.creator_tool),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("    {label}: {value}");
        }
    }
    for finding in &meta.sensitive_findings {
        println!("    ! {}: {}", finding.kind.as_str(), finding.values.join(", "));
    }
}
