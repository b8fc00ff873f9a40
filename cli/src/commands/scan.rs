//! `metaprobe scan`: one target or a domain list, one job per site.

use anyhow::{Context, Result};
use metaprobe_core::{parse_domain_list, AppConfig, JobId};
use metaprobe_db::Database;
use metaprobe_scanner::{JobStatus, ScanController};
use std::path::PathBuf;
use tracing::{info, warn};

pub async fn run(
    config: &AppConfig,
    db: Database,
    target: Option<String>,
    domains: Option<PathBuf>,
    max_depth: u32,
) -> Result<()> {
    let targets = match (target, domains) {
        (Some(target), _) => vec![target],
        (None, Some(path)) => {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read domain list {}", path.display()))?;
            parse_domain_list(&contents)
        }
        (None, None) => anyhow::bail!("either --target or --domains is required"),
    };

    if targets.is_empty() {
        warn!("Domain list is empty, nothing to scan");
        return Ok(());
    }

    let controller = ScanController::new(config, db)?;
    for target in &targets {
        let job = match controller.start(target, max_depth) {
            Ok(job) => job,
            Err(e) => {
                warn!("Skipping {}: {}", target, e);
                continue;
            }
        };
        let status = wait_or_interrupt(&controller, &job, target).await?;
        print_summary(&status);
        if status.cancelled {
            info!("Scan interrupted, skipping remaining targets");
            break;
        }
    }

    Ok(())
}

/// Wait for a job to finish, stopping it on Ctrl-C.
async fn wait_or_interrupt(
    controller: &ScanController,
    job: &JobId,
    target: &str,
) -> Result<JobStatus> {
    tokio::select! {
        status = controller.wait(job) => return Ok(status?),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupt received, stopping scan of {}", target);
            controller.stop(job)?;
        }
    }

    Ok(controller.wait(job).await?)
}

fn print_summary(status: &JobStatus) {
    println!(
        "{}: {} pages, {} new artifacts, {} already recorded, {} errors{}",
        status.domain,
        status.pages_visited,
        status.artifacts_recorded,
        status.duplicates_skipped,
        status.errors,
        if status.cancelled { " (stopped)" } else { "" },
    );
}
