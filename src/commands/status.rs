use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use transync::ledger::Ledger;
use transync::model::SyncRunManifest;

use crate::cli::{StatusArgs, default_db_path};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = default_db_path(&args.cache_root, args.db_path.clone());

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_sync_manifest(&manifest_dir)? {
        Some(path) => {
            let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: SyncRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                finished_at = %manifest.finished_at,
                target_language = %manifest.target_language,
                dry_run = manifest.dry_run,
                documents = manifest.counts.documents,
                created = manifest.counts.created,
                updated = manifest.counts.updated,
                unchanged = manifest.counts.unchanged,
                baseline = manifest.counts.baseline,
                failed = manifest.counts.failed,
                "loaded latest sync manifest"
            );
            for report in manifest.documents.iter().filter(|report| !report.status.is_success()) {
                warn!(
                    document = %report.name,
                    error = %report.error.as_deref().unwrap_or_default(),
                    "document failed in latest run"
                );
            }
        }
        None => warn!(path = %manifest_dir.display(), "no sync manifest found"),
    }

    if db_path.exists() {
        let ledger = Ledger::open(&db_path)?;
        let snapshots = ledger.list_snapshots()?;
        let last_run = ledger.last_run()?;

        info!(
            path = %db_path.display(),
            schema_version = %ledger.schema_version()?.unwrap_or_default(),
            snapshots = snapshots.len(),
            last_run = %last_run.as_ref().map(|run| run.run_id.as_str()).unwrap_or_default(),
            last_run_failed = last_run.as_ref().map(|run| run.failed).unwrap_or_default(),
            "ledger status"
        );
    } else {
        warn!(path = %db_path.display(), "ledger file missing");
    }

    Ok(())
}

/// Newest `sync_run_*.json` in `manifest_dir`; names sort by timestamp.
fn latest_sync_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_sync_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("sync_run_") && name.ends_with(".json"));
        if is_sync_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
