use super::*;

/// Stores the synced source revision of every successful document so the
/// next run diffs against it.
pub(super) fn record_snapshots(
    ledger: &Ledger,
    jobs: &[DocumentJob],
    reports: &[DocumentReport],
) -> Result<usize> {
    let synced_at = now_utc_string();
    let mut stored = 0;

    for (job, report) in jobs.iter().zip(reports) {
        if !report.status.is_success() {
            continue;
        }
        ledger.store_snapshot(&SnapshotRecord {
            document: job.name.clone(),
            source_sha256: report.source_sha256.clone(),
            source_text: job.new_source.clone(),
            target_sha256: report.target_sha256.clone(),
            synced_at: synced_at.clone(),
        })?;
        stored += 1;
    }

    Ok(stored)
}

/// Ledger entries whose source document no longer exists.
pub(super) fn stale_snapshot_warnings(ledger: &Ledger, names: &[String]) -> Result<Vec<String>> {
    let current = names.iter().map(String::as_str).collect::<HashSet<_>>();
    let warnings = ledger
        .list_snapshots()?
        .into_iter()
        .filter(|snapshot| !current.contains(snapshot.document.as_str()))
        .map(|snapshot| {
            warn!(document = %snapshot.document, "ledger snapshot has no source document");
            format!("ledger snapshot for {} has no source document", snapshot.document)
        })
        .collect();
    Ok(warnings)
}

pub(super) fn log_reports(reports: &[DocumentReport]) {
    for report in reports {
        for warning in &report.warnings {
            warn!(document = %report.name, warning = %warning, "reconstruction warning");
        }
        if report.status == DocumentStatus::Failed {
            continue;
        }
        if let Some(summary) = report.summary {
            info!(
                document = %report.name,
                status = report.status.as_str(),
                changed = summary.changed,
                added = summary.added,
                removed = summary.removed,
                "document summary"
            );
        }
    }
}
