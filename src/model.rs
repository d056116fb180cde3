use serde::{Deserialize, Serialize};

use crate::diff::ChangeSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Target did not exist; written from a full translation.
    Created,
    Updated,
    Unchanged,
    /// No prior source revision on record; the current pair becomes the baseline.
    Baseline,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Baseline => "baseline",
            Self::Failed => "failed",
        }
    }

    pub fn is_success(self) -> bool {
        self != Self::Failed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub name: String,
    pub status: DocumentStatus,
    pub summary: Option<ChangeSummary>,
    pub source_sha256: String,
    pub target_sha256: Option<String>,
    pub heading_map_entries: Option<usize>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncCounts {
    pub documents: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub baseline: usize,
    pub failed: usize,
}

impl SyncCounts {
    pub fn from_reports(reports: &[DocumentReport]) -> Self {
        let mut counts = Self {
            documents: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.status {
                DocumentStatus::Created => counts.created += 1,
                DocumentStatus::Updated => counts.updated += 1,
                DocumentStatus::Unchanged => counts.unchanged += 1,
                DocumentStatus::Baseline => counts.baseline += 1,
                DocumentStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub source_directory: String,
    pub target_directory: String,
    pub source_language: String,
    pub target_language: String,
    pub dry_run: bool,
    pub counts: SyncCounts,
    pub documents: Vec<DocumentReport>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub document: String,
    pub source_sha256: String,
    pub source_text: String,
    pub target_sha256: Option<String>,
    pub synced_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub documents: usize,
    pub failed: usize,
}
