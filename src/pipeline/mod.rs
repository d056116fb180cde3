//! Sequential per-document orchestration around the core.
//!
//! For each document: parse both source revisions, detect changes, ask the
//! translator for every changed or added section, reconstruct the target and
//! commit it. A failing document is reported and skipped; it never blocks the
//! rest of the batch.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::diff::{ChangeKind, ChangeRecord, ChangeSummary, detect_changes, has_changes};
use crate::error::FileError;
use crate::heading_map::{self, HeadingMap};
use crate::model::{DocumentReport, DocumentStatus};
use crate::reconstruct::{Reconstruction, locate_prior, reconstruct};
use crate::section::{Document, Section};
use crate::translate::{Glossary, Translator};
use crate::util::{sha256_text, write_text_atomic};

#[cfg(test)]
mod tests;

/// Where target documents are read from and committed to.
pub trait ContentStore {
    /// Current target text, or `None` when the document does not exist yet.
    fn read_target(&self, name: &str) -> Result<Option<String>>;

    fn commit(&self, name: &str, text: &str) -> Result<()>;
}

/// Target documents as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ContentStore for FsContentStore {
    fn read_target(&self, name: &str) -> Result<Option<String>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("failed to read {}", path.display()))
    }

    fn commit(&self, name: &str, text: &str) -> Result<()> {
        write_text_atomic(&self.path_for(name), text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    pub name: String,
    /// Source revision the current target was produced from, when known.
    pub old_source: Option<String>,
    pub new_source: String,
}

#[derive(Debug, Clone)]
pub struct SyncedDocument {
    pub status: DocumentStatus,
    pub summary: ChangeSummary,
    /// New target document and heading map; absent when nothing is written.
    pub reconstruction: Option<Reconstruction>,
}

/// Brings one target document up to date with `job.new_source`.
///
/// `target` is the current target text, `None` for a document that has not
/// been translated yet. Translation happens before reconstruction starts, so
/// a failure leaves no partial state behind.
pub fn sync_document<T>(
    job: &DocumentJob,
    target: Option<&str>,
    translator: &T,
    glossary: Option<&Glossary>,
) -> Result<SyncedDocument, FileError>
where
    T: Translator + ?Sized,
{
    let new = Document::parse(&job.new_source);
    for warning in &new.warnings {
        warn!(document = %job.name, %warning, "source parse warning");
    }

    let Some(target_text) = target else {
        let changes = detect_changes(&[], &new.sections);
        let translations = translate_changes(&changes, &[], &HeadingMap::new(), translator, glossary)?;
        let reconstruction = reconstruct(
            new.front_matter,
            &changes,
            |key| translations.get(key).cloned(),
            &HeadingMap::new(),
        )?;
        return Ok(SyncedDocument {
            status: DocumentStatus::Created,
            summary: ChangeSummary::of(&changes),
            reconstruction: Some(reconstruction),
        });
    };

    let Some(old_source) = job.old_source.as_deref() else {
        return Ok(SyncedDocument {
            status: DocumentStatus::Baseline,
            summary: ChangeSummary::default(),
            reconstruction: None,
        });
    };

    let old = Document::parse(old_source);
    let changes = detect_changes(&old.sections, &new.sections);
    let summary = ChangeSummary::of(&changes);
    if !has_changes(&changes) {
        return Ok(SyncedDocument {
            status: DocumentStatus::Unchanged,
            summary,
            reconstruction: None,
        });
    }

    let heading_map = heading_map::extract(target_text);
    let target_doc = Document::parse(target_text);
    for warning in &target_doc.warnings {
        warn!(document = %job.name, %warning, "target parse warning");
    }

    let translations = translate_changes(
        &changes,
        &target_doc.sections,
        &heading_map,
        translator,
        glossary,
    )?;
    let reconstruction = reconstruct(
        target_text,
        &changes,
        |key| translations.get(key).cloned(),
        &heading_map,
    )?;

    let status = if reconstruction.document == target_text {
        DocumentStatus::Unchanged
    } else {
        DocumentStatus::Updated
    };

    Ok(SyncedDocument {
        status,
        summary,
        reconstruction: Some(reconstruction),
    })
}

/// Collects fresh translations keyed by section key: the whole subtree of an
/// added section, the own text of a changed one.
pub fn translate_changes<T>(
    changes: &[ChangeRecord],
    targets: &[Section],
    heading_map: &HeadingMap,
    translator: &T,
    glossary: Option<&Glossary>,
) -> Result<HashMap<String, String>, FileError>
where
    T: Translator + ?Sized,
{
    let mut translations = HashMap::new();
    translate_level(changes, targets, heading_map, translator, glossary, &mut translations)?;
    Ok(translations)
}

fn translate_level<T>(
    records: &[ChangeRecord],
    targets: &[Section],
    heading_map: &HeadingMap,
    translator: &T,
    glossary: Option<&Glossary>,
    translations: &mut HashMap<String, String>,
) -> Result<(), FileError>
where
    T: Translator + ?Sized,
{
    for record in records {
        let prior = match record.kind {
            ChangeKind::Changed => locate_prior(record, targets, heading_map),
            _ => None,
        };

        if record.needs_translation() {
            let text = translate_record(record, prior, translator, glossary).map_err(|message| {
                FileError::Translation {
                    key: record.key.clone(),
                    message,
                }
            })?;
            translations.insert(record.key.clone(), text);
        }

        if record.kind == ChangeKind::Changed {
            let child_targets = prior.map(|section| section.subsections.as_slice()).unwrap_or(&[]);
            translate_level(
                &record.children,
                child_targets,
                heading_map,
                translator,
                glossary,
                translations,
            )?;
        }
    }
    Ok(())
}

fn translate_record<T>(
    record: &ChangeRecord,
    prior: Option<&Section>,
    translator: &T,
    glossary: Option<&Glossary>,
) -> Result<String, String>
where
    T: Translator + ?Sized,
{
    let Some(new) = record.new.as_ref() else {
        return Err("record has no source section".to_string());
    };

    let result = match (record.kind, record.old.as_ref(), prior) {
        (ChangeKind::Changed, Some(old), Some(prior)) => translator.translate_update(
            &old.own_text(),
            &new.own_text(),
            &prior.own_text(),
            glossary,
        ),
        (ChangeKind::Changed, _, _) => translator.translate_new(&new.own_text(), glossary),
        _ => translator.translate_new(&new.render(), glossary),
    };

    result.map_err(|err| err.message)
}

/// Runs every job in order and commits the successful ones. Each failure is
/// recorded against its document name; the batch always runs to the end.
pub fn run_batch<T, S>(
    jobs: &[DocumentJob],
    translator: &T,
    store: &S,
    glossary: Option<&Glossary>,
    dry_run: bool,
) -> Vec<DocumentReport>
where
    T: Translator + ?Sized,
    S: ContentStore + ?Sized,
{
    let mut reports = Vec::with_capacity(jobs.len());

    for job in jobs {
        let report = process_job(job, translator, store, glossary, dry_run);
        match report.status {
            DocumentStatus::Failed => error!(
                document = %report.name,
                error = %report.error.as_deref().unwrap_or_default(),
                "document failed"
            ),
            status => info!(document = %report.name, status = status.as_str(), "document processed"),
        }
        reports.push(report);
    }

    reports
}

fn process_job<T, S>(
    job: &DocumentJob,
    translator: &T,
    store: &S,
    glossary: Option<&Glossary>,
    dry_run: bool,
) -> DocumentReport
where
    T: Translator + ?Sized,
    S: ContentStore + ?Sized,
{
    let mut report = DocumentReport {
        name: job.name.clone(),
        status: DocumentStatus::Failed,
        summary: None,
        source_sha256: sha256_text(&job.new_source),
        target_sha256: None,
        heading_map_entries: None,
        warnings: Vec::new(),
        error: None,
    };

    let target = match store.read_target(&job.name) {
        Ok(target) => target,
        Err(err) => {
            report.error = Some(format!("{err:#}"));
            return report;
        }
    };

    let synced = match sync_document(job, target.as_deref(), translator, glossary) {
        Ok(synced) => synced,
        Err(err) => {
            report.error = Some(err.to_string());
            return report;
        }
    };

    report.summary = Some(synced.summary);
    report.target_sha256 = target.as_deref().map(sha256_text);

    if let Some(reconstruction) = synced.reconstruction {
        report.heading_map_entries = Some(reconstruction.heading_map.len());
        report.warnings = reconstruction
            .warnings
            .iter()
            .map(ToString::to_string)
            .collect();

        let writes = matches!(synced.status, DocumentStatus::Created | DocumentStatus::Updated);
        if writes && !dry_run {
            if let Err(err) = store.commit(&job.name, &reconstruction.document) {
                report.error = Some(format!("{err:#}"));
                return report;
            }
        }
        if writes {
            report.target_sha256 = Some(sha256_text(&reconstruction.document));
        }
    }

    report.status = synced.status;
    report
}
