//! Merges fresh translations with retained prior translations.
//!
//! The walk follows the new source tree level by level. Unchanged sections are
//! copied verbatim from the parsed target document, changed sections take new
//! own text and recurse, added subtrees come entirely from fresh text, and
//! removed sections are left out. A section is always rendered as its own text
//! followed by its subsections' renderings; nothing is ever re-derived from
//! leftover parent content.

use serde::Serialize;
use tracing::warn;

use crate::diff::{ChangeKind, ChangeRecord};
use crate::error::{FileError, MatchWarning};
use crate::heading_map::{self, HeadingMap};
use crate::section::{Document, Section, heading_line_for, push_block, slugify};

mod fragment;

pub use fragment::{OwnFragment, count_headings, own_fragment, subtree_fragment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconstruction {
    pub document: String,
    pub heading_map: HeadingMap,
    pub warnings: Vec<MatchWarning>,
}

/// Rebuilds the target document for the new source tree described by
/// `changes`.
///
/// `translated_text_for` is asked for the fresh translation of a section key:
/// heading line plus own body for `changed` sections, the whole subtree for
/// `added` ones. Any required text that is absent or malformed fails the
/// whole document; no partial output is produced.
pub fn reconstruct<F>(
    target_text: &str,
    changes: &[ChangeRecord],
    translated_text_for: F,
    heading_map: &HeadingMap,
) -> Result<Reconstruction, FileError>
where
    F: Fn(&str) -> Option<String>,
{
    let target = Document::parse(target_text);
    let mut engine = Engine {
        lookup: &translated_text_for,
        prior: heading_map,
        resolved: HeadingMap::new(),
        warnings: Vec::new(),
        fresh: false,
    };

    let mut body = String::with_capacity(target.body.len());
    engine.render_top_level(changes, &target.sections, &mut body)?;

    if engine.fresh && !body.is_empty() {
        let end = body.trim_end().len();
        body.truncate(end);
        body.push('\n');
    }

    let updated = heading_map.update(changes, &engine.resolved);

    let mut document = String::with_capacity(target.front_matter.len() + body.len());
    document.push_str(target.front_matter);
    push_block(&mut document, &body);

    Ok(Reconstruction {
        document: heading_map::inject(&document, &updated),
        heading_map: updated,
        warnings: engine.warnings,
    })
}

/// Finds the prior target counterpart of a record among `targets` without
/// claiming anything: preamble to preamble, then the recorded heading, then
/// old position.
pub fn locate_prior<'t>(
    record: &ChangeRecord,
    targets: &'t [Section],
    heading_map: &HeadingMap,
) -> Option<&'t Section> {
    if record.is_preamble() {
        return targets.iter().find(|section| section.is_preamble());
    }

    let by_heading = heading_map
        .get(&record.key)
        .and_then(|heading| heading_candidate(targets, &slugify(heading), record.old_position, |_| true));

    by_heading
        .map(|index| &targets[index])
        .or_else(|| {
            let position = record.old_position?;
            targets.iter().filter(|section| !section.is_preamble()).nth(position)
        })
}

/// Index of the target whose heading slugs to `wanted`. Several targets may
/// share a translated heading; the one at `old_position` among headed
/// siblings wins, otherwise the first available one.
fn heading_candidate<A>(
    targets: &[Section],
    wanted: &str,
    old_position: Option<usize>,
    available: A,
) -> Option<usize>
where
    A: Fn(usize) -> bool,
{
    let mut first = None;
    let mut position = 0usize;

    for (index, section) in targets.iter().enumerate() {
        if section.is_preamble() {
            continue;
        }
        let current = position;
        position += 1;

        if !available(index) || slugify(&section.heading) != wanted {
            continue;
        }
        if old_position == Some(current) {
            return Some(index);
        }
        first.get_or_insert(index);
    }

    first
}

struct Engine<'a, F> {
    lookup: &'a F,
    prior: &'a HeadingMap,
    /// Target headings observed or produced during this walk.
    resolved: HeadingMap,
    warnings: Vec<MatchWarning>,
    fresh: bool,
}

impl<F> Engine<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn render_top_level(
        &mut self,
        records: &[ChangeRecord],
        targets: &[Section],
        out: &mut String,
    ) -> Result<(), FileError> {
        if !records.iter().any(ChangeRecord::is_preamble) {
            if let Some(preamble) = targets.iter().find(|section| section.is_preamble()) {
                preamble.render_into(out);
            }
        }
        self.render_level(records, targets, out)
    }

    fn render_level(
        &mut self,
        records: &[ChangeRecord],
        targets: &[Section],
        out: &mut String,
    ) -> Result<(), FileError> {
        let matches = self.match_targets(records, targets);

        for (record, matched) in records.iter().zip(matches) {
            let target = matched.map(|index| &targets[index]);
            match record.kind {
                ChangeKind::Removed => {}
                ChangeKind::Unchanged => self.render_unchanged(record, target, out)?,
                ChangeKind::Changed => self.render_changed(record, target, out)?,
                ChangeKind::Added => self.render_added(record, out)?,
            }
        }

        Ok(())
    }

    /// Pairs records with target siblings: preamble to preamble, then by the
    /// recorded target heading (old position breaks ties), then by old
    /// position alone. Each target section is
    /// claimed at most once, so nothing is emitted twice.
    fn match_targets(&mut self, records: &[ChangeRecord], targets: &[Section]) -> Vec<Option<usize>> {
        let mut claimed = vec![false; targets.len()];
        let mut matches = vec![None; records.len()];

        for (slot, record) in matches.iter_mut().zip(records) {
            if record.kind == ChangeKind::Added {
                continue;
            }
            let found = if record.is_preamble() {
                targets.iter().position(Section::is_preamble)
            } else {
                self.prior.get(&record.key).and_then(|heading| {
                    heading_candidate(targets, &slugify(heading), record.old_position, |index| {
                        !claimed[index]
                    })
                })
            };
            if let Some(index) = found.filter(|index| !claimed[*index]) {
                claimed[index] = true;
                *slot = Some(index);
            }
        }

        for (slot, record) in matches.iter_mut().zip(records) {
            if slot.is_some()
                || record.is_preamble()
                || !matches!(record.kind, ChangeKind::Unchanged | ChangeKind::Changed)
            {
                continue;
            }
            let Some(position) = record.old_position else {
                continue;
            };
            let found = targets
                .iter()
                .enumerate()
                .filter(|(_, section)| !section.is_preamble())
                .nth(position)
                .map(|(index, _)| index);
            if let Some(index) = found.filter(|index| !claimed[*index]) {
                claimed[index] = true;
                *slot = Some(index);
                warn!(key = %record.key, position, "heading-map lookup failed; matched by position");
                self.warnings.push(MatchWarning::PositionFallback {
                    key: record.key.clone(),
                    position,
                });
            }
        }

        matches
    }

    fn render_unchanged(
        &mut self,
        record: &ChangeRecord,
        target: Option<&Section>,
        out: &mut String,
    ) -> Result<(), FileError> {
        if let Some(target) = target {
            target.render_into(out);
            self.record_retained(record, target);
            return Ok(());
        }

        if self.fresh_text(&record.key).is_some() {
            return self.render_added(record, out);
        }

        if record.is_preamble() {
            let blank = record
                .section()
                .is_none_or(|section| section.content.trim().is_empty());
            if !blank {
                warn!("unchanged preamble has no counterpart in the target document");
                self.warnings.push(MatchWarning::MissingPreamble);
            }
            return Ok(());
        }

        Err(FileError::UnresolvedSection {
            key: record.key.clone(),
        })
    }

    fn render_changed(
        &mut self,
        record: &ChangeRecord,
        target: Option<&Section>,
        out: &mut String,
    ) -> Result<(), FileError> {
        let Some(source) = record.new.as_ref() else {
            return Ok(());
        };

        match (self.fresh_text(&record.key), target) {
            (Some(text), _) => {
                let fragment = own_fragment(&record.key, &text, record.is_preamble())?;
                if !record.is_preamble() {
                    let heading = match fragment.heading {
                        Some(heading) => heading,
                        None => self.source_heading_fallback(record, source),
                    };
                    ensure_blank_line(out);
                    push_block(out, &heading_line_for(source.level, &heading));
                    self.resolved.insert(&record.key, &heading);
                }
                push_fresh_content(out, &fragment.content);
                self.fresh = true;
            }
            (None, Some(target)) if !record.content_changed => {
                if target.level == source.level {
                    push_block(out, &target.heading_line);
                } else {
                    push_block(out, &heading_line_for(source.level, &target.heading));
                }
                push_block(out, &target.content);
                if !record.is_preamble() {
                    self.resolved.insert(&record.key, &target.heading);
                }
            }
            (None, _) => {
                return Err(FileError::MissingTranslation {
                    key: record.key.clone(),
                });
            }
        }

        let child_targets = target.map(|section| section.subsections.as_slice()).unwrap_or(&[]);
        self.render_level(&record.children, child_targets, out)
    }

    fn render_added(&mut self, record: &ChangeRecord, out: &mut String) -> Result<(), FileError> {
        let Some(source) = record.new.as_ref() else {
            return Ok(());
        };
        let text = self
            .fresh_text(&record.key)
            .ok_or_else(|| FileError::MissingTranslation {
                key: record.key.clone(),
            })?;

        if record.is_preamble() {
            let fragment = own_fragment(&record.key, &text, true)?;
            push_fresh_content(out, &fragment.content);
            self.fresh = true;
            return Ok(());
        }

        let mut section = subtree_fragment(&record.key, &text, source)?;
        section.relevel(i16::from(source.level) - i16::from(section.level));
        render_fresh_section(out, &section);
        self.record_fresh(record, &section);
        self.fresh = true;
        Ok(())
    }

    /// Records target headings for a verbatim-copied subtree.
    fn record_retained(&mut self, record: &ChangeRecord, target: &Section) {
        if !record.is_preamble() {
            self.resolved.insert(&record.key, &target.heading);
        }

        let matches = self.match_targets(&record.children, &target.subsections);
        for (child, matched) in record.children.iter().zip(matches) {
            if child.kind == ChangeKind::Removed {
                continue;
            }
            match matched {
                Some(index) => self.record_retained(child, &target.subsections[index]),
                None => self.record_unmatched(child),
            }
        }
    }

    fn record_unmatched(&mut self, record: &ChangeRecord) {
        if self.prior.contains_key(&record.key) {
            for child in &record.children {
                self.record_unmatched(child);
            }
            return;
        }

        if let Some(source) = record.section() {
            let heading = self.source_heading_fallback(record, source);
            self.resolved.insert(&record.key, &heading);
        }
        for child in &record.children {
            self.record_unmatched(child);
        }
    }

    /// Records headings of a freshly translated subtree, pairing descendants
    /// with source descendants by position.
    fn record_fresh(&mut self, record: &ChangeRecord, section: &Section) {
        self.resolved.insert(&record.key, &section.heading);
        for (child, translated) in record.children.iter().zip(&section.subsections) {
            self.record_fresh(child, translated);
        }
    }

    fn source_heading_fallback(&mut self, record: &ChangeRecord, source: &Section) -> String {
        warn!(key = %record.key, "no translated heading; using the source heading");
        self.warnings.push(MatchWarning::SourceHeadingFallback {
            key: record.key.clone(),
        });
        source.heading.clone()
    }

    fn fresh_text(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|text| !text.trim().is_empty())
    }
}

fn render_fresh_section(out: &mut String, section: &Section) {
    ensure_blank_line(out);
    if section.heading_line.ends_with('\n') {
        push_block(out, &section.heading_line);
    } else {
        push_block(out, &heading_line_for(section.level, &section.heading));
    }
    push_fresh_content(out, &section.content);
    for child in &section.subsections {
        render_fresh_section(out, child);
    }
}

/// Separates a fresh heading from whatever precedes it by one blank line.
fn ensure_blank_line(out: &mut String) {
    if out.is_empty() || out.ends_with("\n\n") {
        return;
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
}

/// Appends translated body text, closed by one blank line.
fn push_fresh_content(out: &mut String, content: &str) {
    let trimmed = content.trim_end();
    if trimmed.trim().is_empty() {
        out.push('\n');
        return;
    }
    push_block(out, trimmed);
    out.push_str("\n\n");
}
