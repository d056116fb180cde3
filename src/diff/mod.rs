//! Change classification between two same-language section trees.
//!
//! Sections are matched by id only, level by level. Content never takes part
//! in matching, so a heading edit that moves the id reads as a removal plus an
//! addition.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::section::{Section, qualify_key};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Unchanged,
    Changed,
    Added,
    Removed,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub id: String,
    /// Slash-joined ids from the top level down to this section.
    pub key: String,
    pub kind: ChangeKind,
    /// For `changed`: whether heading, level or own body differ. `false`
    /// means only descendants changed.
    pub content_changed: bool,
    /// Position among headed siblings of the old tree.
    pub old_position: Option<usize>,
    /// Position among headed siblings of the new tree.
    pub new_position: Option<usize>,
    #[serde(skip)]
    pub old: Option<Section>,
    #[serde(skip)]
    pub new: Option<Section>,
    pub children: Vec<ChangeRecord>,
}

impl ChangeRecord {
    pub fn is_preamble(&self) -> bool {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .is_some_and(Section::is_preamble)
    }

    /// The section this record describes in the newest tree it appears in.
    pub fn section(&self) -> Option<&Section> {
        self.new.as_ref().or(self.old.as_ref())
    }

    pub fn needs_translation(&self) -> bool {
        match self.kind {
            ChangeKind::Added => true,
            ChangeKind::Changed => self.content_changed,
            ChangeKind::Unchanged | ChangeKind::Removed => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub added: usize,
    pub removed: usize,
}

impl ChangeSummary {
    pub fn of(records: &[ChangeRecord]) -> Self {
        let mut summary = Self::default();
        summary.tally(records);
        summary
    }

    fn tally(&mut self, records: &[ChangeRecord]) {
        for record in records {
            match record.kind {
                ChangeKind::Unchanged => self.unchanged += 1,
                ChangeKind::Changed => self.changed += 1,
                ChangeKind::Added => self.added += 1,
                ChangeKind::Removed => self.removed += 1,
            }
            self.tally(&record.children);
        }
    }
}

pub fn has_changes(records: &[ChangeRecord]) -> bool {
    records
        .iter()
        .any(|record| record.kind != ChangeKind::Unchanged)
}

pub fn detect_changes(old: &[Section], new: &[Section]) -> Vec<ChangeRecord> {
    detect_level(old, new, "")
}

fn detect_level(old: &[Section], new: &[Section], parent_key: &str) -> Vec<ChangeRecord> {
    let old_positions = headed_positions(old);
    let new_positions = headed_positions(new);

    let mut pending = HashMap::<&str, VecDeque<usize>>::new();
    for (index, section) in old.iter().enumerate() {
        pending.entry(section.id.as_str()).or_default().push_back(index);
    }

    let mut matched = vec![false; old.len()];
    let mut records = Vec::with_capacity(new.len());

    for (new_index, new_section) in new.iter().enumerate() {
        let key = qualify_key(parent_key, &new_section.id);
        let old_index = pending
            .get_mut(new_section.id.as_str())
            .and_then(VecDeque::pop_front);

        let Some(old_index) = old_index else {
            records.push(added_tree(new_section, new_positions[new_index], parent_key));
            continue;
        };

        matched[old_index] = true;
        let old_section = &old[old_index];
        let children = detect_level(&old_section.subsections, &new_section.subsections, &key);
        let content_changed = !old_section.same_own_content(new_section);
        let kind = if content_changed || has_changes(&children) {
            ChangeKind::Changed
        } else {
            ChangeKind::Unchanged
        };

        records.push(ChangeRecord {
            id: new_section.id.clone(),
            key,
            kind,
            content_changed,
            old_position: old_positions[old_index],
            new_position: new_positions[new_index],
            old: Some(old_section.clone()),
            new: Some(new_section.clone()),
            children,
        });
    }

    for (old_index, old_section) in old.iter().enumerate() {
        if !matched[old_index] {
            records.push(removed_tree(old_section, old_positions[old_index], parent_key));
        }
    }

    records
}

fn added_tree(section: &Section, position: Option<usize>, parent_key: &str) -> ChangeRecord {
    let key = qualify_key(parent_key, &section.id);
    let child_positions = headed_positions(&section.subsections);
    let children = section
        .subsections
        .iter()
        .zip(child_positions)
        .map(|(child, position)| added_tree(child, position, &key))
        .collect();

    ChangeRecord {
        id: section.id.clone(),
        key,
        kind: ChangeKind::Added,
        content_changed: true,
        old_position: None,
        new_position: position,
        old: None,
        new: Some(section.clone()),
        children,
    }
}

fn removed_tree(section: &Section, position: Option<usize>, parent_key: &str) -> ChangeRecord {
    let key = qualify_key(parent_key, &section.id);
    let child_positions = headed_positions(&section.subsections);
    let children = section
        .subsections
        .iter()
        .zip(child_positions)
        .map(|(child, position)| removed_tree(child, position, &key))
        .collect();

    ChangeRecord {
        id: section.id.clone(),
        key,
        kind: ChangeKind::Removed,
        content_changed: true,
        old_position: position,
        new_position: None,
        old: Some(section.clone()),
        new: None,
        children,
    }
}

/// Index of each section among its headed siblings; `None` for the preamble.
fn headed_positions(sections: &[Section]) -> Vec<Option<usize>> {
    let mut next = 0usize;
    sections
        .iter()
        .map(|section| {
            if section.is_preamble() {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}
