//! Heading-delimited section trees.
//!
//! A document is read as a flat stream of lines punctuated by `##`..`######`
//! heading markers. Each heading opens a [`Section`] that owns the lines up to
//! the next heading; nesting follows heading levels. Text before the first
//! heading becomes a headless preamble section.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ParseWarning;
use crate::front_matter::split_front_matter;

mod regions;
mod slug;
#[cfg(test)]
mod tests;

pub use regions::{RegionKind, RegionTracker, scan_regions};
pub use slug::{SiblingIds, slugify};

/// Reserved id of the text preceding the first heading.
pub const PREAMBLE_ID: &str = "_preamble";
pub const PREAMBLE_LEVEL: u8 = 1;
pub const MIN_LEVEL: u8 = 2;
pub const MAX_LEVEL: u8 = 6;
pub const KEY_SEPARATOR: char = '/';

static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{2,6}) (.*)$").expect("heading line pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Heading text without the `#` markers; empty for the preamble.
    pub heading: String,
    pub level: u8,
    /// Slug of the heading, unique among siblings.
    pub id: String,
    /// Raw heading line including its line terminator, kept for byte-exact output.
    #[serde(skip)]
    pub heading_line: String,
    /// Own body text. Never contains any descendant's text.
    pub content: String,
    pub subsections: Vec<Section>,
}

impl Section {
    /// Builds a section with a freshly rendered heading line. The id is the
    /// plain slug; sibling uniqueness is the caller's concern.
    pub fn new(heading: &str, level: u8, content: impl Into<String>) -> Self {
        let heading = heading.trim().to_string();
        Self {
            id: slugify(&heading),
            heading_line: heading_line_for(level, &heading),
            heading,
            level,
            content: content.into(),
            subsections: Vec::new(),
        }
    }

    pub fn preamble(content: impl Into<String>) -> Self {
        Self {
            heading: String::new(),
            level: PREAMBLE_LEVEL,
            id: PREAMBLE_ID.to_string(),
            heading_line: String::new(),
            content: content.into(),
            subsections: Vec::new(),
        }
    }

    pub fn is_preamble(&self) -> bool {
        self.id == PREAMBLE_ID && self.heading_line.is_empty()
    }

    /// Heading line plus own content, without subsections.
    pub fn own_text(&self) -> String {
        let mut text = String::with_capacity(self.heading_line.len() + self.content.len());
        push_block(&mut text, &self.heading_line);
        push_block(&mut text, &self.content);
        text
    }

    /// Full serialized form: own text followed by every subsection in order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    pub fn render_into(&self, out: &mut String) {
        push_block(out, &self.heading_line);
        push_block(out, &self.content);
        for child in &self.subsections {
            child.render_into(out);
        }
    }

    /// Heading text, level and body all equal; subsections are not compared.
    pub fn same_own_content(&self, other: &Section) -> bool {
        self.heading == other.heading && self.level == other.level && self.content == other.content
    }

    /// Shifts this section and all descendants by `delta` levels, clamped to
    /// the heading range, re-rendering heading lines whose level moved.
    pub fn relevel(&mut self, delta: i16) {
        if delta == 0 || self.is_preamble() {
            return;
        }

        let shifted = (i16::from(self.level) + delta).clamp(i16::from(MIN_LEVEL), i16::from(MAX_LEVEL));
        let shifted = u8::try_from(shifted).unwrap_or(MAX_LEVEL);
        if shifted != self.level {
            self.level = shifted;
            self.heading_line = heading_line_for(shifted, &self.heading);
        }

        for child in &mut self.subsections {
            child.relevel(delta);
        }
    }
}

/// A parsed document: front matter block kept aside, body split into sections.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub front_matter: &'a str,
    pub body: &'a str,
    pub sections: Vec<Section>,
    pub warnings: Vec<ParseWarning>,
}

impl<'a> Document<'a> {
    pub fn parse(text: &'a str) -> Self {
        let (front_matter, body) = split_front_matter(text);
        let (sections, warnings) = parse_with_warnings(body);
        Self {
            front_matter,
            body,
            sections,
            warnings,
        }
    }
}

pub fn heading_line_for(level: u8, heading: &str) -> String {
    format!("{} {}\n", "#".repeat(usize::from(level)), heading)
}

/// Joins a parent key and a child id into the child's key.
pub fn qualify_key(parent_key: &str, id: &str) -> String {
    if parent_key.is_empty() {
        id.to_string()
    } else {
        format!("{parent_key}{KEY_SEPARATOR}{id}")
    }
}

pub fn render_sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        section.render_into(&mut out);
    }
    out
}

/// Appends `text`, first terminating a dangling last line of `out`.
pub fn push_block(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(text);
}

pub fn parse(text: &str) -> Vec<Section> {
    parse_with_warnings(text).0
}

/// Parses `text` into top-level sections in document order. Never fails: an
/// unclosed fence or math region swallows the rest of the input and is
/// reported as a warning.
pub fn parse_with_warnings(text: &str) -> (Vec<Section>, Vec<ParseWarning>) {
    let mut tracker = RegionTracker::default();
    let mut preamble = String::new();
    let mut roots = Vec::<Section>::new();
    let mut open = Vec::<Section>::new();

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let inert = tracker.observe(line, index + 1);
        let heading = if inert { None } else { match_heading(line) };

        let Some((level, heading)) = heading else {
            match open.last_mut() {
                Some(section) => section.content.push_str(line),
                None => preamble.push_str(line),
            }
            continue;
        };

        while open.last().is_some_and(|section| section.level >= level) {
            close_top(&mut open, &mut roots);
        }

        open.push(Section {
            heading,
            level,
            id: String::new(),
            heading_line: line.to_string(),
            content: String::new(),
            subsections: Vec::new(),
        });
    }

    while !open.is_empty() {
        close_top(&mut open, &mut roots);
    }

    if !preamble.is_empty() {
        roots.insert(0, Section::preamble(preamble));
    }

    assign_sibling_ids(&mut roots);

    let warnings = tracker
        .unclosed()
        .map(|(kind, line)| vec![ParseWarning::UnclosedRegion { kind, line }])
        .unwrap_or_default();

    (roots, warnings)
}

fn close_top(open: &mut Vec<Section>, roots: &mut Vec<Section>) {
    let Some(section) = open.pop() else {
        return;
    };
    match open.last_mut() {
        Some(parent) => parent.subsections.push(section),
        None => roots.push(section),
    }
}

fn match_heading(line: &str) -> Option<(u8, String)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let captures = HEADING_LINE.captures(line)?;
    let level = u8::try_from(captures.get(1)?.as_str().len()).ok()?;
    let text = captures.get(2).map(|value| value.as_str()).unwrap_or_default();
    Some((level, strip_closing_sequence(text.trim()).to_string()))
}

fn strip_closing_sequence(text: &str) -> &str {
    let without_hashes = text.trim_end_matches('#');
    if without_hashes.len() == text.len() {
        return text;
    }
    if without_hashes.is_empty() {
        return without_hashes;
    }
    if without_hashes.ends_with([' ', '\t']) {
        without_hashes.trim_end()
    } else {
        text
    }
}

fn assign_sibling_ids(sections: &mut [Section]) {
    let mut ids = SiblingIds::default();
    for section in sections.iter_mut() {
        if section.is_preamble() {
            ids.reserve(PREAMBLE_ID);
        }
    }
    for section in sections.iter_mut() {
        if !section.is_preamble() {
            section.id = ids.assign(&slugify(&section.heading));
        }
        assign_sibling_ids(&mut section.subsections);
    }
}
