//! Source-key → target-heading table persisted in the target document's
//! front matter under `heading-map:`.
//!
//! The table is what lets an unchanged source section find its translated
//! counterpart: the recorded target heading is slugged and matched against
//! the parsed target tree.

use std::ops::Range;

use serde::Serialize;
use serde_yaml::Value;
use tracing::warn;

use crate::diff::{ChangeKind, ChangeRecord};
use crate::front_matter::{self, split_front_matter};

#[cfg(test)]
mod tests;

pub const FIELD_NAME: &str = "heading-map";
const ENTRY_INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEntry {
    pub key: String,
    pub heading: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeadingMap {
    entries: Vec<HeadingEntry>,
}

impl HeadingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HeadingEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.heading.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets `key`, overwriting in place or appending a new entry at the end.
    pub fn insert(&mut self, key: &str, heading: &str) {
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.heading = heading.to_string(),
            None => self.entries.push(HeadingEntry {
                key: key.to_string(),
                heading: heading.to_string(),
            }),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|entry| entry.key == key)?;
        Some(self.entries.remove(index).heading)
    }

    /// Produces the map for the new source tree described by `changes`.
    ///
    /// `changed` and `added` keys take their heading from `resolved`; `removed`
    /// keys and anything no longer reachable are dropped; `unchanged` keys keep
    /// their current entry. Entries come out in new-tree pre-order.
    pub fn update(&self, changes: &[ChangeRecord], resolved: &HeadingMap) -> HeadingMap {
        let mut next = HeadingMap::new();
        self.carry_level(changes, resolved, &mut next);
        next
    }

    fn carry_level(&self, records: &[ChangeRecord], resolved: &HeadingMap, next: &mut HeadingMap) {
        for record in records {
            if record.kind == ChangeKind::Removed || record.is_preamble() {
                continue;
            }

            let heading = match record.kind {
                ChangeKind::Changed | ChangeKind::Added => resolved
                    .get(&record.key)
                    .or_else(|| self.get(&record.key)),
                _ => self.get(&record.key).or_else(|| resolved.get(&record.key)),
            };

            match heading {
                Some(heading) => next.insert(&record.key, heading),
                None => warn!(key = %record.key, "no heading available for heading-map entry"),
            }

            self.carry_level(&record.children, resolved, next);
        }
    }
}

impl FromIterator<(String, String)> for HeadingMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = HeadingMap::new();
        for (key, heading) in iter {
            map.insert(&key, &heading);
        }
        map
    }
}

/// Reads the heading map out of a document's front matter. A document
/// without the field yields an empty map; entries whose value is not a
/// scalar are skipped.
pub fn extract(document: &str) -> HeadingMap {
    let (front, _) = split_front_matter(document);
    read_field(front).unwrap_or_default()
}

/// Writes `map` into the document's front matter, leaving every other
/// front matter line and the body untouched. Returns the input unchanged when
/// the stored map already equals `map`.
pub fn inject(document: &str, map: &HeadingMap) -> String {
    let (front, body) = split_front_matter(document);

    if front.is_empty() {
        if map.is_empty() {
            return document.to_string();
        }
        let mut out = front_matter::wrap(&render_field(map));
        out.push_str(document);
        return out;
    }

    let stored = read_field(front);
    match &stored {
        Some(stored) if stored == map => return document.to_string(),
        None if map.is_empty() => return document.to_string(),
        _ => {}
    }

    let lines = front.split_inclusive('\n').collect::<Vec<&str>>();
    let inner = front_matter::inner_lines(front);

    let mut out = String::with_capacity(document.len() + map.len() * 32);
    out.push_str(lines[0]);

    match locate_field(&inner) {
        Some(range) => {
            inner[..range.start].iter().for_each(|line| out.push_str(line));
            if !map.is_empty() {
                out.push_str(&render_field(map));
            }
            inner[range.end..].iter().for_each(|line| out.push_str(line));
        }
        None => {
            inner.iter().for_each(|line| out.push_str(line));
            if !inner.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&render_field(map));
        }
    }

    out.push_str(lines[lines.len() - 1]);
    out.push_str(body);
    out
}

pub fn render_field(map: &HeadingMap) -> String {
    let mut field = format!("{FIELD_NAME}:\n");
    for entry in map.entries() {
        field.push_str(ENTRY_INDENT);
        field.push_str(&render_key(&entry.key));
        field.push_str(": ");
        field.push_str(&quote(&entry.heading));
        field.push('\n');
    }
    field
}

/// Decodes the `heading-map` field of a front matter block. `None` when the
/// block has no such field or is not valid YAML.
fn read_field(front: &str) -> Option<HeadingMap> {
    if front.is_empty() {
        return None;
    }

    let inner = front_matter::inner_lines(front).concat();
    let decoded = match serde_yaml::from_str::<Value>(&inner) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(error = %err, "front matter is not valid YAML; heading-map ignored");
            return None;
        }
    };

    let field = decoded.as_mapping()?.get(FIELD_NAME)?;
    let mut map = HeadingMap::new();
    let Some(entries) = field.as_mapping() else {
        if !field.is_null() {
            warn!("heading-map field is not a mapping; ignoring it");
        }
        return Some(map);
    };

    for (key, heading) in entries {
        match (scalar_text(key), scalar_text(heading)) {
            (Some(key), Some(heading)) => map.insert(&key, &heading),
            _ => warn!(?key, "skipping unreadable heading-map entry"),
        }
    }
    Some(map)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Line range of the top-level `heading-map` key: its key line, in any
/// style, plus every indented continuation line after it.
fn locate_field(inner: &[&str]) -> Option<Range<usize>> {
    let start = inner.iter().position(|line| is_field_line(line))?;
    let continuation = inner[start + 1..]
        .iter()
        .take_while(|line| line.starts_with([' ', '\t']) || line.trim().is_empty())
        .count();
    Some(start..start + 1 + continuation)
}

fn is_field_line(line: &str) -> bool {
    [FIELD_NAME, "\"heading-map\"", "'heading-map'"]
        .iter()
        .filter_map(|name| line.strip_prefix(name))
        .any(|rest| rest.trim_start().starts_with(':'))
}

/// Keys stay plain only when YAML reads them back as the same string.
fn render_key(key: &str) -> String {
    let plain = key.chars().any(char::is_alphabetic)
        && key
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_' | '/'))
        && serde_yaml::from_str::<Value>(key).is_ok_and(|value| value.as_str() == Some(key));
    if plain { key.to_string() } else { quote(key) }
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "\\\"")))
}
