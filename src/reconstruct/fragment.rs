use crate::error::FileError;
use crate::section::{Section, parse, scan_regions};

/// Translated own text of a single section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnFragment {
    pub heading: Option<String>,
    pub content: String,
}

/// Reads translated heading + body for a `changed` section. The text may not
/// carry any nested heading: subsections are rendered from their own records.
pub fn own_fragment(key: &str, text: &str, preamble: bool) -> Result<OwnFragment, FileError> {
    ensure_balanced(key, text)?;
    let sections = parse(text);

    if preamble {
        if sections.iter().any(|section| !section.is_preamble()) {
            return Err(invalid(key, "preamble translation contains headings"));
        }
        return Ok(OwnFragment {
            heading: None,
            content: text.to_string(),
        });
    }

    let (leading, headed) = split_leading(sections);
    if headed.is_empty() {
        return Ok(OwnFragment {
            heading: None,
            content: text.to_string(),
        });
    }
    ensure_no_leading_text(key, leading.as_ref())?;

    let nested = headed.iter().map(count_headings).sum::<usize>() - 1;
    if nested > 0 {
        return Err(invalid(
            key,
            &format!("expected a single heading, found {nested} additional heading(s)"),
        ));
    }

    let section = headed.into_iter().next().ok_or_else(|| invalid(key, "empty translation"))?;
    Ok(OwnFragment {
        heading: Some(section.heading),
        content: section.content,
    })
}

/// Reads a translated subtree for an `added` section: exactly one top-level
/// section whose heading count matches the source subtree.
pub fn subtree_fragment(key: &str, text: &str, source: &Section) -> Result<Section, FileError> {
    ensure_balanced(key, text)?;
    let (leading, mut headed) = split_leading(parse(text));
    ensure_no_leading_text(key, leading.as_ref())?;

    if headed.len() != 1 {
        return Err(invalid(
            key,
            &format!("expected one top-level section, found {}", headed.len()),
        ));
    }

    let section = headed.remove(0);
    let expected = count_headings(source);
    let found = count_headings(&section);
    if expected != found {
        return Err(invalid(
            key,
            &format!("expected {expected} heading(s) in the translated subtree, found {found}"),
        ));
    }

    Ok(section)
}

fn split_leading(sections: Vec<Section>) -> (Option<Section>, Vec<Section>) {
    let mut leading = None;
    let mut headed = Vec::with_capacity(sections.len());
    for section in sections {
        if section.is_preamble() {
            leading = Some(section);
        } else {
            headed.push(section);
        }
    }
    (leading, headed)
}

fn ensure_no_leading_text(key: &str, leading: Option<&Section>) -> Result<(), FileError> {
    match leading {
        Some(section) if !section.content.trim().is_empty() => {
            Err(invalid(key, "text found before the translated heading"))
        }
        _ => Ok(()),
    }
}

fn ensure_balanced(key: &str, text: &str) -> Result<(), FileError> {
    match scan_regions(text) {
        Some((kind, line)) => Err(invalid(key, &format!("unclosed {kind} opened on line {line}"))),
        None => Ok(()),
    }
}

pub fn count_headings(section: &Section) -> usize {
    let own = usize::from(!section.is_preamble());
    own + section.subsections.iter().map(count_headings).sum::<usize>()
}

fn invalid(key: &str, reason: &str) -> FileError {
    FileError::Validation {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
