use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use transync::diff::{ChangeKind, ChangeRecord, ChangeSummary, detect_changes};
use transync::section::Document;

use crate::cli::{DiffArgs, DiffFormat};

#[derive(Debug, Serialize)]
struct DiffResponse<'a> {
    old: String,
    new: String,
    summary: ChangeSummary,
    changes: &'a [ChangeRecord],
}

pub fn run(args: DiffArgs) -> Result<()> {
    let old_text = read_source(&args.old)?;
    let new_text = read_source(&args.new)?;

    let old = Document::parse(&old_text);
    let new = Document::parse(&new_text);
    for warning in old.warnings.iter().chain(&new.warnings) {
        warn!(%warning, "source parse warning");
    }

    let changes = detect_changes(&old.sections, &new.sections);
    let summary = ChangeSummary::of(&changes);
    info!(
        format = args.format.as_str(),
        changed = summary.changed,
        added = summary.added,
        removed = summary.removed,
        "diff computed"
    );

    match args.format {
        DiffFormat::Json => write_json_response(&DiffResponse {
            old: args.old.display().to_string(),
            new: args.new.display().to_string(),
            summary,
            changes: &changes,
        }),
        DiffFormat::Summary => write_text_response(&changes, summary),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_json_response(response: &DiffResponse<'_>) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize diff json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(changes: &[ChangeRecord], summary: ChangeSummary) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    let mut lines = Vec::new();
    collect_lines(changes, &mut lines);
    for line in &lines {
        writeln!(output, "{line}")?;
    }

    writeln!(
        output,
        "Sections: unchanged={} changed={} added={} removed={}",
        summary.unchanged, summary.changed, summary.added, summary.removed,
    )?;
    output.flush()?;
    Ok(())
}

/// One line per record that is not unchanged, in tree order.
fn collect_lines(records: &[ChangeRecord], lines: &mut Vec<String>) {
    for record in records {
        match record.kind {
            ChangeKind::Unchanged => continue,
            ChangeKind::Changed if !record.content_changed => {
                lines.push(format!("{:<9} {} (subsections only)", record.kind.as_str(), record.key));
            }
            kind => lines.push(format!("{:<9} {}", kind.as_str(), record.key)),
        }
        if record.kind != ChangeKind::Added && record.kind != ChangeKind::Removed {
            collect_lines(&record.children, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transync::section::parse;

    #[test]
    fn summary_lines_skip_unchanged_and_collapse_subtrees() {
        let old = parse("## A\nbody\n### A1\nold\n## B\n### B1\n");
        let new = parse("## A\nbody\n### A1\nnew\n## C\n### C1\n");
        let mut lines = Vec::new();
        collect_lines(&detect_changes(&old, &new), &mut lines);

        assert_eq!(
            lines,
            vec![
                "changed   a (subsections only)",
                "changed   a/a1",
                "added     c",
                "removed   b",
            ]
        );
    }
}
