use super::*;

/// Relative, slash-separated names of every `.{ext}` file under
/// `source_dir`, sorted. A non-empty `only` list keeps just those names.
pub(super) fn discover_documents(source_dir: &Path, ext: &str, only: &[String]) -> Result<Vec<String>> {
    if !source_dir.is_dir() {
        bail!("source directory does not exist: {}", source_dir.display());
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry.with_context(|| format!("failed to walk {}", source_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matches_ext = path
            .extension()
            .and_then(|value| value.to_str())
            .is_some_and(|value| value.eq_ignore_ascii_case(ext));
        if !matches_ext {
            continue;
        }

        let relative = path
            .strip_prefix(source_dir)
            .with_context(|| format!("{} is outside {}", path.display(), source_dir.display()))?;
        let name = document_name(relative)?;

        if !only.is_empty() && !only.contains(&name) {
            continue;
        }
        names.push(name);
    }

    names.sort();

    for wanted in only {
        if !names.contains(wanted) {
            warn!(document = %wanted, "requested document not found in source directory");
        }
    }

    Ok(names)
}

pub(super) fn document_name(relative: &Path) -> Result<String> {
    let parts = relative
        .components()
        .map(|component| {
            component
                .as_os_str()
                .to_str()
                .with_context(|| format!("invalid UTF-8 path: {}", relative.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

/// Pairs each current source with the revision recorded at its last sync.
pub(super) fn build_jobs(source_dir: &Path, names: &[String], ledger: &Ledger) -> Result<Vec<DocumentJob>> {
    let mut jobs = Vec::with_capacity(names.len());

    for name in names {
        let path = source_dir.join(name);
        let new_source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let old_source = ledger.load_snapshot(name)?.map(|snapshot| snapshot.source_text);

        debug!(
            document = %name,
            has_snapshot = old_source.is_some(),
            bytes = new_source.len(),
            "prepared sync job"
        );

        jobs.push(DocumentJob {
            name: name.clone(),
            old_source,
            new_source,
        });
    }

    Ok(jobs)
}
