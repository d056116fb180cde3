use super::*;

pub fn run(args: SyncArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("sync-{}", utc_compact_string(started_ts));

    let manifest_dir = args.cache_root.join("manifests");
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("sync_run_{}.json", utc_compact_string(started_ts)))
    });
    let db_path = default_db_path(&args.cache_root, args.db_path.clone());

    info!(
        run_id = %run_id,
        source = %args.source_dir.display(),
        target = %args.target_dir.display(),
        target_language = %args.target_language,
        dry_run = args.dry_run,
        "starting sync"
    );

    let glossary = args
        .glossary_path
        .as_deref()
        .map(Glossary::load)
        .transpose()?;
    if let Some(glossary) = &glossary {
        info!(terms = glossary.terms.len(), "loaded glossary");
    }

    let names = discover_documents(&args.source_dir, &args.ext, &args.files)?;
    if names.is_empty() {
        bail!(
            "no .{} documents found in {}",
            args.ext,
            args.source_dir.display()
        );
    }
    info!(documents = names.len(), "discovered source documents");

    let ledger = Ledger::open(&db_path)?;
    let jobs = build_jobs(&args.source_dir, &names, &ledger)?;

    let translator = CommandTranslator::new(
        args.translator_cmd.clone(),
        args.translator_args.clone(),
        args.source_language.clone(),
        args.target_language.clone(),
    );
    let store = FsContentStore::new(args.target_dir.clone());

    let reports = run_batch(&jobs, &translator, &store, glossary.as_ref(), args.dry_run);
    log_reports(&reports);

    let mut warnings = Vec::new();
    if args.files.is_empty() {
        warnings.extend(stale_snapshot_warnings(&ledger, &names)?);
    }

    let counts = SyncCounts::from_reports(&reports);
    let finished_at = now_utc_string();

    if args.dry_run {
        info!("dry-run: ledger left untouched");
    } else {
        let stored = record_snapshots(&ledger, &jobs, &reports)?;
        ledger.record_run(&RunRecord {
            run_id: run_id.clone(),
            started_at: started_at.clone(),
            finished_at: finished_at.clone(),
            documents: counts.documents,
            failed: counts.failed,
        })?;
        info!(snapshots = stored, path = %db_path.display(), "updated ledger");
    }

    let manifest = SyncRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        started_at,
        finished_at,
        source_directory: args.source_dir.display().to_string(),
        target_directory: args.target_dir.display().to_string(),
        source_language: args.source_language.clone(),
        target_language: args.target_language.clone(),
        dry_run: args.dry_run,
        counts: counts.clone(),
        documents: reports,
        warnings,
    };

    write_json_pretty(&report_path, &manifest)?;
    info!(path = %report_path.display(), "wrote sync run manifest");
    info!(
        documents = counts.documents,
        created = counts.created,
        updated = counts.updated,
        unchanged = counts.unchanged,
        baseline = counts.baseline,
        failed = counts.failed,
        "sync completed"
    );

    if counts.failed > 0 {
        bail!(
            "{} of {} documents failed; see {}",
            counts.failed,
            counts.documents,
            report_path.display()
        );
    }

    Ok(())
}
