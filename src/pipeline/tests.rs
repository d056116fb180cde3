use std::cell::RefCell;

use super::*;
use crate::error::TranslationError;

/// Uppercases whatever it is given; refuses any text containing `fail-me`.
#[derive(Default)]
struct ShoutingTranslator {
    calls: RefCell<Vec<&'static str>>,
}

impl ShoutingTranslator {
    fn shout(text: &str) -> Result<String, TranslationError> {
        if text.contains("fail-me") {
            return Err(TranslationError::new("upstream rejected the request"));
        }
        Ok(text.to_uppercase())
    }
}

impl Translator for ShoutingTranslator {
    fn translate_new(
        &self,
        section_text: &str,
        _glossary: Option<&Glossary>,
    ) -> Result<String, TranslationError> {
        self.calls.borrow_mut().push("new");
        Self::shout(section_text)
    }

    fn translate_update(
        &self,
        _old_source: &str,
        new_source: &str,
        _current_translation: &str,
        _glossary: Option<&Glossary>,
    ) -> Result<String, TranslationError> {
        self.calls.borrow_mut().push("update");
        Self::shout(new_source)
    }
}

#[derive(Default)]
struct MemoryStore {
    files: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    fn with(files: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (name, text) in files {
            store.files.borrow_mut().insert(name.to_string(), text.to_string());
        }
        store
    }

    fn get(&self, name: &str) -> Option<String> {
        self.files.borrow().get(name).cloned()
    }
}

impl ContentStore for MemoryStore {
    fn read_target(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name))
    }

    fn commit(&self, name: &str, text: &str) -> Result<()> {
        self.files.borrow_mut().insert(name.to_string(), text.to_string());
        Ok(())
    }
}

const TRANSLATED: &str = "---\nheading-map:\n  alpha: \"ALPHA\"\n---\n## ALPHA\n\nOLD\n";

fn job(name: &str, old: Option<&str>, new: &str) -> DocumentJob {
    DocumentJob {
        name: name.to_string(),
        old_source: old.map(str::to_string),
        new_source: new.to_string(),
    }
}

#[test]
fn missing_target_is_created_from_full_translation() {
    let translator = ShoutingTranslator::default();
    let synced = sync_document(&job("a.md", None, "## Alpha\n\nalpha body\n"), None, &translator, None).unwrap();

    assert_eq!(synced.status, DocumentStatus::Created);
    assert_eq!(synced.summary.added, 1);
    let reconstruction = synced.reconstruction.unwrap();
    assert_eq!(
        reconstruction.document,
        "---\nheading-map:\n  alpha: \"ALPHA\"\n---\n## ALPHA\n\nALPHA BODY\n"
    );
}

#[test]
fn existing_target_without_prior_source_becomes_baseline() {
    let translator = ShoutingTranslator::default();
    let synced = sync_document(
        &job("a.md", None, "## Alpha\n\nnew\n"),
        Some(TRANSLATED),
        &translator,
        None,
    )
    .unwrap();

    assert_eq!(synced.status, DocumentStatus::Baseline);
    assert!(synced.reconstruction.is_none());
    assert!(translator.calls.borrow().is_empty());
}

#[test]
fn identical_sources_skip_translation() {
    let translator = ShoutingTranslator::default();
    let source = "## Alpha\n\nold\n";
    let synced = sync_document(&job("a.md", Some(source), source), Some(TRANSLATED), &translator, None).unwrap();

    assert_eq!(synced.status, DocumentStatus::Unchanged);
    assert!(translator.calls.borrow().is_empty());
}

#[test]
fn changed_section_with_prior_translation_uses_update() {
    let translator = ShoutingTranslator::default();
    let synced = sync_document(
        &job("a.md", Some("## Alpha\n\nold\n"), "## Alpha\n\nnew\n"),
        Some(TRANSLATED),
        &translator,
        None,
    )
    .unwrap();

    assert_eq!(synced.status, DocumentStatus::Updated);
    assert_eq!(*translator.calls.borrow(), vec!["update"]);
    assert_eq!(
        synced.reconstruction.unwrap().document,
        "---\nheading-map:\n  alpha: \"ALPHA\"\n---\n## ALPHA\n\nNEW\n"
    );
}

#[test]
fn added_section_is_translated_as_new_subtree() {
    let translator = ShoutingTranslator::default();
    let old = "## Alpha\n\nold\n";
    let new = "## Alpha\n\nold\n## Beta\n\nb\n";
    let translations = translate_changes(
        &detect_changes(&crate::section::parse(old), &crate::section::parse(new)),
        &[],
        &HeadingMap::new(),
        &translator,
        None,
    )
    .unwrap();

    assert_eq!(translations.len(), 1);
    assert_eq!(translations["beta"], "## BETA\n\nB\n");
    assert_eq!(*translator.calls.borrow(), vec!["new"]);
}

#[test]
fn translator_failure_names_the_section() {
    let translator = ShoutingTranslator::default();
    let err = sync_document(
        &job("a.md", Some("## Alpha\n\nold\n"), "## Alpha\n\nfail-me\n"),
        Some(TRANSLATED),
        &translator,
        None,
    )
    .unwrap_err();

    assert_eq!(
        err,
        FileError::Translation {
            key: "alpha".to_string(),
            message: "upstream rejected the request".to_string(),
        }
    );
}

#[test]
fn batch_failure_does_not_block_other_documents() {
    let translator = ShoutingTranslator::default();
    let store = MemoryStore::with(&[("bad.md", TRANSLATED), ("good.md", TRANSLATED)]);
    let jobs = vec![
        job("bad.md", Some("## Alpha\n\nold\n"), "## Alpha\n\nfail-me\n"),
        job("good.md", Some("## Alpha\n\nold\n"), "## Alpha\n\nnew\n"),
        job("fresh.md", None, "## Alpha\n\nhello\n"),
    ];

    let reports = run_batch(&jobs, &translator, &store, None, false);

    let statuses = reports.iter().map(|report| report.status).collect::<Vec<_>>();
    assert_eq!(
        statuses,
        vec![DocumentStatus::Failed, DocumentStatus::Updated, DocumentStatus::Created]
    );
    assert!(reports[0].error.as_deref().unwrap().contains("alpha"));
    assert_eq!(store.get("bad.md").as_deref(), Some(TRANSLATED));
    assert!(store.get("good.md").unwrap().ends_with("## ALPHA\n\nNEW\n"));
    assert!(store.get("fresh.md").unwrap().ends_with("## ALPHA\n\nHELLO\n"));
    assert_eq!(reports[1].heading_map_entries, Some(1));
    assert_eq!(
        reports[1].target_sha256.as_deref(),
        store.get("good.md").as_deref().map(sha256_text).as_deref()
    );
}

#[test]
fn dry_run_reports_without_committing() {
    let translator = ShoutingTranslator::default();
    let store = MemoryStore::default();
    let reports = run_batch(
        &[job("new.md", None, "## Alpha\n\nhello\n")],
        &translator,
        &store,
        None,
        true,
    );

    assert_eq!(reports[0].status, DocumentStatus::Created);
    assert!(reports[0].target_sha256.is_some());
    assert!(store.get("new.md").is_none());
}

#[test]
fn fs_store_reads_missing_as_none_and_commits_nested_paths() {
    let temp = tempfile::tempdir().unwrap();
    let store = FsContentStore::new(temp.path());

    assert_eq!(store.read_target("guide/intro.md").unwrap(), None);

    store.commit("guide/intro.md", "## Wstęp\n").unwrap();
    assert_eq!(
        store.read_target("guide/intro.md").unwrap().as_deref(),
        Some("## Wstęp\n")
    );
    assert!(!store.root().join("guide/.intro.md.transync-tmp").exists());
}
