//! SQLite ledger of the source revision each target was last synced against.
//!
//! The next sync diffs the current source against the stored snapshot, so
//! the ledger stands in for the prior revision a hosting system would supply.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{RunRecord, SnapshotRecord};
use crate::util::ensure_directory;

pub const LEDGER_SCHEMA_VERSION: &str = "1";

pub struct Ledger {
    connection: Connection,
}

impl Ledger {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            ensure_directory(parent)?;
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open ledger {}", db_path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;

        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory ledger")?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn load_snapshot(&self, document: &str) -> Result<Option<SnapshotRecord>> {
        self.connection
            .query_row(
                "
                SELECT document, source_sha256, source_text, target_sha256, synced_at
                FROM snapshots
                WHERE document = ?1
                ",
                params![document],
                |row| {
                    Ok(SnapshotRecord {
                        document: row.get(0)?,
                        source_sha256: row.get(1)?,
                        source_text: row.get(2)?,
                        target_sha256: row.get(3)?,
                        synced_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to load snapshot for {document}"))
    }

    pub fn store_snapshot(&self, snapshot: &SnapshotRecord) -> Result<()> {
        self.connection
            .execute(
                "
                INSERT INTO snapshots (document, source_sha256, source_text, target_sha256, synced_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(document) DO UPDATE SET
                  source_sha256 = excluded.source_sha256,
                  source_text = excluded.source_text,
                  target_sha256 = excluded.target_sha256,
                  synced_at = excluded.synced_at
                ",
                params![
                    snapshot.document,
                    snapshot.source_sha256,
                    snapshot.source_text,
                    snapshot.target_sha256,
                    snapshot.synced_at,
                ],
            )
            .with_context(|| format!("failed to store snapshot for {}", snapshot.document))?;
        Ok(())
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>> {
        let mut statement = self.connection.prepare(
            "
            SELECT document, source_sha256, source_text, target_sha256, synced_at
            FROM snapshots
            ORDER BY document
            ",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(SnapshotRecord {
                document: row.get(0)?,
                source_sha256: row.get(1)?,
                source_text: row.get(2)?,
                target_sha256: row.get(3)?,
                synced_at: row.get(4)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<SnapshotRecord>>>()
            .context("failed to read snapshots")
    }

    pub fn record_run(&self, run: &RunRecord) -> Result<()> {
        self.connection
            .execute(
                "
                INSERT OR REPLACE INTO runs (run_id, started_at, finished_at, documents, failed)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    run.run_id,
                    run.started_at,
                    run.finished_at,
                    i64::try_from(run.documents).unwrap_or(i64::MAX),
                    i64::try_from(run.failed).unwrap_or(i64::MAX),
                ],
            )
            .with_context(|| format!("failed to record run {}", run.run_id))?;
        Ok(())
    }

    pub fn last_run(&self) -> Result<Option<RunRecord>> {
        self.connection
            .query_row(
                "
                SELECT run_id, started_at, finished_at, documents, failed
                FROM runs
                ORDER BY finished_at DESC, run_id DESC
                LIMIT 1
                ",
                [],
                |row| {
                    let documents: i64 = row.get(3)?;
                    let failed: i64 = row.get(4)?;
                    Ok(RunRecord {
                        run_id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        documents: usize::try_from(documents).unwrap_or_default(),
                        failed: usize::try_from(failed).unwrap_or_default(),
                    })
                },
            )
            .optional()
            .context("failed to load last run")
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        self.connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read ledger schema version")
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshots (
              document TEXT PRIMARY KEY,
              source_sha256 TEXT NOT NULL,
              source_text TEXT NOT NULL,
              target_sha256 TEXT,
              synced_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS runs (
              run_id TEXT PRIMARY KEY,
              started_at TEXT NOT NULL,
              finished_at TEXT NOT NULL,
              documents INTEGER NOT NULL,
              failed INTEGER NOT NULL
            );
            ",
        )
        .context("failed to create ledger schema")?;

    connection
        .execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            params![LEDGER_SCHEMA_VERSION],
        )
        .context("failed to record ledger schema version")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(document: &str, source: &str, synced_at: &str) -> SnapshotRecord {
        SnapshotRecord {
            document: document.to_string(),
            source_sha256: crate::util::sha256_text(source),
            source_text: source.to_string(),
            target_sha256: None,
            synced_at: synced_at.to_string(),
        }
    }

    #[test]
    fn snapshot_upsert_replaces_previous_revision() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger
            .store_snapshot(&snapshot("intro.md", "## A\n", "2026-01-01T00:00:00Z"))
            .unwrap();
        ledger
            .store_snapshot(&snapshot("intro.md", "## A\n\nmore\n", "2026-01-02T00:00:00Z"))
            .unwrap();

        let loaded = ledger.load_snapshot("intro.md").unwrap().unwrap();
        assert_eq!(loaded.source_text, "## A\n\nmore\n");
        assert_eq!(loaded.synced_at, "2026-01-02T00:00:00Z");
        assert_eq!(ledger.list_snapshots().unwrap().len(), 1);
    }

    #[test]
    fn missing_snapshot_is_none() {
        let ledger = Ledger::open_in_memory().unwrap();
        assert!(ledger.load_snapshot("absent.md").unwrap().is_none());
        assert_eq!(ledger.schema_version().unwrap().as_deref(), Some(LEDGER_SCHEMA_VERSION));
    }

    #[test]
    fn last_run_returns_latest_finished() {
        let ledger = Ledger::open_in_memory().unwrap();
        for (run_id, finished_at) in [
            ("sync-1", "2026-01-01T00:00:00Z"),
            ("sync-2", "2026-01-03T00:00:00Z"),
        ] {
            ledger
                .record_run(&RunRecord {
                    run_id: run_id.to_string(),
                    started_at: finished_at.to_string(),
                    finished_at: finished_at.to_string(),
                    documents: 3,
                    failed: 1,
                })
                .unwrap();
        }

        let last = ledger.last_run().unwrap().unwrap();
        assert_eq!(last.run_id, "sync-2");
        assert_eq!(last.failed, 1);
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.sqlite");
        let ledger = Ledger::open(&path).unwrap();
        ledger
            .store_snapshot(&snapshot("a.md", "## A\n", "2026-01-01T00:00:00Z"))
            .unwrap();
        assert!(path.exists());
    }
}
