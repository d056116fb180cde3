use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use transync::ledger::Ledger;
use transync::model::{
    DocumentReport, DocumentStatus, RunRecord, SnapshotRecord, SyncCounts, SyncRunManifest,
};
use transync::pipeline::{DocumentJob, FsContentStore, run_batch};
use transync::translate::{CommandTranslator, Glossary};
use transync::util::{now_utc_string, utc_compact_string, write_json_pretty};

use crate::cli::{SyncArgs, default_db_path};

const MANIFEST_VERSION: u32 = 1;

mod discovery;
mod report;
mod run;

pub use run::run;

use discovery::*;
use report::*;
