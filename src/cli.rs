use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "transync",
    version,
    about = "Section-level synchronization of translated documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Sync(SyncArgs),
    Diff(DiffArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[arg(long, default_value = ".cache/transync")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub source_dir: PathBuf,

    #[arg(long)]
    pub target_dir: PathBuf,

    #[arg(long, default_value = "en")]
    pub source_language: String,

    #[arg(long)]
    pub target_language: String,

    #[arg(long)]
    pub translator_cmd: String,

    #[arg(long = "translator-arg", allow_hyphen_values = true)]
    pub translator_args: Vec<String>,

    #[arg(long)]
    pub glossary_path: Option<PathBuf>,

    #[arg(long, default_value = "md")]
    pub ext: String,

    #[arg(long = "file")]
    pub files: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DiffFormat {
    Summary,
    Json,
}

impl DiffFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Json => "json",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    /// Earlier source revision.
    #[arg(long)]
    pub old: PathBuf,

    /// Current source revision.
    #[arg(long)]
    pub new: PathBuf,

    #[arg(long, value_enum, default_value_t = DiffFormat::Summary)]
    pub format: DiffFormat,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/transync")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

pub fn default_db_path(cache_root: &std::path::Path, db_path: Option<PathBuf>) -> PathBuf {
    db_path.unwrap_or_else(|| cache_root.join("transync_ledger.sqlite"))
}
