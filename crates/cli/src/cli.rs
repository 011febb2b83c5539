use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use unisync_core::ConfigKind;

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Claude,
    Copilot,
    Codex,
}

impl FormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Copilot => "copilot",
            Self::Codex => "codex",
        }
    }
}

/// Config record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Agent,
    Permission,
    SlashCommand,
}

impl From<KindArg> for ConfigKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Agent => ConfigKind::Agent,
            KindArg::Permission => ConfigKind::Permission,
            KindArg::SlashCommand => ConfigKind::SlashCommand,
        }
    }
}

/// Flags shared by every sync-flavored subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct CommonFlags {
    /// Preview decisions and diffs without writing anything.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
    /// Fail before any write if a conversion would lose information.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
    /// State file location (defaults to ~/.unisync/state.json).
    #[arg(long, value_name = "FILE", env = "UNISYNC_STATE_FILE")]
    pub state_file: Option<PathBuf>,
}

/// Command-line interface for the `unisync` application.
#[derive(Debug, Parser)]
#[command(
    name = "unisync",
    about = "Reconcile agent, permission, and slash-command configs across AI coding tools"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `unisync` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Syncs one file pair in place, optionally in both directions.
    Sync {
        /// Source file.
        source: PathBuf,
        /// Target file.
        target: PathBuf,
        #[arg(long, value_enum)]
        source_format: FormatArg,
        #[arg(long, value_enum)]
        target_format: FormatArg,
        /// Record kind stored in the files.
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Also merge target-side edits back into the source.
        #[arg(long, default_value_t = false)]
        bidirectional: bool,
        #[command(flatten)]
        common: CommonFlags,
    },
    /// Syncs two directory trees, matching files by base name.
    SyncDirs {
        #[arg(long, value_name = "DIR")]
        source_dir: PathBuf,
        #[arg(long, value_name = "DIR")]
        target_dir: PathBuf,
        #[arg(long, value_enum)]
        source_format: FormatArg,
        #[arg(long, value_enum)]
        target_format: FormatArg,
        /// Record kind; permission documents are single files and are not
        /// accepted here.
        #[arg(long, value_enum)]
        kind: KindArg,
        #[command(flatten)]
        common: CommonFlags,
    },
    /// Converts one file to another format without consulting sync state.
    Convert {
        /// Source file.
        source: PathBuf,
        /// Target file to create or overwrite.
        target: PathBuf,
        #[arg(long, value_enum)]
        source_format: FormatArg,
        #[arg(long, value_enum)]
        target_format: FormatArg,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[command(flatten)]
        common: CommonFlags,
    },
}
