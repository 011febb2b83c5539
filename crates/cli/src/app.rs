//! Subcommand dispatch: wires adapters, state, and the orchestrator.

use crate::cli::{Cli, Commands, CommonFlags, FormatArg};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use unisync_adapters::FormatRegistry;
use unisync_core::{DecisionAction, FormatAdapter};
use unisync_engine::{PairReport, SyncOptions, SyncOrchestrator};
use unisync_state::SyncStateStore;

/// Entry point used by the binary.
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    execute(Cli::parse())
}

fn adapter(registry: &FormatRegistry, format: FormatArg) -> Result<&dyn FormatAdapter> {
    registry
        .get(format.as_str())
        .ok_or_else(|| anyhow!("unknown format: {}", format.as_str()))
}

fn state_store(common: &CommonFlags) -> SyncStateStore {
    let path = common
        .state_file
        .clone()
        .unwrap_or_else(SyncStateStore::default_path);
    SyncStateStore::load(path)
}

fn print_pair(report: &PairReport) {
    for decision in &report.decisions {
        if decision.action != DecisionAction::Unchanged {
            println!("  {decision}");
        }
    }
    if let Some(diff) = &report.diff {
        if diff.is_empty() {
            println!("  no pending changes");
        } else {
            print!("{diff}");
        }
    }
    let suffix = if report.written { " (written)" } else { "" };
    println!(
        "{} -> {}{suffix}",
        report.source.display(),
        report.target.display()
    );
}

/// Runs one parsed invocation. Split from [`run`] so tests can drive the
/// CLI without a process boundary.
pub fn execute(cli: Cli) -> Result<()> {
    let registry = FormatRegistry::with_defaults();
    match cli.command {
        Commands::Sync {
            source,
            target,
            source_format,
            target_format,
            kind,
            bidirectional,
            common,
        } => {
            let orchestrator = SyncOrchestrator::new(
                adapter(&registry, source_format)?,
                adapter(&registry, target_format)?,
                kind.into(),
                state_store(&common),
                SyncOptions {
                    bidirectional,
                    dry_run: common.dry_run,
                    strict: common.strict,
                },
            )?;
            let report = orchestrator
                .sync_files_in_place(&source, &target)
                .with_context(|| format!("sync failed for {}", source.display()))?;
            print_pair(&report);
            orchestrator.finish()?;
            Ok(())
        }
        Commands::SyncDirs {
            source_dir,
            target_dir,
            source_format,
            target_format,
            kind,
            common,
        } => {
            let orchestrator = SyncOrchestrator::new(
                adapter(&registry, source_format)?,
                adapter(&registry, target_format)?,
                kind.into(),
                state_store(&common),
                SyncOptions {
                    bidirectional: false,
                    dry_run: common.dry_run,
                    strict: common.strict,
                },
            )?;
            let report = orchestrator.sync_directories(&source_dir, &target_dir)?;
            print!("{}", report.format_summary());
            orchestrator.finish()?;
            Ok(())
        }
        Commands::Convert {
            source,
            target,
            source_format,
            target_format,
            kind,
            common,
        } => {
            let orchestrator = SyncOrchestrator::new(
                adapter(&registry, source_format)?,
                adapter(&registry, target_format)?,
                kind.into(),
                state_store(&common),
                SyncOptions {
                    bidirectional: false,
                    dry_run: common.dry_run,
                    strict: common.strict,
                },
            )?;
            let report = orchestrator
                .convert_file(&source, &target)
                .with_context(|| format!("convert failed for {}", source.display()))?;
            print_pair(&report);
            Ok(())
        }
    }
}
