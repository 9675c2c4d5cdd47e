// src/lib.rs

pub mod actions;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod notifier;
pub mod orchestrator;
pub mod server;
pub mod task;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::fs::{FileSystem, RealFileSystem};
use crate::notifier::BroadcastNotifier;
use crate::orchestrator::{EntryPoint, Orchestrator, PipelineLeaves};

/// High-level entry point used by `main.rs`.
///
/// Loads the configuration, assembles the pipeline and runs the selected
/// entry point. Ctrl-C ends the run without an error.
pub async fn run(args: CliArgs) -> Result<()> {
    let (config_path, explicit) = match &args.config {
        Some(path) => (PathBuf::from(path), true),
        None => (default_config_path(), false),
    };
    let cfg = load_or_default(&config_path, explicit)?;
    let root = project_root(&config_path);
    let entry = args.entry_point();

    let channel = Arc::new(BroadcastNotifier::default());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let leaves = PipelineLeaves::from_config(&cfg, &root, fs, channel.clone())?;
    let orchestrator = Orchestrator::assemble(leaves, &cfg.watch, &root, channel)?;

    if args.dry_run {
        print_dry_run(&cfg, &orchestrator, entry, &root);
        return Ok(());
    }

    tokio::select! {
        result = orchestrator.run(entry) => {
            result?;
            info!(entry = %entry, "pipeline finished");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted; shutting down");
        }
    }

    Ok(())
}

/// Directory the pipeline works in: the config file's directory, or the
/// current working directory for a bare file name.
fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_dry_run(cfg: &ConfigFile, orchestrator: &Orchestrator, entry: EntryPoint, root: &Path) {
    println!("sitepipe dry-run");
    println!("  root = {}", root.display());
    println!("  server = http://{} (serving {})", cfg.server.address(), cfg.server.root.display());
    println!("  watch.debounce_ms = {}", cfg.watch.debounce_ms);
    println!();

    println!("tasks:");
    for (name, task) in cfg.tasks() {
        println!("  - {name}: {:?}", task.action);
        if let Some(ref message) = task.message {
            println!("      message: {message}");
        }
    }
    println!();

    println!("pipeline `{entry}`:");
    print!("{}", orchestrator.describe(entry));

    if entry == EntryPoint::Default {
        println!();
        println!("watch rules:");
        print!("{}", orchestrator.describe_watch_rules());
    }

    debug!("dry-run complete (no execution)");
}
