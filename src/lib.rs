// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod output;
pub mod shutdown;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{resolve, ConfigFile, WatchSettings};
use crate::engine::{fan_out, Reflex, ReflexHandle};
use crate::exec::{PipeBackend, PtyBackend, TerminalBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::OutputSink;
use crate::shutdown::{ShutdownCoordinator, DEFAULT_FLUSH_GRACE};
use crate::types::WatchBackendKind;
use crate::watch::{spawn_notify_watcher, Matcher, PathWatcher, WatcherHandle};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (file + CLI)
/// - one reflex (matcher, debouncer, supervisor) per command
/// - the output mux on stdout
/// - the watcher feeding every reflex
/// - SIGINT / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve(&args)?;

    let backend: Arc<dyn TerminalBackend> = if cfg.watch.no_pty {
        Arc::new(PipeBackend)
    } else {
        Arc::new(PtyBackend)
    };

    let (mux, sink) = output::channel(std::io::stdout());
    let reflexes = build_reflexes(&cfg, backend, &sink)?;

    if args.dry_run {
        print_dry_run(&cfg, &reflexes);
        return Ok(());
    }

    let mux_handle = mux.spawn();

    let supervisors = reflexes.iter().map(Reflex::supervisor).collect();
    let coordinator = Arc::new(ShutdownCoordinator::new(
        supervisors,
        sink.clone(),
        DEFAULT_FLUSH_GRACE,
    ));
    let _signals = coordinator
        .install()
        .context("failed to install signal handlers")?;
    drop(sink);

    // One input per reflex, fed by a single fan-out of the watcher's stream.
    let mut inputs = Vec::with_capacity(reflexes.len());
    let mut handles: Vec<ReflexHandle> = Vec::with_capacity(reflexes.len());
    for reflex in &reflexes {
        debug!("starting reflex\n{}", reflex.describe());
        let (tx, rx) = mpsc::channel(1);
        inputs.push(tx);
        handles.push(reflex.start(rx));
    }

    let (changes_tx, changes_rx) = mpsc::channel(1);
    tokio::spawn(fan_out(changes_rx, inputs));

    let matchers: Vec<Arc<dyn Matcher>> = reflexes.iter().map(Reflex::matcher).collect();
    let _watcher = start_watcher(&cfg.watch, matchers, changes_tx)?;

    info!(path = ?cfg.watch.path, reflexes = reflexes.len(), "watching for changes");

    mux_handle
        .await
        .context("output task panicked")?
        .context("failed to write command output")?;

    for handle in handles {
        handle.join().await;
    }
    Ok(())
}

/// Construct a reflex per configured command, ids in config order.
///
/// A pattern that does not compile is fatal here, before anything runs.
pub fn build_reflexes(
    cfg: &ConfigFile,
    backend: Arc<dyn TerminalBackend>,
    sink: &OutputSink,
) -> Result<Vec<Reflex>> {
    cfg.commands
        .iter()
        .enumerate()
        .map(|(idx, settings)| {
            let id = u32::try_from(idx).context("too many commands")?;
            Reflex::from_settings(id, settings, Arc::clone(&backend), sink.clone())
                .with_context(|| format!("invalid command configuration ({})", settings.source))
        })
        .collect()
}

fn start_watcher(
    settings: &WatchSettings,
    matchers: Vec<Arc<dyn Matcher>>,
    changes: mpsc::Sender<String>,
) -> Result<WatcherHandle> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match settings.backend {
        WatchBackendKind::Notify if fs.is_dir(&settings.path) => {
            spawn_notify_watcher(settings.path.clone(), matchers, fs, changes)
        }
        WatchBackendKind::Notify => {
            warn!(path = ?settings.path, "notify backend needs a directory; polling instead");
            Ok(PathWatcher::new(settings.path.clone(), settings.poll_interval, fs).spawn(changes))
        }
        WatchBackendKind::Poll => {
            Ok(PathWatcher::new(settings.path.clone(), settings.poll_interval, fs).spawn(changes))
        }
    }
}

/// Print what would run, without watching or spawning anything.
fn print_dry_run(cfg: &ConfigFile, reflexes: &[Reflex]) {
    println!("reflex dry-run");
    println!("  watch.path = {}", cfg.watch.path.display());
    println!("  watch.backend = {:?}", cfg.watch.backend);
    println!("  watch.poll_interval = {:?}", cfg.watch.poll_interval);
    println!("  watch.no_pty = {}", cfg.watch.no_pty);
    println!();

    for reflex in reflexes {
        print!("{}", reflex.describe());
    }

    debug!("dry-run complete (no execution)");
}
