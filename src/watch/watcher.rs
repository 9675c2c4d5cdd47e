// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::task::{BoxFuture, LeafAction, TaskContext, TaskRunner};
use crate::watch::path_utils::relative_str;
use crate::watch::rules::{CompiledRule, DEFAULT_DEBOUNCE, WatchRule};
use crate::watch::state::{RuleCommand, RuleState};

/// Events flowing into the watch loop.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A path changed on disk (absolute, or relative to the watch root).
    PathChanged(PathBuf),
    /// The debounce timer of rule `rule` elapsed.
    TimerElapsed { rule: usize, generation: u64 },
    /// The target task of rule `rule` finished.
    RunFinished { rule: usize, success: bool },
}

/// Long-lived loop mapping filesystem changes onto task runs.
///
/// All rule states live here and are only touched from [`Watcher::run`];
/// timers and task runs are spawned and report back over the same channel.
pub struct Watcher {
    root: PathBuf,
    runner: TaskRunner,
    default_debounce: Duration,
    rules: Vec<CompiledRule>,
    states: Vec<RuleState>,
    event_tx: mpsc::UnboundedSender<WatchEvent>,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("root", &self.root)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn new(root: impl Into<PathBuf>, runner: TaskRunner) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            root: root.into(),
            runner,
            default_debounce: DEFAULT_DEBOUNCE,
            rules: Vec::new(),
            states: Vec::new(),
            event_tx,
            event_rx,
        }
    }

    pub fn with_default_debounce(mut self, window: Duration) -> Self {
        self.default_debounce = window;
        self
    }

    /// Register a rule. Its target must exist in the runner's registry.
    pub fn add_rule(&mut self, rule: WatchRule) -> Result<()> {
        let compiled = CompiledRule::compile(rule, self.runner.registry())?;
        debug!(rule = %compiled.name(), "watch rule added");
        self.rules.push(compiled);
        self.states.push(RuleState::new());
        Ok(())
    }

    /// Sender for feeding events into the loop (filesystem bridge, tests).
    pub fn sender(&self) -> mpsc::UnboundedSender<WatchEvent> {
        self.event_tx.clone()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Main loop. The watcher keeps its own sender, so under normal operation
    /// this never returns.
    pub async fn run(mut self) -> Result<()> {
        info!(root = ?self.root, rules = ?self.rule_names(), "watching for changes");

        while let Some(event) = self.event_rx.recv().await {
            self.handle_event(event);
        }

        debug!("watch loop finished");
        Ok(())
    }

    fn handle_event(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::PathChanged(path) => {
                let Some(rel) = relative_str(&self.root, &path) else {
                    debug!(?path, root = ?self.root, "ignoring change outside watch root");
                    return;
                };

                for index in 0..self.rules.len() {
                    if self.rules[index].matches(&rel) {
                        debug!(rule = %self.rules[index].name(), path = %rel, "watch match");
                        let command = self.states[index].on_change();
                        self.apply(index, command);
                    }
                }
            }
            WatchEvent::TimerElapsed { rule, generation } => {
                if let Some(state) = self.states.get_mut(rule) {
                    let command = state.on_timer(generation);
                    self.apply(rule, command);
                }
            }
            WatchEvent::RunFinished { rule, success } => {
                if let Some(state) = self.states.get_mut(rule) {
                    debug!(rule = %self.rules[rule].name(), success, "watch run finished");
                    let command = state.on_finished();
                    self.apply(rule, command);
                }
            }
        }
    }

    fn apply(&self, index: usize, command: RuleCommand) {
        match command {
            RuleCommand::ArmTimer(generation) => self.arm_timer(index, generation),
            RuleCommand::Execute => self.start_run(index),
            RuleCommand::Nothing => {}
        }
    }

    fn arm_timer(&self, index: usize, generation: u64) {
        let window = self.rules[index].debounce_or(self.default_debounce);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx.send(WatchEvent::TimerElapsed {
                rule: index,
                generation,
            });
        });
    }

    fn start_run(&self, index: usize) {
        let rule = self.rules[index].rule().clone();
        let runner = self.runner.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            runner
                .notifier()
                .notify(&format!("Change detected: running {}", rule.name()));

            let result = runner.run(rule.target()).await;
            if let Err(err) = &result {
                // Swallowed here: the loop must outlive individual failures.
                warn!(rule = %rule.name(), error = %err, "triggered pipeline failed");
                runner
                    .notifier()
                    .notify(&format!("{} failed: {}", rule.name(), err));
            }

            let _ = tx.send(WatchEvent::RunFinished {
                rule: index,
                success: result.is_ok(),
            });
        });
    }
}

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping it stops
/// filesystem notifications.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward every changed path into `tx` as
/// [`WatchEvent::PathChanged`]. Access-only events are dropped.
pub fn spawn_fs_watcher(
    root: &Path,
    tx: mpsc::UnboundedSender<WatchEvent>,
) -> anyhow::Result<WatcherHandle> {
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_access() {
                    return;
                }
                for path in event.paths {
                    if tx.send(WatchEvent::PathChanged(path)).is_err() {
                        return;
                    }
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .context("creating filesystem watcher")?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", root))?;

    info!("file watcher started on {:?}", root);
    Ok(WatcherHandle { _inner: watcher })
}

/// Leaf action behind `startWatching`: runs a [`Watcher`] over the given
/// rules until the process ends.
#[derive(Debug, Clone)]
pub struct WatchAction {
    root: PathBuf,
    rules: Vec<WatchRule>,
    debounce: Duration,
}

impl WatchAction {
    pub fn new(root: impl Into<PathBuf>, rules: Vec<WatchRule>, debounce: Duration) -> Self {
        Self {
            root: root.into(),
            rules,
            debounce,
        }
    }
}

impl LeafAction for WatchAction {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());

            let mut watcher = Watcher::new(&root, ctx.runner).with_default_debounce(self.debounce);
            for rule in &self.rules {
                watcher.add_rule(rule.clone())?;
            }

            let _handle = spawn_fs_watcher(&root, watcher.sender())?;
            watcher.run().await?;
            Ok(())
        })
    }
}
