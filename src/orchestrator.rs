// src/orchestrator.rs

//! Assembles the fixed site pipeline.
//!
//! ```text
//! build   = series(parallel(parallel(mainAssets, previewAssets), images),
//!                  config, generateSite)
//! default = series(build, parallel(startServer, startWatching))
//! ```
//!
//! The nested `parallel` in `build` runs the same three leaves concurrently
//! as a flat `parallel(mainAssets, previewAssets, images)` would, and fails
//! the same way. The nesting keeps the scripts group separate from images.
//!
//! `startWatching` re-runs one chain per watch rule; every chain that touches
//! the generated site ends with `reload`. `mainAssets` has no `reload`
//! because its default output is also written into the served root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::actions::{ReloadAction, build_action};
use crate::config::{ConfigFile, WatchSection};
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::notifier::{BroadcastNotifier, Notifier};
use crate::server::ServeAction;
use crate::task::{LeafAction, TaskId, TaskRegistry, TaskRunner};
use crate::watch::{CompiledRule, WatchAction, WatchRule};

/// Task names used by the pipeline.
pub mod names {
    pub const MAIN_ASSETS: &str = "mainAssets";
    pub const PREVIEW_ASSETS: &str = "previewAssets";
    pub const IMAGES: &str = "images";
    pub const CONFIG: &str = "config";
    pub const GENERATE_SITE: &str = "generateSite";
    pub const RELOAD: &str = "reload";
    pub const START_SERVER: &str = "startServer";
    pub const START_WATCHING: &str = "startWatching";
    pub const BUILD: &str = "build";
    pub const DEFAULT: &str = "default";

    /// Leaves that may be redefined in `[task.<name>]`.
    pub const CONFIGURABLE: [&str; 5] = [MAIN_ASSETS, PREVIEW_ASSETS, IMAGES, CONFIG, GENERATE_SITE];
}

/// Externally invocable pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPoint {
    /// Build, then serve and watch until interrupted.
    #[default]
    Default,
    /// Build once and exit.
    Build,
}

impl EntryPoint {
    pub fn name(self) -> &'static str {
        match self {
            EntryPoint::Default => names::DEFAULT,
            EntryPoint::Build => names::BUILD,
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A leaf action with its optional progress message.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub action: Arc<dyn LeafAction>,
    pub message: Option<String>,
}

impl Leaf {
    pub fn new(action: Arc<dyn LeafAction>) -> Self {
        Self {
            action,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The leaves the pipeline is assembled from. `startWatching` is not part of
/// this set: it is derived from the watch rules.
#[derive(Debug, Clone)]
pub struct PipelineLeaves {
    pub main_assets: Leaf,
    pub preview_assets: Leaf,
    pub images: Leaf,
    pub config: Leaf,
    pub generate_site: Leaf,
    pub reload: Leaf,
    pub start_server: Leaf,
}

impl PipelineLeaves {
    /// Real leaves, built from a validated configuration.
    pub fn from_config(
        cfg: &ConfigFile,
        root: &Path,
        fs: Arc<dyn FileSystem>,
        channel: Arc<BroadcastNotifier>,
    ) -> Result<Self> {
        let configured = |name: &str| -> Result<Leaf> {
            let spec = cfg.task(name).ok_or_else(|| {
                SitepipeError::ConfigError(format!("no definition for task '{name}'"))
            })?;
            Ok(Leaf {
                action: build_action(&spec.action, root, fs.clone())?,
                message: spec.message.clone(),
            })
        };

        let server = ServeAction::new(cfg.server.address(), root.join(&cfg.server.root), channel);

        Ok(Self {
            main_assets: configured(names::MAIN_ASSETS)?,
            preview_assets: configured(names::PREVIEW_ASSETS)?,
            images: configured(names::IMAGES)?,
            config: configured(names::CONFIG)?,
            generate_site: configured(names::GENERATE_SITE)?,
            reload: Leaf::new(Arc::new(ReloadAction)).with_message("Reloading..."),
            start_server: Leaf::new(Arc::new(server)),
        })
    }
}

/// The assembled pipeline, ready to run.
#[derive(Debug)]
pub struct Orchestrator {
    runner: TaskRunner,
    build: TaskId,
    default: TaskId,
    watch_rules: Vec<WatchRule>,
}

impl Orchestrator {
    /// Register all leaves, compose the watch chains and both entry points.
    ///
    /// Nothing runs here; every watch rule is checked against the registry so
    /// bad patterns are reported before the first build.
    pub fn assemble(
        leaves: PipelineLeaves,
        watch: &WatchSection,
        root: impl Into<PathBuf>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let mut registry = TaskRegistry::new();
        let leaf = |registry: &mut TaskRegistry, name: &str, leaf: Leaf| {
            registry.register_with_message(name, leaf.action, leaf.message)
        };

        let main_assets = leaf(&mut registry, names::MAIN_ASSETS, leaves.main_assets)?;
        let preview_assets = leaf(&mut registry, names::PREVIEW_ASSETS, leaves.preview_assets)?;
        let images = leaf(&mut registry, names::IMAGES, leaves.images)?;
        let config = leaf(&mut registry, names::CONFIG, leaves.config)?;
        let generate_site = leaf(&mut registry, names::GENERATE_SITE, leaves.generate_site)?;
        let reload = leaf(&mut registry, names::RELOAD, leaves.reload)?;
        let start_server = leaf(&mut registry, names::START_SERVER, leaves.start_server)?;

        let rebuild_site = registry.series(&[config, generate_site, reload])?;
        let restyle = registry.series(&[generate_site, reload])?;
        let preview_chain = registry.series(&[preview_assets, reload])?;
        let image_chain = registry.series(&[images, config, generate_site, reload])?;

        let watch_rules = vec![
            WatchRule::new("config", watch.config.clone(), rebuild_site),
            WatchRule::new("styles", watch.styles.clone(), restyle),
            WatchRule::new("mainScripts", watch.main_scripts.clone(), main_assets),
            WatchRule::new("previewScripts", watch.preview_scripts.clone(), preview_chain),
            WatchRule::new("images", watch.images.clone(), image_chain),
            WatchRule::new("content", watch.content.clone(), rebuild_site),
        ];
        for rule in &watch_rules {
            CompiledRule::compile(rule.clone(), &registry)?;
        }

        let start_watching = registry.register(
            names::START_WATCHING,
            Arc::new(WatchAction::new(root, watch_rules.clone(), watch.debounce())),
        )?;

        let scripts = registry.parallel(&[main_assets, preview_assets])?;
        let assets = registry.parallel(&[scripts, images])?;
        let build = registry.series(&[assets, config, generate_site])?;
        registry.name_task(names::BUILD, build)?;

        let serve_and_watch = registry.parallel(&[start_server, start_watching])?;
        let default = registry.series(&[build, serve_and_watch])?;
        registry.name_task(names::DEFAULT, default)?;

        debug!(tasks = registry.len(), rules = watch_rules.len(), "pipeline assembled");

        Ok(Self {
            runner: TaskRunner::new(Arc::new(registry), notifier),
            build,
            default,
            watch_rules,
        })
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    pub fn entry_point(&self, entry: EntryPoint) -> TaskId {
        match entry {
            EntryPoint::Default => self.default,
            EntryPoint::Build => self.build,
        }
    }

    pub fn watch_rules(&self) -> &[WatchRule] {
        &self.watch_rules
    }

    /// Run an entry point to completion. `default` only returns on failure.
    pub async fn run(&self, entry: EntryPoint) -> Result<()> {
        info!(entry = %entry, "running pipeline");
        self.runner.run(self.entry_point(entry)).await
    }

    /// Composition tree of `entry`.
    pub fn describe(&self, entry: EntryPoint) -> String {
        self.runner.registry().describe(self.entry_point(entry))
    }

    /// One line per watch rule: `name: patterns -> target`.
    pub fn describe_watch_rules(&self) -> String {
        let registry = self.runner.registry();
        let mut out = String::new();
        for rule in &self.watch_rules {
            let target = registry
                .task(rule.target())
                .map(|t| t.name().to_string())
                .unwrap_or_else(|_| rule.target().to_string());
            out.push_str(&format!(
                "- {}: {} -> {}\n",
                rule.name(),
                rule.patterns().join(", "),
                target
            ));
        }
        out
    }
}
