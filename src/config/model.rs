// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::orchestrator::names;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [server]
/// port = 4000
///
/// [watch]
/// debounce_ms = 100
/// content = ["*.html", "_posts/*"]
///
/// [task.generateSite]
/// action = "command"
/// cmd = "bundle exec jekyll build --incremental"
/// message = "Building Jekyll..."
/// ```
///
/// All sections are optional; anything omitted falls back to the built-in
/// pipeline defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// Overrides for the configurable leaves, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served over HTTP (the site generator's output).
    #[serde(default = "default_site_root")]
    pub root: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_site_root() -> PathBuf {
    PathBuf::from("_site")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root: default_site_root(),
        }
    }
}

impl ServerSection {
    /// `host:port`, as accepted by `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[watch]` section: the debounce window and one pattern list per watch
/// rule.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_config_patterns")]
    pub config: Vec<String>,

    #[serde(default = "default_style_patterns")]
    pub styles: Vec<String>,

    #[serde(default = "default_main_script_patterns")]
    pub main_scripts: Vec<String>,

    #[serde(default = "default_preview_script_patterns")]
    pub preview_scripts: Vec<String>,

    #[serde(default = "default_image_patterns")]
    pub images: Vec<String>,

    #[serde(default = "default_content_patterns")]
    pub content: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    50
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_config_patterns() -> Vec<String> {
    strings(&["src/yml/*.yml"])
}

fn default_style_patterns() -> Vec<String> {
    strings(&["_sass/**/*.scss"])
}

fn default_main_script_patterns() -> Vec<String> {
    strings(&["src/js/main/**/*.js"])
}

fn default_preview_script_patterns() -> Vec<String> {
    strings(&["src/js/preview/**/*.js"])
}

fn default_image_patterns() -> Vec<String> {
    strings(&["src/img/**/*"])
}

fn default_content_patterns() -> Vec<String> {
    strings(&[
        "*.html",
        "_includes/*.html",
        "_layouts/*.html",
        "_posts/*",
        "_authors/*",
        "pages/*",
        "category/*",
    ])
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            config: default_config_patterns(),
            styles: default_style_patterns(),
            main_scripts: default_main_script_patterns(),
            preview_scripts: default_preview_script_patterns(),
            images: default_image_patterns(),
            content: default_content_patterns(),
        }
    }
}

impl WatchSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `(field name, patterns)` for every rule, in declaration order.
    pub fn pattern_lists(&self) -> [(&'static str, &[String]); 6] {
        [
            ("config", self.config.as_slice()),
            ("styles", self.styles.as_slice()),
            ("main_scripts", self.main_scripts.as_slice()),
            ("preview_scripts", self.preview_scripts.as_slice()),
            ("images", self.images.as_slice()),
            ("content", self.content.as_slice()),
        ]
    }
}

/// Kind of work behind a configurable leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Command,
    Copy,
    Concat,
    Include,
}

/// `[task.<name>]` section, as written by the user.
///
/// `action` may be omitted when `cmd` is set; it then defaults to
/// `"command"`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    #[serde(default)]
    pub action: Option<ActionKind>,

    /// Shell command (`command` only).
    #[serde(default)]
    pub cmd: Option<String>,

    /// Source globs (`copy`, `concat`), or the single source file (`include`).
    #[serde(default)]
    pub src: Vec<String>,

    /// Destination directory (`copy`) or file (`concat`, `include`).
    /// `copy` and `concat` accept a list to write several outputs.
    #[serde(default)]
    pub dest: Option<Destinations>,

    /// Progress message announced when the leaf starts.
    #[serde(default)]
    pub message: Option<String>,
}

/// `dest = "a"` or `dest = ["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Destinations {
    One(String),
    Many(Vec<String>),
}

impl Destinations {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Destinations::One(dest) => vec![dest],
            Destinations::Many(dests) => dests,
        }
    }
}

/// Validated action of a configurable leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSpec {
    Command { cmd: String },
    Copy { src: Vec<String>, dest: Vec<String> },
    Concat { src: Vec<String>, dest: Vec<String> },
    Include { src: String, dest: String },
}

/// A configurable leaf after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub action: ActionSpec,
    pub message: Option<String>,
}

impl TaskSpec {
    fn new(action: ActionSpec, message: Option<&str>) -> Self {
        Self {
            action,
            message: message.map(str::to_string),
        }
    }
}

/// Built-in definition of each configurable leaf.
///
/// The bundled main script is also written straight into `site_root`, so a
/// script change is served without regenerating the site.
pub fn default_task_specs(site_root: &Path) -> BTreeMap<String, TaskSpec> {
    let bundle = "assets/js/scripts.min.js";
    let mut tasks = BTreeMap::new();
    tasks.insert(
        names::MAIN_ASSETS.to_string(),
        TaskSpec::new(
            ActionSpec::Concat {
                src: strings(&["src/js/main/**/*.js"]),
                dest: vec![
                    bundle.to_string(),
                    site_root.join(bundle).to_string_lossy().into_owned(),
                ],
            },
            Some("Building JS files..."),
        ),
    );
    tasks.insert(
        names::PREVIEW_ASSETS.to_string(),
        TaskSpec::new(
            ActionSpec::Copy {
                src: strings(&["src/js/preview/**/*.*"]),
                dest: strings(&["assets/js"]),
            },
            Some("Copying preview files..."),
        ),
    );
    tasks.insert(
        names::IMAGES.to_string(),
        TaskSpec::new(
            ActionSpec::Copy {
                src: strings(&["src/img/**/*.{jpg,png,gif,svg}"]),
                dest: strings(&["assets/img"]),
            },
            Some("Copying image files..."),
        ),
    );
    tasks.insert(
        names::CONFIG.to_string(),
        TaskSpec::new(
            ActionSpec::Include {
                src: "src/yml/_config.yml".to_string(),
                dest: "_config.yml".to_string(),
            },
            None,
        ),
    );
    tasks.insert(
        names::GENERATE_SITE.to_string(),
        TaskSpec::new(
            ActionSpec::Command {
                cmd: "bundle exec jekyll build".to_string(),
            },
            Some("Building Jekyll..."),
        ),
    );
    tasks
}

/// Validated configuration. Every configurable leaf has a [`TaskSpec`].
///
/// Only obtainable through `TryFrom<RawConfigFile>` or [`Default`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub watch: WatchSection,
    tasks: BTreeMap<String, TaskSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        server: ServerSection,
        watch: WatchSection,
        tasks: BTreeMap<String, TaskSpec>,
    ) -> Self {
        Self {
            server,
            watch,
            tasks,
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&str, &TaskSpec)> {
        self.tasks.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let server = ServerSection::default();
        let tasks = default_task_specs(&server.root);
        Self::new_unchecked(server, WatchSection::default(), tasks)
    }
}
