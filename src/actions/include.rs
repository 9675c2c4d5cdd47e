// src/actions/include.rs

//! `include` leaf: builds a file by expanding include directives, e.g. in
//! `src/yml/_config.yml`:
//!
//! ```yaml
//! title: My site
//! #= include navigation.yml
//! ```
//!
//! `#=` and `//=` prefixes are accepted, with `include` (always inserted) or
//! `require` (inserted at most once per output). Paths are relative to the
//! including file and the directive's indentation is applied to every
//! inserted line.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::task::{BoxFuture, LeafAction, TaskContext};

const DIRECTIVE_PATTERN: &str =
    r#"^([ \t]*)(?:#|//)=[ \t]*(include|require)[ \t]+["']?([^"'\s]+)["']?[ \t]*\r?$"#;

#[derive(Debug, Clone)]
pub struct IncludeExpander {
    fs: Arc<dyn FileSystem>,
    directive: Regex,
}

impl IncludeExpander {
    pub fn new(fs: Arc<dyn FileSystem>) -> Result<Self> {
        let directive = Regex::new(DIRECTIVE_PATTERN).context("compiling include directive")?;
        Ok(Self { fs, directive })
    }

    /// Expand `path` and everything it includes.
    pub fn expand(&self, path: &Path) -> Result<String> {
        let mut stack = Vec::new();
        let mut required = HashSet::new();
        self.expand_inner(path, &mut stack, &mut required)
    }

    fn expand_inner(
        &self,
        path: &Path,
        stack: &mut Vec<PathBuf>,
        required: &mut HashSet<PathBuf>,
    ) -> Result<String> {
        if stack.iter().any(|p| p == path) {
            let chain: Vec<String> = stack
                .iter()
                .chain(std::iter::once(&path.to_path_buf()))
                .map(|p| p.display().to_string())
                .collect();
            bail!("include cycle: {}", chain.join(" -> "));
        }

        let source = self
            .fs
            .read_to_string(path)
            .with_context(|| format!("reading include source {:?}", path))?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        stack.push(path.to_path_buf());
        let mut out = String::with_capacity(source.len());

        for line in source.lines() {
            let Some(caps) = self.directive.captures(line) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };

            let indent = &caps[1];
            let once = &caps[2] == "require";
            let target = dir.join(&caps[3]);

            if once && !required.insert(target.clone()) {
                debug!(file = ?target, "already required; skipping");
                continue;
            }

            let inserted = self.expand_inner(&target, stack, required)?;
            for inner in inserted.lines() {
                if inner.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(indent);
                    out.push_str(inner);
                    out.push('\n');
                }
            }
        }

        stack.pop();
        Ok(out)
    }
}

/// Expands `src` and writes the result to `dest` (both under `root`).
#[derive(Debug, Clone)]
pub struct IncludeAction {
    src: PathBuf,
    dest: PathBuf,
    expander: IncludeExpander,
}

impl IncludeAction {
    pub fn new(
        root: &Path,
        src: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        Ok(Self {
            src: root.join(src),
            dest: root.join(dest),
            expander: IncludeExpander::new(fs)?,
        })
    }

    pub fn build(&self) -> Result<()> {
        let expanded = self.expander.expand(&self.src)?;
        self.expander
            .fs
            .write(&self.dest, expanded.as_bytes())
            .with_context(|| format!("writing {:?}", self.dest))
    }
}

impl LeafAction for IncludeAction {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        let this = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || this.build())
                .await
                .context("include worker panicked")??;
            info!(task = %ctx.task, dest = ?self.dest, "expanded includes");
            Ok(())
        })
    }
}
