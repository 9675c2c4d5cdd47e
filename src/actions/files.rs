// src/actions/files.rs

//! `copy` and `concat` leaves: glob-selected sources written under the
//! project root, to one or more destinations. Both run on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::task::{BoxFuture, LeafAction, TaskContext};
use crate::watch::patterns::{SourceGlob, collect_matching_files};

fn compile_sources(patterns: &[String]) -> Result<Vec<SourceGlob>> {
    patterns.iter().map(|p| SourceGlob::new(p)).collect()
}

fn destinations<P: AsRef<Path>>(dests: &[P]) -> Result<Vec<PathBuf>> {
    ensure!(!dests.is_empty(), "at least one destination is required");
    Ok(dests.iter().map(|d| d.as_ref().to_path_buf()).collect())
}

/// Copies every matched file into each destination directory, keeping its
/// path relative to the base of the glob that matched it.
#[derive(Debug, Clone)]
pub struct CopyAction {
    root: PathBuf,
    sources: Vec<SourceGlob>,
    dests: Vec<PathBuf>,
    fs: Arc<dyn FileSystem>,
}

impl CopyAction {
    pub fn new<P: AsRef<Path>>(
        root: impl Into<PathBuf>,
        patterns: &[String],
        dests: &[P],
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            sources: compile_sources(patterns)?,
            dests: destinations(dests)?,
            fs,
        })
    }

    /// Returns the number of source files copied.
    pub fn copy_files(&self) -> Result<usize> {
        let files = collect_matching_files(self.fs.as_ref(), &self.root, &self.sources)?;

        for file in &files {
            let contents = self.fs.read(&file.path)?;
            for dest in &self.dests {
                let target = self.root.join(dest).join(&file.relative);
                self.fs
                    .write(&target, &contents)
                    .with_context(|| format!("copying {:?} to {:?}", file.path, target))?;
                debug!(from = ?file.path, to = ?target, "copied");
            }
        }

        Ok(files.len())
    }
}

impl LeafAction for CopyAction {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        let this = self.clone();
        Box::pin(async move {
            let copied = tokio::task::spawn_blocking(move || this.copy_files())
                .await
                .context("copy worker panicked")??;
            info!(task = %ctx.task, files = copied, dests = ?self.dests, "copied files");
            Ok(())
        })
    }
}

/// Concatenates every matched file (sorted by path, newline separated) and
/// writes the result to each destination file. Writes nothing when no file
/// matches.
#[derive(Debug, Clone)]
pub struct ConcatAction {
    root: PathBuf,
    sources: Vec<SourceGlob>,
    dests: Vec<PathBuf>,
    fs: Arc<dyn FileSystem>,
}

impl ConcatAction {
    pub fn new<P: AsRef<Path>>(
        root: impl Into<PathBuf>,
        patterns: &[String],
        dests: &[P],
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            sources: compile_sources(patterns)?,
            dests: destinations(dests)?,
            fs,
        })
    }

    /// Returns the number of files concatenated.
    pub fn concat_files(&self) -> Result<usize> {
        let files = collect_matching_files(self.fs.as_ref(), &self.root, &self.sources)?;
        if files.is_empty() {
            return Ok(0);
        }

        let mut parts = Vec::with_capacity(files.len());
        for file in &files {
            parts.push(self.fs.read_to_string(&file.path)?);
        }

        let bundle = parts.join("\n");
        for dest in &self.dests {
            let target = self.root.join(dest);
            self.fs
                .write(&target, bundle.as_bytes())
                .with_context(|| format!("writing {:?}", target))?;
        }

        Ok(files.len())
    }
}

impl LeafAction for ConcatAction {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        let this = self.clone();
        Box::pin(async move {
            let joined = tokio::task::spawn_blocking(move || this.concat_files())
                .await
                .context("concat worker panicked")??;
            if joined == 0 {
                info!(task = %ctx.task, "no source files matched; nothing written");
            } else {
                info!(task = %ctx.task, files = joined, dests = ?self.dests, "concatenated files");
            }
            Ok(())
        })
    }
}
