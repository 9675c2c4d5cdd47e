// src/watch/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Compile one glob with minimatch-style separators: `*` stays inside a path
/// segment, `**` crosses segments.
pub fn compile_glob(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat)?);
    }
    Ok(builder.build()?)
}

/// Literal directory prefix of a glob, i.e. everything before the first
/// segment containing a wildcard. For a fully literal pattern this is the
/// parent directory of the file.
///
/// `src/img/**/*.png` -> `src/img`, `src/yml/_config.yml` -> `src/yml`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal: Vec<&str> = segments
        .iter()
        .take_while(|s| !s.contains(['*', '?', '[', '{']))
        .copied()
        .collect();

    let take = if literal.len() == segments.len() {
        literal.len().saturating_sub(1)
    } else {
        literal.len()
    };

    literal[..take]
        .iter()
        .filter(|s| !s.is_empty() && **s != ".")
        .collect()
}

/// A source glob together with its base directory.
#[derive(Clone)]
pub struct SourceGlob {
    pattern: String,
    matcher: GlobMatcher,
    base: PathBuf,
}

impl fmt::Debug for SourceGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceGlob")
            .field("pattern", &self.pattern)
            .field("base", &self.base)
            .finish()
    }
}

impl SourceGlob {
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = compile_glob(pattern)?.compile_matcher();
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            base: glob_base(pattern),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `rel_path` is relative to the project root, with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// A file picked up by a set of source globs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path (root joined).
    pub path: PathBuf,
    /// Path relative to the base of the glob that matched it.
    pub relative: PathBuf,
}

/// Collect all files under `root` that match any of `globs`, sorted by path.
///
/// Only the base directory of each glob is walked. A file matched by several
/// globs is reported once, relative to the first glob that matched it.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    globs: &[SourceGlob],
) -> Result<Vec<SourceFile>> {
    let mut files: Vec<SourceFile> = Vec::new();

    for glob in globs {
        let start = base_dir(root, glob.base());
        if !fs.is_dir(&start) {
            continue;
        }

        let mut stack = vec![start];
        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Some(rel) = rel_to(root, &path) else {
                        continue;
                    };
                    if !glob.matches(&rel) || files.iter().any(|f| f.path == path) {
                        continue;
                    }
                    let relative = path
                        .strip_prefix(base_dir(root, glob.base()))
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| PathBuf::from(&rel));
                    files.push(SourceFile { path, relative });
                }
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn base_dir(root: &Path, base: &Path) -> PathBuf {
    if base.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(base)
    }
}

fn rel_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}
