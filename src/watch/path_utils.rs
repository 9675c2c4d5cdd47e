// src/watch/path_utils.rs

//! Path normalisation for watch events.

use std::path::{Component, Path};

/// Turn an event path into a forward-slash string relative to `root`.
///
/// Relative inputs are taken as already relative to `root`. Absolute inputs
/// are stripped of `root` first directly, then after canonicalising both
/// sides (macOS reports `/private/var/...` for `/var/...`).
///
/// Returns `None` if the path lies outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if path.is_relative() {
        return Some(to_slash(path));
    }

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
