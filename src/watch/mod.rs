// src/watch/mod.rs

//! File watching and re-execution.
//!
//! This module is responsible for:
//! - Compiling glob patterns (for watch rules and for file action sources).
//! - The per-rule debounce / single-flight state machine.
//! - Wiring a cross-platform filesystem watcher (`notify`) into the watch
//!   loop, which re-runs each rule's target task.

pub mod path_utils;
pub mod patterns;
pub mod rules;
pub mod state;
pub mod watcher;

pub use patterns::{SourceFile, SourceGlob, build_globset, collect_matching_files, glob_base};
pub use rules::{CompiledRule, DEFAULT_DEBOUNCE, WatchRule};
pub use state::{RuleCommand, RuleState, RunState};
pub use watcher::{WatchAction, WatchEvent, Watcher, WatcherHandle, spawn_fs_watcher};
