// src/actions/mod.rs

//! Built-in leaf actions.
//!
//! The task core treats all of these as opaque [`LeafAction`]s; this module
//! only knows how to turn a configured [`ActionSpec`] into one.

pub mod command;
pub mod files;
pub mod include;
pub mod reload;

use std::path::Path;
use std::sync::Arc;

pub use command::CommandAction;
pub use files::{ConcatAction, CopyAction};
pub use include::{IncludeAction, IncludeExpander};
pub use reload::ReloadAction;

use crate::config::ActionSpec;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::task::LeafAction;

/// Build the action for a configured leaf. Relative paths are resolved
/// against `root`.
pub fn build_action(
    spec: &ActionSpec,
    root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<Arc<dyn LeafAction>> {
    let action: Arc<dyn LeafAction> = match spec {
        ActionSpec::Command { cmd } => Arc::new(CommandAction::new(cmd.clone(), root)),
        ActionSpec::Copy { src, dest } => Arc::new(CopyAction::new(root, src, dest.as_slice(), fs)?),
        ActionSpec::Concat { src, dest } => Arc::new(ConcatAction::new(root, src, dest.as_slice(), fs)?),
        ActionSpec::Include { src, dest } => Arc::new(IncludeAction::new(root, src, dest, fs)?),
    };
    Ok(action)
}
