// src/actions/reload.rs

use crate::task::{BoxFuture, LeafAction, TaskContext};

/// Leaf that tells connected browsers to refresh.
///
/// Placed last in a `series`, so it only runs once everything before it has
/// succeeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReloadAction;

impl LeafAction for ReloadAction {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            ctx.runner.notifier().reload();
            Ok(())
        })
    }
}
