// src/task/runner.rs

//! Execution of task nodes.
//!
//! - a leaf announces its message (if any) and awaits its action;
//! - a `series` awaits each child in order and stops at the first error;
//! - a `parallel` spawns every child on the runtime and returns the first
//!   error it sees. Siblings that are still running are not interrupted; they
//!   finish in the background and their results are discarded.
//!
//! Nothing is cached between invocations: every run re-executes all
//! descendants.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::{Result, SitepipeError};
use crate::notifier::Notifier;
use crate::task::registry::{BoxFuture, LeafAction, Task, TaskBody, TaskId, TaskName, TaskRegistry};

/// What a leaf action gets to see while it runs.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Name of the leaf being executed.
    pub task: TaskName,
    /// Runner that is executing the leaf; long-lived leaves use it to run
    /// other tasks.
    pub runner: TaskRunner,
}

/// Executes tasks from a frozen [`TaskRegistry`].
///
/// Cheap to clone: it is a pair of `Arc`s.
#[derive(Clone)]
pub struct TaskRunner {
    registry: Arc<TaskRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("tasks", &self.registry.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl TaskRunner {
    pub fn new(registry: Arc<TaskRegistry>, notifier: Arc<dyn Notifier>) -> Self {
        Self { registry, notifier }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Run the task `id` and all of its descendants.
    ///
    /// The returned future owns its own clone of the runner, so it can be
    /// spawned.
    pub fn run(&self, id: TaskId) -> BoxFuture<'static, Result<()>> {
        let runner = self.clone();
        Box::pin(async move { runner.execute(id).await })
    }

    /// Run a task looked up by name.
    pub async fn run_named(&self, name: &str) -> Result<()> {
        let id = self.registry.get(name)?;
        self.run(id).await
    }

    async fn execute(&self, id: TaskId) -> Result<()> {
        let task = self.registry.task(id)?;

        match &task.body {
            TaskBody::Leaf { action, message } => {
                self.run_leaf(task, action, message.as_deref()).await
            }
            TaskBody::Series(children) => self.run_series(task, children).await,
            TaskBody::Parallel(children) => self.run_parallel(task, children).await,
        }
    }

    async fn run_leaf(
        &self,
        task: &Task,
        action: &Arc<dyn LeafAction>,
        message: Option<&str>,
    ) -> Result<()> {
        if let Some(message) = message {
            self.notifier.notify(message);
        }

        info!(task = %task.name(), "starting task");
        let started = Instant::now();

        let ctx = TaskContext {
            task: task.name().to_string(),
            runner: self.clone(),
        };

        match action.run(ctx).await {
            Ok(()) => {
                info!(
                    task = %task.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "finished task"
                );
                Ok(())
            }
            Err(err) => {
                let reason = format!("{err:#}");
                error!(task = %task.name(), error = %reason, "task failed");
                Err(SitepipeError::TaskExecution {
                    task: task.name().to_string(),
                    reason,
                })
            }
        }
    }

    async fn run_series(&self, task: &Task, children: &[TaskId]) -> Result<()> {
        for (index, child) in children.iter().enumerate() {
            if let Err(err) = self.run(*child).await {
                debug!(
                    task = %task.name(),
                    skipped = children.len() - index - 1,
                    "series child failed; skipping the rest"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    async fn run_parallel(&self, task: &Task, children: &[TaskId]) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Result<()>>();

        for child in children {
            let fut = self.run(*child);
            let tx = tx.clone();
            // Dropping the JoinHandle detaches the child; it is never aborted.
            tokio::spawn(async move {
                let _ = tx.send(fut.await);
            });
        }
        drop(tx);

        let mut remaining = children.len();
        while remaining > 0 {
            match rx.recv().await {
                Some(Ok(())) => remaining -= 1,
                Some(Err(err)) => {
                    debug!(
                        task = %task.name(),
                        still_running = remaining - 1,
                        "parallel child failed; not waiting for siblings"
                    );
                    return Err(err);
                }
                None => {
                    return Err(SitepipeError::TaskExecution {
                        task: task.name().to_string(),
                        reason: "a parallel child stopped without reporting a result".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
