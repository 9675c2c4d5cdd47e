// src/task/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

use crate::errors::{Result, SitepipeError};
use crate::task::runner::TaskContext;

/// Canonical task name type.
pub type TaskName = String;

/// Boxed, sendable future used at the leaf executor seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

static NEXT_REGISTRY: AtomicU32 = AtomicU32::new(0);

/// Handle to a task node inside a [`TaskRegistry`].
///
/// Each handle carries the id of the registry that issued it, so a handle
/// from another registry is never mistaken for a local node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    registry: u32,
    index: usize,
}

impl TaskId {
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.registry, self.index)
    }
}

/// The opaque unit of work behind a leaf task.
///
/// Implementations decide what "work" means: spawning a process, copying
/// files, serving HTTP. The runner only looks at the returned `Result`.
pub trait LeafAction: Send + Sync + fmt::Debug {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Leaf,
    Series,
    Parallel,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Leaf => "leaf",
            TaskKind::Series => "series",
            TaskKind::Parallel => "parallel",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum TaskBody {
    Leaf {
        action: Arc<dyn LeafAction>,
        message: Option<String>,
    },
    Series(Vec<TaskId>),
    Parallel(Vec<TaskId>),
}

/// A single node of the task graph.
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    /// Whether `name` is in the registry's name index (leaves always are,
    /// composites only after `name_task`).
    named: bool,
    pub(crate) body: TaskBody,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self) -> bool {
        self.named
    }

    pub fn kind(&self) -> TaskKind {
        match self.body {
            TaskBody::Leaf { .. } => TaskKind::Leaf,
            TaskBody::Series(_) => TaskKind::Series,
            TaskBody::Parallel(_) => TaskKind::Parallel,
        }
    }

    /// Ordered children; empty for leaves.
    pub fn children(&self) -> &[TaskId] {
        match &self.body {
            TaskBody::Leaf { .. } => &[],
            TaskBody::Series(children) | TaskBody::Parallel(children) => children,
        }
    }

    /// Progress message announced right before a leaf runs.
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            TaskBody::Leaf { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Arena of task nodes plus a unique-name index.
///
/// Registering never executes anything. Once the graph is complete the
/// registry is frozen behind an `Arc` and handed to a
/// [`TaskRunner`](crate::task::TaskRunner).
#[derive(Debug)]
pub struct TaskRegistry {
    id: u32,
    tasks: Vec<Task>,
    by_name: HashMap<TaskName, TaskId>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self {
            id: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            tasks: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leaf task.
    pub fn register(
        &mut self,
        name: impl Into<TaskName>,
        action: Arc<dyn LeafAction>,
    ) -> Result<TaskId> {
        self.register_with_message(name, action, None)
    }

    /// Register a leaf task that announces `message` whenever it starts.
    pub fn register_with_message(
        &mut self,
        name: impl Into<TaskName>,
        action: Arc<dyn LeafAction>,
        message: Option<String>,
    ) -> Result<TaskId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(SitepipeError::DuplicateName(name));
        }

        let id = self.push(Task {
            name: name.clone(),
            named: true,
            body: TaskBody::Leaf { action, message },
        });
        self.by_name.insert(name.clone(), id);
        debug!(task = %name, %id, "registered leaf task");
        Ok(id)
    }

    /// Give an existing (usually composite) task a unique name.
    pub fn name_task(&mut self, name: impl Into<TaskName>, id: TaskId) -> Result<()> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(SitepipeError::DuplicateName(name));
        }

        if !self.contains(id) {
            return Err(SitepipeError::UnknownTask(id.to_string()));
        }
        let task = &mut self.tasks[id.index];
        if !task.named {
            task.name = name.clone();
            task.named = true;
        }
        self.by_name.insert(name, id);
        Ok(())
    }

    /// Look up a task by name.
    pub fn get(&self, name: &str) -> Result<TaskId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SitepipeError::UnknownTask(name.to_string()))
    }

    /// Access a task node by id.
    pub fn task(&self, id: TaskId) -> Result<&Task> {
        if !self.contains(id) {
            return Err(SitepipeError::UnknownTask(id.to_string()));
        }
        Ok(&self.tasks[id.index])
    }

    /// Whether `id` was issued by this registry.
    pub fn contains(&self, id: TaskId) -> bool {
        id.registry == self.id && id.index < self.tasks.len()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names in the index, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Render the composition tree below `id`, one node per line.
    pub fn describe(&self, id: TaskId) -> String {
        let mut out = String::new();
        self.describe_into(id, 0, &mut out);
        out
    }

    fn describe_into(&self, id: TaskId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let Ok(task) = self.task(id) else {
            out.push_str(&format!("{indent}- <unknown {id}>\n"));
            return;
        };

        match task.kind() {
            TaskKind::Leaf => out.push_str(&format!("{indent}- {}\n", task.name())),
            kind if task.is_named() => {
                out.push_str(&format!("{indent}- {} [{kind}]\n", task.name()))
            }
            kind => out.push_str(&format!("{indent}- [{kind}]\n")),
        }

        for child in task.children() {
            self.describe_into(*child, depth + 1, out);
        }
    }

    pub(crate) fn id_at(&self, index: usize) -> TaskId {
        TaskId {
            registry: self.id,
            index,
        }
    }

    pub(crate) fn next_id(&self) -> TaskId {
        self.id_at(self.tasks.len())
    }

    pub(crate) fn push(&mut self, task: Task) -> TaskId {
        let id = self.next_id();
        self.tasks.push(task);
        id
    }

    pub(crate) fn push_composite(&mut self, label: String, body: TaskBody) -> TaskId {
        self.push(Task {
            name: label,
            named: false,
            body,
        })
    }
}
