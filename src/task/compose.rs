// src/task/compose.rs

//! `series` / `parallel` combinators.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{Result, SitepipeError};
use crate::task::registry::{TaskBody, TaskId, TaskKind, TaskRegistry};

impl TaskRegistry {
    /// Compose `children` to run one after another, stopping at the first
    /// failure.
    pub fn series(&mut self, children: &[TaskId]) -> Result<TaskId> {
        self.compose(TaskKind::Series, children)
    }

    /// Compose `children` to run concurrently; fails as soon as any child
    /// fails.
    pub fn parallel(&mut self, children: &[TaskId]) -> Result<TaskId> {
        self.compose(TaskKind::Parallel, children)
    }

    fn compose(&mut self, kind: TaskKind, children: &[TaskId]) -> Result<TaskId> {
        if children.is_empty() {
            return Err(SitepipeError::Composition(format!(
                "{kind} requires at least one child task"
            )));
        }

        let id = self.next_id();
        for child in children {
            if *child == id {
                return Err(SitepipeError::Composition(format!(
                    "{kind} {id} cannot contain itself"
                )));
            }
            if !self.contains(*child) {
                return Err(SitepipeError::UnknownTask(child.to_string()));
            }
        }

        ensure_acyclic(self, id, children)?;

        let names: Vec<&str> = children
            .iter()
            .filter_map(|c| self.task(*c).ok())
            .map(|t| t.name())
            .collect();
        let label = format!("{kind}({})", names.join(", "));

        let body = match kind {
            TaskKind::Series => TaskBody::Series(children.to_vec()),
            _ => TaskBody::Parallel(children.to_vec()),
        };

        let id = self.push_composite(label, body);
        debug!(%id, %kind, children = children.len(), "composed task");
        Ok(id)
    }
}

/// Check that adding `new_id -> children` keeps the subgraph below `new_id`
/// acyclic.
///
/// Edge direction: parent -> child.
fn ensure_acyclic(registry: &TaskRegistry, new_id: TaskId, children: &[TaskId]) -> Result<()> {
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    graph.add_node(new_id.index());

    let mut stack: Vec<TaskId> = Vec::new();
    for child in children {
        graph.add_edge(new_id.index(), child.index(), ());
        stack.push(*child);
    }

    while let Some(id) = stack.pop() {
        let task = registry.task(id)?;
        for grandchild in task.children() {
            if !graph.contains_edge(id.index(), grandchild.index()) {
                graph.add_edge(id.index(), grandchild.index(), ());
                stack.push(*grandchild);
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = registry.id_at(cycle.node_id());
            let name = registry
                .task(node)
                .map(|t| t.name().to_string())
                .unwrap_or_else(|_| node.to_string());
            Err(SitepipeError::Composition(format!(
                "cycle detected in task graph involving '{name}'"
            )))
        }
    }
}
