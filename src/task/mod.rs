// src/task/mod.rs

//! Task graph: named leaf tasks plus `series` / `parallel` composites.
//!
//! - [`registry`] owns every task node and the name index.
//! - [`compose`] builds composite nodes and guards the graph invariants.
//! - [`runner`] executes a node and its descendants.
//!
//! Nodes are immutable once added; a composite can only refer to nodes that
//! already exist, so every id handed out points into an acyclic graph.

pub mod compose;
pub mod registry;
pub mod runner;

pub use registry::{BoxFuture, LeafAction, Task, TaskId, TaskKind, TaskName, TaskRegistry};
pub use runner::{TaskContext, TaskRunner};
