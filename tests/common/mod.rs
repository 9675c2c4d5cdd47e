#![allow(dead_code, unused_imports)]

use std::sync::Arc;

pub use sitepipe_test_utils::{
    EventLog, FakeAction, RecordingNotifier, fake_leaves, fake_leaves_with, init_tracing,
    with_timeout,
};

use sitepipe::task::{TaskRegistry, TaskRunner};

/// Freeze `registry` into a runner that records notifications into `log`.
pub fn runner_for(registry: TaskRegistry, log: &EventLog) -> TaskRunner {
    TaskRunner::new(Arc::new(registry), RecordingNotifier::new(log).arc())
}
