// src/watch/rules.rs

use std::fmt;
use std::time::Duration;

use globset::GlobSet;

use crate::errors::{Result, SitepipeError};
use crate::task::{TaskId, TaskRegistry};
use crate::watch::patterns::build_globset;

/// Debounce window used when a rule does not set its own.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Binds a set of glob patterns to the task chain that a change re-runs.
#[derive(Debug, Clone)]
pub struct WatchRule {
    name: String,
    patterns: Vec<String>,
    target: TaskId,
    debounce: Option<Duration>,
}

impl WatchRule {
    pub fn new(name: impl Into<String>, patterns: Vec<String>, target: TaskId) -> Self {
        Self {
            name: name.into(),
            patterns,
            target,
            debounce: None,
        }
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = Some(window);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn target(&self) -> TaskId {
        self.target
    }

    pub fn debounce(&self) -> Option<Duration> {
        self.debounce
    }
}

/// A [`WatchRule`] whose patterns have been compiled and whose target has
/// been checked against a registry.
#[derive(Clone)]
pub struct CompiledRule {
    rule: WatchRule,
    matcher: GlobSet,
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("name", &self.rule.name)
            .field("target", &self.rule.target)
            .finish_non_exhaustive()
    }
}

impl CompiledRule {
    pub fn compile(rule: WatchRule, registry: &TaskRegistry) -> Result<Self> {
        if rule.patterns.is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "watch rule '{}' has no patterns",
                rule.name
            )));
        }
        if !registry.contains(rule.target) {
            return Err(SitepipeError::UnknownTask(rule.target.to_string()));
        }

        let matcher = build_globset(&rule.patterns)
            .map_err(|e| e.context(format!("compiling patterns for watch rule '{}'", rule.name)))?;

        Ok(Self { rule, matcher })
    }

    pub fn rule(&self) -> &WatchRule {
        &self.rule
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    /// `rel_path` is relative to the watch root, with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    pub fn debounce_or(&self, default: Duration) -> Duration {
        self.rule.debounce.unwrap_or(default)
    }
}
