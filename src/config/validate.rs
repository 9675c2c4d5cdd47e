// src/config/validate.rs

use crate::config::model::{
    ActionKind, ActionSpec, ConfigFile, Destinations, RawConfigFile, TaskConfig, TaskSpec,
    default_task_specs,
};
use crate::errors::{Result, SitepipeError};
use crate::orchestrator::names;
use crate::watch::patterns::compile_glob;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_server(&raw)?;
        validate_watch(&raw)?;

        let mut tasks = default_task_specs(&raw.server.root);
        for (name, task) in raw.task.iter() {
            if !names::CONFIGURABLE.contains(&name.as_str()) {
                return Err(SitepipeError::ConfigError(format!(
                    "[task.{name}] is not a configurable task (expected one of: {})",
                    names::CONFIGURABLE.join(", ")
                )));
            }
            tasks.insert(name.clone(), resolve_task(name, task)?);
        }

        Ok(ConfigFile::new_unchecked(raw.server, raw.watch, tasks))
    }
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[server].host must not be empty".to_string(),
        ));
    }
    if cfg.server.root.as_os_str().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[server].root must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(SitepipeError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    for (field, patterns) in cfg.watch.pattern_lists() {
        if patterns.is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "[watch].{field} must contain at least one pattern"
            )));
        }
        validate_globs(&format!("[watch].{field}"), patterns)?;
    }
    Ok(())
}

fn validate_globs(location: &str, patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        compile_glob(pattern)
            .map_err(|e| SitepipeError::ConfigError(format!("{location}: {e:#}")))?;
    }
    Ok(())
}

fn resolve_task(name: &str, task: &TaskConfig) -> Result<TaskSpec> {
    let missing = |field: &str| {
        SitepipeError::ConfigError(format!("[task.{name}] requires `{field}`"))
    };

    let kind = match (task.action, &task.cmd) {
        (Some(kind), _) => kind,
        (None, Some(_)) => ActionKind::Command,
        (None, None) => return Err(missing("action")),
    };

    let action = match kind {
        ActionKind::Command => {
            let cmd = task.cmd.clone().ok_or_else(|| missing("cmd"))?;
            if cmd.trim().is_empty() {
                return Err(missing("cmd"));
            }
            ActionSpec::Command { cmd }
        }
        ActionKind::Copy | ActionKind::Concat => {
            if task.src.is_empty() {
                return Err(missing("src"));
            }
            validate_globs(&format!("[task.{name}].src"), &task.src)?;
            let src = task.src.clone();
            let dest = task
                .dest
                .clone()
                .map(Destinations::into_vec)
                .filter(|dests| !dests.is_empty())
                .ok_or_else(|| missing("dest"))?;
            if kind == ActionKind::Copy {
                ActionSpec::Copy { src, dest }
            } else {
                ActionSpec::Concat { src, dest }
            }
        }
        ActionKind::Include => {
            let [src] = task.src.as_slice() else {
                return Err(SitepipeError::ConfigError(format!(
                    "[task.{name}] with action \"include\" takes exactly one `src` file"
                )));
            };
            let dest = match task.dest.clone() {
                Some(Destinations::One(dest)) => dest,
                Some(Destinations::Many(dests)) => match <[String; 1]>::try_from(dests) {
                    Ok([dest]) => dest,
                    Err(_) => {
                        return Err(SitepipeError::ConfigError(format!(
                            "[task.{name}] with action \"include\" takes exactly one `dest` file"
                        )));
                    }
                },
                None => return Err(missing("dest")),
            };
            ActionSpec::Include {
                src: src.clone(),
                dest,
            }
        }
    };

    Ok(TaskSpec {
        action,
        message: task.message.clone(),
    })
}
