// src/actions/command.rs

//! Shell command leaf (the site generator, or any external transform).

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::task::{BoxFuture, LeafAction, TaskContext};

/// Stderr lines kept for the error of a failed command.
const STDERR_TAIL: usize = 10;

/// Runs `cmd` through the platform shell in `cwd` and fails on a non-zero
/// exit status.
#[derive(Debug, Clone)]
pub struct CommandAction {
    cmd: String,
    cwd: PathBuf,
}

impl CommandAction {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    async fn run_process(&self, task: &str) -> Result<()> {
        info!(task = %task, cmd = %self.cmd, "starting process");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning `{}`", self.cmd))?;

        // Always consume both pipes so buffers don't fill.
        if let Some(stdout) = child.stdout.take() {
            let task_name = task.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(task = %task_name, "{}", line);
                }
            });
        }
        let stderr_tail = child.stderr.take().map(|stderr| {
            let task_name = task.to_string();
            tokio::spawn(async move {
                let mut tail = VecDeque::with_capacity(STDERR_TAIL);
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stderr: {}", line);
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                tail
            })
        });

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for `{}`", self.cmd))?;

        let code = status.code().unwrap_or(-1);
        info!(task = %task, exit_code = code, success = status.success(), "process exited");

        if !status.success() {
            let tail = match stderr_tail {
                Some(handle) => handle.await.unwrap_or_default(),
                None => VecDeque::new(),
            };
            for line in &tail {
                warn!(task = %task, "stderr: {}", line);
            }
            if tail.is_empty() {
                bail!("`{}` exited with status {}", self.cmd, code);
            }
            let tail: Vec<String> = tail.into();
            bail!(
                "`{}` exited with status {}:\n{}",
                self.cmd,
                code,
                tail.join("\n")
            );
        }
        Ok(())
    }
}

impl LeafAction for CommandAction {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { self.run_process(&ctx.task).await })
    }
}
