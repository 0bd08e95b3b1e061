// ABOUTME: Item runner capability trait and the external-process implementation
// ABOUTME: Spawns one process per work item, streams output lines, honors cancellation

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::{ExecutionError, Result};
use super::events::{CancelToken, EventBus};
use crate::parser::{StageId, WorkItemId};

/// Terminal status of one item run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure { reason: String },
    Cancelled,
}

/// Everything a single invocation produced: the terminal status and the
/// item's own accumulated output. Each run owns its buffer; concurrent runs
/// never share one.
#[derive(Debug, Clone)]
pub struct ItemRun {
    pub outcome: RunOutcome,
    pub output: String,
}

/// Capability interface over the opaque per-item execution engine.
///
/// One call per work item: the implementation streams text lines through
/// the event bus and returns a terminal status. The supervision logic never
/// inspects what the engine actually does, which keeps it testable with a
/// scripted fake.
#[async_trait]
pub trait ItemRunner: Send + Sync {
    async fn run(
        &self,
        item: &WorkItemId,
        stage_id: StageId,
        bus: &EventBus,
        cancel: &CancelToken,
    ) -> Result<ItemRun>;
}

/// Runs items by spawning a configured command with the item id appended,
/// e.g. `agent run 1.1.2.1`.
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
    grace: Duration,
}

impl ProcessRunner {
    /// Build from a space-separated command line, e.g. `"agent run"`.
    pub fn from_command(command: &str, grace: Duration) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or(ExecutionError::EmptyRunnerCommand)?
            .to_string();

        Ok(Self {
            program,
            args: parts.map(str::to_string).collect(),
            grace,
        })
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Ask the process to stop. The forced kill only comes after the grace
/// period expires.
#[cfg(unix)]
fn send_terminate(pid: u32, item: &WorkItemId) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Err(error) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        warn!("Failed to signal runner for {}: {}", item, error);
    }
}

#[cfg(not(unix))]
fn send_terminate(_pid: u32, _item: &WorkItemId) {}

#[async_trait]
impl ItemRunner for ProcessRunner {
    async fn run(
        &self,
        item: &WorkItemId,
        stage_id: StageId,
        bus: &EventBus,
        cancel: &CancelToken,
    ) -> Result<ItemRun> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(item.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| ExecutionError::RunnerSpawn {
                item_id: item.to_string(),
                message: error.to_string(),
            })?;

        debug!("Spawned runner for {} (stage {})", item, stage_id);

        // Both pipes feed one per-item channel so the accumulated output
        // stays in arrival order without sharing a buffer across items.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            let tx = line_tx.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = line_tx.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }
        drop(line_tx);

        // Publishing and accumulation run in their own task; it ends when
        // the pipes close after process exit.
        let pump_bus = bus.clone();
        let pump_item = item.clone();
        let pump = tokio::spawn(async move {
            let mut output = String::new();
            while let Some(line) = line_rx.recv().await {
                pump_bus.publish_progress(pump_item.clone(), stage_id, line.clone());
                output.push_str(&line);
                output.push('\n');
            }
            output
        });

        let pid = child.id();
        let early_status = tokio::select! {
            exit = child.wait() => Some(exit?),
            _ = cancel.cancelled() => None,
        };

        let (status, cancelled) = match early_status {
            Some(status) => (status, false),
            None => {
                if let Some(pid) = pid {
                    send_terminate(pid, item);
                }
                let status = match timeout(self.grace, child.wait()).await {
                    Ok(exit) => exit?,
                    Err(_) => {
                        warn!(
                            "Runner for {} ignored termination for {:?}, killing",
                            item, self.grace
                        );
                        child.kill().await?;
                        child.wait().await?
                    }
                };
                (status, true)
            }
        };

        let output = pump.await?;

        let outcome = if cancelled {
            RunOutcome::Cancelled
        } else if status.success() {
            RunOutcome::Success
        } else {
            RunOutcome::Failure {
                reason: format!("runner exited with {status}"),
            }
        };

        Ok(ItemRun { outcome, output })
    }
}
