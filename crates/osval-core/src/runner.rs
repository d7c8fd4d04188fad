//! Command execution with an explicit fatal/tolerant policy.

use crate::error::CommandFailed;
use crate::invocation::Invocation;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs an [`Invocation`] to completion.
///
/// Guarantees:
/// - `Ok(())` if and only if the process exited with status 0.
/// - Output is not captured; it goes wherever the implementation sends it.
/// - Only one invocation is in flight per call; callers await sequentially.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, invocation: &Invocation) -> Result<(), CommandFailed>;
}

/// Spawns real processes that share the harness's stdin, stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<(), CommandFailed> {
        let start = Instant::now();

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // The child inherits our environment; the override is layered on the
        // child only.
        if let Some(over) = &invocation.env {
            cmd.env(&over.key, &over.value);
        }

        let status = cmd
            .status()
            .await
            .map_err(|source| CommandFailed::Launch {
                program: invocation.program.clone(),
                source,
            })?;

        debug!(
            command = %invocation,
            exit_code = ?status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Process exited"
        );

        if status.success() {
            Ok(())
        } else {
            Err(CommandFailed::Exit {
                program: invocation.program.clone(),
                code: status.code(),
            })
        }
    }
}

/// Front end over a [`CommandExecutor`] that makes the caller pick a tier.
#[derive(Clone)]
pub struct CommandRunner {
    executor: Arc<dyn CommandExecutor>,
}

impl CommandRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Runner backed by real processes.
    pub fn process() -> Self {
        Self::new(Arc::new(ProcessExecutor::new()))
    }

    /// Fatal tier: the failure is handed back for the caller to propagate.
    pub async fn run_checked(&self, invocation: &Invocation) -> Result<(), CommandFailed> {
        debug!(command = %invocation, "Running checked command");
        self.executor.execute(invocation).await
    }

    /// Tolerant tier: failures are logged and reported as `false`.
    pub async fn run_tolerant(&self, invocation: &Invocation) -> bool {
        debug!(command = %invocation, "Running tolerant command");
        match self.executor.execute(invocation).await {
            Ok(()) => true,
            Err(e) => {
                warn!(command = %invocation, error = %e, "Command failed (ignored)");
                false
            }
        }
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner").finish_non_exhaustive()
    }
}
