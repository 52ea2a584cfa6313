//! Command executor abstraction.
//!
//! Managers never spawn processes directly; they go through a
//! [`CommandExecutor`] so tests can substitute a recording or simulated
//! host for the real shell.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::CfgMgrResult;
use crate::shell::{self, ExecResult};

/// Runs command strings against the host.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `cmd` and returns its result whatever the exit code.
    async fn exec(&self, cmd: &str) -> CfgMgrResult<ExecResult>;

    /// Runs `cmd` and fails on non-zero exit, returning stdout otherwise.
    async fn exec_or_throw(&self, cmd: &str) -> CfgMgrResult<String> {
        self.exec(cmd).await?.into_stdout(cmd)
    }
}

/// Executes commands through `/bin/sh` with a per-command timeout.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    timeout: Duration,
    cancel: CancellationToken,
}

impl ShellExecutor {
    /// Creates an executor whose commands are killed after `timeout` or
    /// as soon as `cancel` fires.
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn exec(&self, cmd: &str) -> CfgMgrResult<ExecResult> {
        shell::exec(cmd, self.timeout, &self.cancel).await
    }
}
