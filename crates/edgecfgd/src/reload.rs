//! FRR reload invoker

use std::path::Path;
use std::sync::Arc;

use edge_cfgmgr_common::CommandExecutor;
use tracing::{info, instrument, warn};

use crate::commands::{build_reload_cmd, build_reload_test_cmd};
use crate::error::{EdgeError, Result};

/// Hands a freshly written configuration to `frr-reload.py`.
///
/// Any non-zero exit is a failure carrying the tool's combined output.
/// There is no retry; the next pass tries again.
pub struct ReloadInvoker {
    executor: Arc<dyn CommandExecutor>,
    command: String,
    validate_first: bool,
}

impl ReloadInvoker {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        command: impl Into<String>,
        validate_first: bool,
    ) -> Self {
        Self {
            executor,
            command: command.into(),
            validate_first,
        }
    }

    /// Apply `config` to the running daemon, replacing its state.
    #[instrument(skip(self), fields(config = %config.display()))]
    pub async fn reload(&self, config: &Path) -> Result<String> {
        if self.validate_first {
            let test_cmd = build_reload_test_cmd(&self.command, config);
            if let Err(e) = self.executor.exec_or_throw(&test_cmd).await {
                warn!("Configuration rejected by dry run, not reloading");
                return Err(EdgeError::Reload(e));
            }
        }

        let output = self
            .executor
            .exec_or_throw(&build_reload_cmd(&self.command, config))
            .await
            .map_err(EdgeError::Reload)?;
        info!("FRR successfully reloaded");
        Ok(output)
    }
}
