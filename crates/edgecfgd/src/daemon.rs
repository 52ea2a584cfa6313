//! Control loop
//!
//! One pass runs reconcile, render/write and reload in that order. A failed
//! reconcile is logged and rendering still happens; a failed render or write
//! skips the reload. Nothing here ends the process on a stage failure.

use std::sync::Arc;
use std::time::Duration;

use edge_cfgmgr_common::CommandExecutor;
use edge_types::GlobalIntent;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{DaemonConfig, TableIdMode};
use crate::error::{EdgeError, Result};
use crate::reload::ReloadInvoker;
use crate::render::{render, VrfStanzaStyle};
use crate::table_alloc::TableAllocator;
use crate::vrf_mgr::{ReconcileSummary, TableSource, VrfReconciler};
use crate::writer::ConfigWriter;

/// Outcome of a single pass
#[derive(Debug, Default)]
pub struct PassReport {
    /// Present when reconciliation completed
    pub reconciled: Option<ReconcileSummary>,
    /// Stage failures, in the order they happened
    pub errors: Vec<EdgeError>,
    /// Whether the reload tool accepted the new configuration
    pub reloaded: bool,
    /// The pass stopped early because shutdown was requested
    pub cancelled: bool,
}

impl PassReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }
}

/// The edge configuration daemon
pub struct EdgeDaemon {
    intent: Arc<GlobalIntent>,
    interval: Duration,
    style: VrfStanzaStyle,
    reconciler: VrfReconciler,
    writer: ConfigWriter,
    reloader: ReloadInvoker,
    cancel: CancellationToken,
}

impl EdgeDaemon {
    /// Wire the stages together from `config`.
    ///
    /// Loads the persisted table map when ids are allocated.
    pub fn new(
        intent: Arc<GlobalIntent>,
        config: &DaemonConfig,
        executor: Arc<dyn CommandExecutor>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let tables = match config.reconcile.table_id_mode {
            TableIdMode::Vni => TableSource::Vni,
            TableIdMode::Allocated => TableSource::Allocated(
                TableAllocator::load(&config.paths.table_map)
                    .map_err(|e| EdgeError::Config(e.to_string()))?,
            ),
        };

        Ok(Self {
            intent,
            interval: config.interval(),
            style: config.render.vrf_stanza_style,
            reconciler: VrfReconciler::new(
                executor.clone(),
                tables,
                config.reconcile.address_prefix_len,
            ),
            writer: ConfigWriter::new(&config.paths.frr_config, &config.paths.vtysh_config),
            reloader: ReloadInvoker::new(
                executor,
                config.reload.command.clone(),
                config.reload.validate_before_reload,
            ),
            cancel,
        })
    }

    /// Run a single reconcile, render and reload pass
    #[instrument(skip(self))]
    pub async fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport::default();

        match self.reconciler.reconcile(&self.intent).await {
            Ok(summary) => report.reconciled = Some(summary),
            Err(e) => {
                error!(stage = e.stage(), "{}", e);
                report.errors.push(e);
            }
        }

        if self.cancelled(&mut report) {
            return report;
        }

        if let Err(e) = self.render_and_write() {
            error!(stage = e.stage(), "{}; skipping reload", e);
            report.errors.push(e);
            return report;
        }

        if self.cancelled(&mut report) {
            return report;
        }

        match self.reloader.reload(self.writer.config_path()).await {
            Ok(output) => {
                debug!("frr-reload output: {}", output);
                report.reloaded = true;
            }
            Err(e) => {
                error!(stage = e.stage(), "{}", e);
                report.errors.push(e);
            }
        }

        report
    }

    fn render_and_write(&self) -> Result<()> {
        let text = render(&self.intent, self.style)?;
        self.writer.write(&text)
    }

    fn cancelled(&self, report: &mut PassReport) -> bool {
        if self.cancel.is_cancelled() {
            warn!("Shutdown requested, abandoning pass");
            report.cancelled = true;
        }
        report.cancelled
    }

    /// Run one pass and report whether every stage succeeded
    pub async fn run_once(&mut self) -> bool {
        self.run_pass().await.is_success()
    }

    /// Run passes every interval until cancelled
    pub async fn run(&mut self) {
        info!(
            "Starting control loop (interval {}s, {} VRFs, {} routers)",
            self.interval.as_secs(),
            self.intent.vrfs.len(),
            self.intent.routers.len()
        );

        let mut pass: u64 = 0;
        loop {
            pass += 1;
            let report = self.run_pass().await;
            if report.is_success() {
                info!(pass, "Pass complete");
            } else if !report.cancelled {
                warn!(pass, failures = report.errors.len(), "Pass finished with errors");
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Control loop stopped after {} passes", pass);
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_cfgmgr_test::{hedge_intent, SimulatedHost};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> DaemonConfig {
        let mut config = DaemonConfig::default();
        config.paths.frr_config = dir.path().join("frr.conf");
        config.paths.vtysh_config = dir.path().join("vtysh.conf");
        config.paths.table_map = dir.path().join("vrf-tables.json");
        config
    }

    #[tokio::test]
    async fn test_successful_pass() {
        let dir = TempDir::new().unwrap();
        let host = Arc::new(SimulatedHost::new());
        let mut daemon = EdgeDaemon::new(
            Arc::new(hedge_intent()),
            &config_in(&dir),
            host.clone(),
            CancellationToken::new(),
        )
        .unwrap();

        let report = daemon.run_pass().await;

        assert!(report.is_success(), "{:?}", report.errors);
        assert!(report.reloaded);
        assert!(dir.path().join("vtysh.conf").exists());
        assert!(dir.path().join("vrf-tables.json").exists());
        host.verifier().assert_command_executed("--reload").unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_before_render() {
        let dir = TempDir::new().unwrap();
        let host = Arc::new(SimulatedHost::new());
        let token = CancellationToken::new();
        token.cancel();
        let mut daemon =
            EdgeDaemon::new(Arc::new(hedge_intent()), &config_in(&dir), host.clone(), token)
                .unwrap();

        let report = daemon.run_pass().await;

        assert!(report.cancelled);
        assert!(!report.is_success());
        assert!(!dir.path().join("frr.conf").exists());
        host.verifier().assert_command_not_executed("frr-reload").unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let dir = TempDir::new().unwrap();
        let host = Arc::new(SimulatedHost::new());
        let token = CancellationToken::new();
        let mut daemon = EdgeDaemon::new(
            Arc::new(hedge_intent()),
            &config_in(&dir),
            host.clone(),
            token.clone(),
        )
        .unwrap();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        // Would sleep 30s between passes without the token
        tokio::time::timeout(Duration::from_secs(5), daemon.run())
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(host.verifier().count_matching("--reload"), 1);
    }
}
