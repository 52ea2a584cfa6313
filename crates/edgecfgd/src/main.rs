//! edgecfgd - fabric-edge configuration daemon
//!
//! Loads the intent once, then reconciles VRFs, renders frr.conf and
//! reloads FRR every interval until SIGINT or SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use edge_cfgmgr_common::ShellExecutor;
use edgecfgd::config::{DEFAULT_CONFIG_PATH, DEFAULT_INTENT_PATH};
use edgecfgd::{load_intent, DaemonConfig, EdgeDaemon};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// BGP/EVPN fabric-edge configuration daemon
#[derive(Parser, Debug)]
#[command(name = "edgecfgd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Daemon configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Intent file describing the node
    #[arg(short = 'i', long, default_value = DEFAULT_INTENT_PATH)]
    intent: PathBuf,

    /// Run a single pass and exit; non-zero status if any stage failed
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting edgecfgd ---");

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("edgecfgd: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = DaemonConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let intent = Arc::new(
        load_intent(&args.intent).with_context(|| format!("loading {}", args.intent.display()))?,
    );
    info!(
        "Loaded intent for AS {} ({} VRFs, {} routers, {} EVPN instances)",
        intent.asn,
        intent.vrfs.len(),
        intent.routers.len(),
        intent.evpns.len()
    );

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let executor = Arc::new(ShellExecutor::new(config.command_timeout(), cancel.clone()));
    let mut daemon = EdgeDaemon::new(intent, &config, executor, cancel)?;

    if args.once {
        let ok = daemon.run_once().await;
        return Ok(if ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    daemon.run().await;
    info!("edgecfgd: Graceful shutdown complete");
    Ok(ExitCode::SUCCESS)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();
}

/// Cancel `token` on SIGINT or SIGTERM
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("edgecfgd: Received SIGINT"),
                        _ = sigterm.recv() => info!("edgecfgd: Received SIGTERM"),
                    }
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    let _ = ctrl_c.await;
                    info!("edgecfgd: Received SIGINT");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("edgecfgd: Received SIGINT");
        }

        token.cancel();
    });
}
