//! Error types for edgecfgd.
//!
//! Each variant corresponds to one stage of a reconciliation pass, so the
//! control loop can log a failure and decide which later stages still run.

use std::io;
use std::path::PathBuf;

use edge_cfgmgr_common::CfgMgrError;
use edge_types::IntentError;
use thiserror::Error;

/// Result type for edgecfgd operations
pub type Result<T> = std::result::Result<T, EdgeError>;

#[derive(Error, Debug)]
pub enum EdgeError {
    /// A kernel operation for one VRF failed; later VRFs were skipped.
    #[error("VRF '{vrf}' reconciliation failed: {source}")]
    Reconcile {
        vrf: String,
        #[source]
        source: CfgMgrError,
    },

    /// The configuration text could not be produced.
    #[error("Render failed: {0}")]
    Render(#[from] std::fmt::Error),

    /// A rendered or companion file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The reload tool rejected or failed to apply the configuration.
    #[error("FRR reload failed: {0}")]
    Reload(#[source] CfgMgrError),

    /// Daemon configuration is malformed or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Intent could not be loaded or failed validation.
    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl EdgeError {
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EdgeError::Write {
            path: path.into(),
            source,
        }
    }

    /// Stage name used in log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            EdgeError::Reconcile { .. } => "reconcile",
            EdgeError::Render(_) | EdgeError::Write { .. } => "render",
            EdgeError::Reload(_) => "reload",
            EdgeError::Config(_) | EdgeError::Intent(_) | EdgeError::Io(_) => "startup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_error_names_vrf() {
        let err = EdgeError::Reconcile {
            vrf: "hedge".to_string(),
            source: CfgMgrError::internal("No free routing tables available"),
        };
        assert!(err.to_string().starts_with("VRF 'hedge' reconciliation failed"));
        assert_eq!(err.stage(), "reconcile");
    }

    #[test]
    fn test_write_error_display() {
        let err = EdgeError::write(
            "/nonexistent/frr.conf",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to write /nonexistent/frr.conf: No such file or directory"
        );
        assert_eq!(err.stage(), "render");
    }
}
