//! Common infrastructure for the edgecfgd configuration managers.
//!
//! - [`shell`]: Shell command execution with quoting, timeout and cancellation
//! - [`CommandExecutor`]: The seam between managers and the host
//! - [`error`]: Error types for cfgmgr operations
//!
//! # Architecture
//!
//! Managers follow this pattern:
//!
//! 1. Read the desired state from an immutable intent
//! 2. Query the kernel through `ip` commands
//! 3. Issue only the commands needed to converge
//! 4. Return the first failure to the caller, which decides what runs next
//!
//! # Example
//!
//! ```ignore
//! use edge_cfgmgr_common::{CommandExecutor, CfgMgrResult, shell::{IP_CMD, shellquote}};
//!
//! async fn set_up(exec: &dyn CommandExecutor, vrf: &str) -> CfgMgrResult<()> {
//!     let cmd = format!("{} link set {} up", IP_CMD, shellquote(vrf));
//!     exec.exec_or_throw(&cmd).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod executor;
pub mod shell;

// Re-export commonly used items at crate root
pub use error::{CfgMgrError, CfgMgrResult};
pub use executor::{CommandExecutor, ShellExecutor};
pub use shell::ExecResult;
