//! Shell command execution utilities.
//!
//! Commands are run through `/bin/sh -c` with every dynamic argument
//! wrapped by [`shellquote`]. Each invocation is bounded by a timeout and can
//! be abandoned through a [`CancellationToken`]; in both cases the child is
//! killed.
//!
//! # Example
//!
//! ```ignore
//! use edge_cfgmgr_common::shell::{self, IP_CMD, shellquote};
//!
//! let cmd = format!("{} link set {} up", IP_CMD, shellquote("hedge"));
//! let result = shell::exec(&cmd, Duration::from_secs(10), &token).await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::{CfgMgrError, CfgMgrResult};

/// Path to the `ip` command for network interface configuration.
pub const IP_CMD: &str = "/sbin/ip";

/// Shell used to interpret command strings.
pub const SH_CMD: &str = "/bin/sh";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// Wraps the string in double quotes and escapes `$`, `` ` ``, `"`, `\`
/// and newline.
///
/// # Example
///
/// ```
/// use edge_cfgmgr_common::shell::shellquote;
///
/// assert_eq!(shellquote("hedge"), "\"hedge\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// The stdout output.
    pub stdout: String,
    /// The stderr output.
    pub stderr: String,
}

impl ExecResult {
    /// A successful result carrying `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result carrying `stderr`.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Converts a non-zero exit into [`CfgMgrError::ShellCommandFailed`].
    pub fn into_stdout(self, cmd: &str) -> CfgMgrResult<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(CfgMgrError::ShellCommandFailed {
                command: cmd.to_string(),
                exit_code: self.exit_code,
                output: self.combined_output(),
            })
        }
    }
}

/// Executes a shell command asynchronously.
///
/// The child is killed when `timeout` elapses or `cancel` fires first.
///
/// # Returns
///
/// * `Ok(ExecResult)` - The command ran to completion (any exit code)
/// * `Err(CfgMgrError)` - Spawn failure, timeout or cancellation
pub async fn exec(
    cmd: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> CfgMgrResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let child = Command::new(SH_CMD)
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::select! {
        _ = cancel.cancelled() => {
            return Err(CfgMgrError::Cancelled {
                command: cmd.to_string(),
            });
        }
        res = tokio::time::timeout(timeout, child) => match res {
            Ok(output) => output.map_err(|e| CfgMgrError::ShellExec {
                command: cmd.to_string(),
                source: e,
            })?,
            Err(_) => {
                tracing::warn!(command = %cmd, ?timeout, "Command timed out");
                return Err(CfgMgrError::ShellTimeout {
                    command: cmd.to_string(),
                    timeout,
                });
            }
        },
    };

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, exit_code = exit_code, "Command succeeded");
    } else {
        tracing::debug!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command exited non-zero"
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_shellquote_simple() {
        assert_eq!(shellquote("hedge"), "\"hedge\"");
        assert_eq!(shellquote("192.168.1.1/24"), "\"192.168.1.1/24\"");
    }

    #[test]
    fn test_shellquote_special_chars() {
        assert_eq!(shellquote("$HOME"), "\"\\$HOME\"");
        assert_eq!(shellquote("`whoami`"), "\"\\`whoami\\`\"");
        assert_eq!(shellquote("say \"hello\""), "\"say \\\"hello\\\"\"");
        assert_eq!(shellquote("path\\to"), "\"path\\\\to\"");
        assert_eq!(shellquote("line1\nline2"), "\"line1\\\nline2\"");
    }

    #[test]
    fn test_shellquote_empty() {
        assert_eq!(shellquote(""), "\"\"");
    }

    #[test]
    fn test_exec_result_combined() {
        let result = ExecResult {
            exit_code: 0,
            stdout: "stdout".to_string(),
            stderr: "stderr".to_string(),
        };
        assert_eq!(result.combined_output(), "stdout\nstderr");
        assert_eq!(ExecResult::failed(1, "boom").combined_output(), "boom");
    }

    #[test]
    fn test_into_stdout() {
        assert_eq!(ExecResult::ok("up").into_stdout("x").unwrap(), "up");

        match ExecResult::failed(2, "Cannot find device").into_stdout("ip link set") {
            Err(CfgMgrError::ShellCommandFailed {
                exit_code, output, ..
            }) => {
                assert_eq!(exit_code, 2);
                assert_eq!(output, "Cannot find device");
            }
            other => panic!("Expected ShellCommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exec_echo() {
        let token = CancellationToken::new();
        let result = exec("echo hello", LIMIT, &token).await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "hello");
    }

    #[tokio::test]
    async fn test_exec_failure() {
        let token = CancellationToken::new();
        let result = exec("exit 42", LIMIT, &token).await.unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, 42);
    }

    #[tokio::test]
    async fn test_exec_timeout() {
        let token = CancellationToken::new();
        let result = exec("sleep 5", Duration::from_millis(50), &token).await;
        assert!(matches!(result, Err(CfgMgrError::ShellTimeout { .. })));
    }

    #[tokio::test]
    async fn test_exec_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let result = exec("sleep 5", LIMIT, &token).await;
        assert!(matches!(result, Err(CfgMgrError::Cancelled { .. })));
    }
}
