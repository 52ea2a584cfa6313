//! Simulated host for exercising managers without touching the kernel.
//!
//! [`SimulatedHost`] understands the `ip` invocations the VRF reconciler
//! issues and keeps a small model of links and their IPv4 addresses, so a
//! second pass sees the effects of the first. Every command is recorded;
//! commands it does not model (the FRR reload tool, for instance) succeed
//! with empty output.

use std::collections::BTreeMap;

use async_trait::async_trait;
use edge_cfgmgr_common::{CfgMgrResult, CommandExecutor, ExecResult};
use parking_lot::Mutex;

use crate::verification::CommandVerifier;

/// A kernel link as seen by the simulated host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimLink {
    /// Routing table the VRF is bound to.
    pub table: Option<u32>,
    /// Administrative state.
    pub up: bool,
    /// IPv4 addresses in CIDR form, in assignment order.
    pub addresses: Vec<String>,
}

#[derive(Debug, Default)]
struct HostState {
    links: BTreeMap<String, SimLink>,
    commands: Vec<String>,
    failures: Vec<String>,
}

/// In-memory stand-in for the host network stack.
#[derive(Debug, Default)]
pub struct SimulatedHost {
    state: Mutex<HostState>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-creates a VRF link, e.g. one left over from a previous run.
    pub fn with_link(self, name: &str, table: u32, addresses: &[&str]) -> Self {
        self.state.lock().links.insert(
            name.to_string(),
            SimLink {
                table: Some(table),
                up: false,
                addresses: addresses.iter().map(|a| a.to_string()).collect(),
            },
        );
        self
    }

    /// Makes every command containing `pattern` exit non-zero.
    pub fn fail_on(&self, pattern: &str) {
        self.state.lock().failures.push(pattern.to_string());
    }

    /// Snapshot of a link.
    pub fn link(&self, name: &str) -> Option<SimLink> {
        self.state.lock().links.get(name).cloned()
    }

    /// All commands received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    /// Forgets recorded commands but keeps link state.
    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }

    /// Verifier over the commands recorded so far.
    pub fn verifier(&self) -> CommandVerifier {
        CommandVerifier::new(self.commands())
    }

    fn apply(state: &mut HostState, cmd: &str) -> ExecResult {
        if state.failures.iter().any(|p| cmd.contains(p.as_str())) {
            return ExecResult::failed(2, "RTNETLINK answers: Operation not permitted");
        }

        let tokens: Vec<&str> = cmd
            .split_whitespace()
            .map(|t| t.trim_matches('"'))
            .collect();
        if tokens.first().map_or(true, |t| !t.ends_with("/ip")) {
            return ExecResult::ok("");
        }

        match tokens[1..] {
            ["link", "show", name] => match state.links.get(name) {
                Some(link) => ExecResult::ok(format!(
                    "7: {}: <NOARP,MASTER{}> mtu 65575 qdisc noqueue state {}",
                    name,
                    if link.up { ",UP,LOWER_UP" } else { "" },
                    if link.up { "UP" } else { "DOWN" }
                )),
                None => ExecResult::failed(1, format!("Device \"{}\" does not exist.", name)),
            },
            ["link", "add", name, "type", "vrf", "table", table] => {
                if state.links.contains_key(name) {
                    return ExecResult::failed(2, "RTNETLINK answers: File exists");
                }
                state.links.insert(
                    name.to_string(),
                    SimLink {
                        table: table.parse().ok(),
                        ..SimLink::default()
                    },
                );
                ExecResult::ok("")
            }
            ["link", "set", name, "up"] => match state.links.get_mut(name) {
                Some(link) => {
                    link.up = true;
                    ExecResult::ok("")
                }
                None => ExecResult::failed(1, format!("Cannot find device \"{}\"", name)),
            },
            ["-4", "-o", "addr", "show", "dev", name] => match state.links.get(name) {
                Some(link) => ExecResult::ok(
                    link.addresses
                        .iter()
                        .map(|a| {
                            format!(
                                "7: {}    inet {} scope global {}\\       valid_lft forever preferred_lft forever",
                                name, a, name
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                None => ExecResult::failed(1, format!("Device \"{}\" does not exist.", name)),
            },
            ["addr", "add", addr, "dev", name] => match state.links.get_mut(name) {
                Some(link) if link.addresses.iter().any(|a| a == addr) => {
                    ExecResult::failed(2, "RTNETLINK answers: File exists")
                }
                Some(link) => {
                    link.addresses.push(addr.to_string());
                    ExecResult::ok("")
                }
                None => ExecResult::failed(1, format!("Cannot find device \"{}\"", name)),
            },
            ["addr", "del", addr, "dev", name] => match state.links.get_mut(name) {
                Some(link) if link.addresses.iter().any(|a| a == addr) => {
                    link.addresses.retain(|a| a != addr);
                    ExecResult::ok("")
                }
                Some(_) => ExecResult::failed(2, "RTNETLINK answers: Cannot assign requested address"),
                None => ExecResult::failed(1, format!("Cannot find device \"{}\"", name)),
            },
            _ => ExecResult::ok(""),
        }
    }
}

#[async_trait]
impl CommandExecutor for SimulatedHost {
    async fn exec(&self, cmd: &str) -> CfgMgrResult<ExecResult> {
        let mut state = self.state.lock();
        state.commands.push(cmd.to_string());
        let result = Self::apply(&mut state, cmd);
        tracing::trace!(command = %cmd, exit_code = result.exit_code, "Simulated command");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_link_lifecycle() {
        let host = SimulatedHost::new();

        assert!(!host.exec("/sbin/ip link show \"hedge\"").await.unwrap().success());

        host.exec_or_throw("/sbin/ip link add \"hedge\" type vrf table 1001")
            .await
            .unwrap();
        host.exec_or_throw("/sbin/ip link set \"hedge\" up").await.unwrap();

        let link = host.link("hedge").unwrap();
        assert_eq!(link.table, Some(1001));
        assert!(link.up);
        assert!(host.exec("/sbin/ip link show \"hedge\"").await.unwrap().success());
    }

    #[tokio::test]
    async fn test_address_listing() {
        let host = SimulatedHost::new().with_link("hog", 200, &["192.168.2.1/24"]);

        host.exec_or_throw("/sbin/ip addr add \"10.0.0.1/24\" dev \"hog\"")
            .await
            .unwrap();
        let out = host
            .exec_or_throw("/sbin/ip -4 -o addr show dev \"hog\"")
            .await
            .unwrap();

        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("inet 10.0.0.1/24"));
    }

    #[tokio::test]
    async fn test_failure_pattern() {
        let host = SimulatedHost::new();
        host.fail_on("frr-reload.py");

        let result = host
            .exec("\"/usr/lib/frr/frr-reload.py\" --reload --overwrite \"/etc/frr/frr.conf\"")
            .await
            .unwrap();
        assert!(!result.success());
        assert_eq!(host.commands().len(), 1);
    }
}
