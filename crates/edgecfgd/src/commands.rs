//! Shell command builders for VRF and reload operations

use std::path::Path;

use edge_cfgmgr_common::shell::{self, shellquote};
use edge_types::IpPrefix;
use tracing::warn;

/// Build link existence query
pub fn build_show_link_cmd(vrf_name: &str) -> String {
    format!("{} link show {}", shell::IP_CMD, shellquote(vrf_name))
}

/// Build VRF creation command
///
/// Creates a VRF device bound to the given routing table
pub fn build_add_vrf_cmd(vrf_name: &str, table_id: u32) -> String {
    format!(
        "{} link add {} type vrf table {}",
        shell::IP_CMD,
        shellquote(vrf_name),
        table_id
    )
}

/// Build VRF bring-up command
pub fn build_set_vrf_up_cmd(vrf_name: &str) -> String {
    format!("{} link set {} up", shell::IP_CMD, shellquote(vrf_name))
}

/// Build IPv4 address listing command (one line per address)
pub fn build_show_addr_cmd(vrf_name: &str) -> String {
    format!(
        "{} -4 -o addr show dev {}",
        shell::IP_CMD,
        shellquote(vrf_name)
    )
}

/// Build address assignment command
pub fn build_add_addr_cmd(vrf_name: &str, addr: &IpPrefix) -> String {
    format!(
        "{} addr add {} dev {}",
        shell::IP_CMD,
        shellquote(&addr.to_string()),
        shellquote(vrf_name)
    )
}

/// Build address removal command
pub fn build_del_addr_cmd(vrf_name: &str, addr: &IpPrefix) -> String {
    format!(
        "{} addr del {} dev {}",
        shell::IP_CMD,
        shellquote(&addr.to_string()),
        shellquote(vrf_name)
    )
}

/// Build frr-reload invocation that replaces the running configuration
pub fn build_reload_cmd(tool: &str, config: &Path) -> String {
    format!(
        "{} --reload --overwrite {}",
        shellquote(tool),
        shellquote(&config.display().to_string())
    )
}

/// Build frr-reload dry run
pub fn build_reload_test_cmd(tool: &str, config: &Path) -> String {
    format!(
        "{} --test {}",
        shellquote(tool),
        shellquote(&config.display().to_string())
    )
}

/// Parse `ip -4 -o addr show` output into interface addresses
///
/// Each line looks like
/// `7: hedge    inet 192.168.1.1/24 scope global hedge\       valid_lft ...`
pub fn parse_ipv4_addrs(output: &str) -> Vec<IpPrefix> {
    output
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            tokens.find(|t| *t == "inet")?;
            let raw = tokens.next()?;
            match raw.parse::<IpPrefix>() {
                Ok(prefix) => Some(prefix),
                Err(e) => {
                    warn!("Ignoring unparsable address '{}': {}", raw, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_show_link_cmd() {
        assert_eq!(build_show_link_cmd("hedge"), "/sbin/ip link show \"hedge\"");
    }

    #[test]
    fn test_build_add_vrf_cmd() {
        let cmd = build_add_vrf_cmd("hedge", 1001);
        assert_eq!(cmd, "/sbin/ip link add \"hedge\" type vrf table 1001");
    }

    #[test]
    fn test_build_set_vrf_up_cmd() {
        assert_eq!(build_set_vrf_up_cmd("hog"), "/sbin/ip link set \"hog\" up");
    }

    #[test]
    fn test_build_addr_cmds() {
        let addr: IpPrefix = "192.168.1.1/24".parse().unwrap();
        assert_eq!(
            build_add_addr_cmd("hedge", &addr),
            "/sbin/ip addr add \"192.168.1.1/24\" dev \"hedge\""
        );
        assert_eq!(
            build_del_addr_cmd("hedge", &addr),
            "/sbin/ip addr del \"192.168.1.1/24\" dev \"hedge\""
        );
        assert_eq!(
            build_show_addr_cmd("hedge"),
            "/sbin/ip -4 -o addr show dev \"hedge\""
        );
    }

    #[test]
    fn test_build_reload_cmds() {
        let path = Path::new("/etc/frr/frr.conf");
        assert_eq!(
            build_reload_cmd("/usr/lib/frr/frr-reload.py", path),
            "\"/usr/lib/frr/frr-reload.py\" --reload --overwrite \"/etc/frr/frr.conf\""
        );
        assert_eq!(
            build_reload_test_cmd("/usr/lib/frr/frr-reload.py", path),
            "\"/usr/lib/frr/frr-reload.py\" --test \"/etc/frr/frr.conf\""
        );
    }

    #[test]
    fn test_shellquote_safety() {
        let cmd = build_add_vrf_cmd("Vrf'; rm -rf /", 1001);
        // Should be quoted to prevent injection
        assert!(cmd.contains("\"Vrf'; rm -rf /\""));
    }

    #[test]
    fn test_parse_ipv4_addrs() {
        let output = "7: hedge    inet 192.168.1.1/24 scope global hedge\\       valid_lft forever preferred_lft forever\n\
                      7: hedge    inet 10.0.0.9/32 scope global hedge\\       valid_lft forever preferred_lft forever";
        let addrs = parse_ipv4_addrs(output);
        assert_eq!(
            addrs,
            vec![
                "192.168.1.1/24".parse::<IpPrefix>().unwrap(),
                "10.0.0.9/32".parse().unwrap()
            ]
        );
    }

    #[test]
    fn test_parse_ipv4_addrs_empty() {
        assert!(parse_ipv4_addrs("").is_empty());
        assert!(parse_ipv4_addrs("garbage line").is_empty());
    }
}
