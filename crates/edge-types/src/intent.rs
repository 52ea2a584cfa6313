//! Intent model: the desired state of the edge node.
//!
//! The TOML shape mirrors the structs one to one:
//!
//! ```toml
//! asn = 64512
//! log_level = "debugging"
//!
//! [[vrf]]
//! name = "hedge"
//! vni = 100
//! static_routes = [{ destination = "0.0.0.0/0", next_hop = "192.168.1.3" }]
//!
//! [[router]]
//! vrf = "hedge"
//! router_id = "192.168.1.1"
//!
//! [[router.peer]]
//! address = "192.168.1.2"
//! remote_as = 64513
//! description = "hedge's friend"
//! ```
//!
//! Every list keeps declaration order; nothing here sorts or deduplicates.

use crate::bgp::{Action, Asn, LogLevel, RemoteAs};
use crate::ip::IpPrefix;
use crate::validate::IntentError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Hostname rendered when the intent does not set one.
pub const DEFAULT_HOSTNAME: &str = "frr-k8s";

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

/// Root of the intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalIntent {
    /// Local AS number used by every `router bgp` instance.
    pub asn: Asn,

    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default, rename = "router")]
    pub routers: Vec<Router>,

    #[serde(default, rename = "vrf")]
    pub vrfs: Vec<Vrf>,

    #[serde(default, rename = "prefix_list")]
    pub prefix_lists: Vec<PrefixListEntry>,

    #[serde(default, rename = "route_map")]
    pub route_maps: Vec<RouteMapEntry>,

    #[serde(default, rename = "evpn")]
    pub evpns: Vec<EvpnInstance>,
}

/// A BGP routing instance, either global or scoped to one VRF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Router {
    /// VRF scope; `None` or empty selects the default instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,

    /// BGP router-id. Also assigned to the VRF device by the reconciler.
    pub router_id: Ipv4Addr,

    #[serde(default, rename = "peer")]
    pub peers: Vec<Peer>,
}

impl Router {
    /// VRF scope with the empty string folded into the default instance.
    pub fn vrf_name(&self) -> Option<&str> {
        self.vrf.as_deref().filter(|name| !name.is_empty())
    }
}

/// A BGP neighbor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Peer {
    pub address: IpAddr,

    pub remote_as: RemoteAs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map_in: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map_out: Option<String>,

    /// Marks an EVPN-facing underlay session.
    #[serde(default)]
    pub fabric: bool,
}

impl Peer {
    /// Creates a plain neighbor with no policy, secret or description.
    pub fn new(address: IpAddr, remote_as: RemoteAs) -> Self {
        Self {
            address,
            remote_as,
            password: None,
            description: None,
            route_map_in: None,
            route_map_out: None,
            fabric: false,
        }
    }

    /// Password to render, if any. Empty strings count as absent.
    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }

    pub fn route_map_in(&self) -> Option<&str> {
        non_empty(self.route_map_in.as_deref())
    }

    pub fn route_map_out(&self) -> Option<&str> {
        non_empty(self.route_map_out.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A VRF device and its EVPN segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vrf {
    pub name: String,

    /// VXLAN network identifier of the L3 segment.
    pub vni: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_routes: Vec<StaticRoute>,
}

impl Vrf {
    pub fn new(name: impl Into<String>, vni: u32) -> Self {
        Self {
            name: name.into(),
            vni,
            static_routes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticRoute {
    pub destination: IpPrefix,
    pub next_hop: IpAddr,
}

/// One `ip prefix-list` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrefixListEntry {
    pub name: String,
    pub seq: u32,
    pub action: Action,
    pub prefix: IpPrefix,
}

/// One `route-map` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteMapEntry {
    pub name: String,
    pub action: Action,
    pub seq: u32,

    /// Prefix-list matched by this entry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_list: Option<String>,
}

/// A VRF that gets a dedicated EVPN `advertise ipv4 unicast` instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvpnInstance {
    pub vrf: String,
}

impl GlobalIntent {
    /// Creates an empty intent for the given AS.
    pub fn new(asn: Asn) -> Self {
        Self {
            asn,
            hostname: default_hostname(),
            log_level: LogLevel::default(),
            routers: Vec::new(),
            vrfs: Vec::new(),
            prefix_lists: Vec::new(),
            route_maps: Vec::new(),
            evpns: Vec::new(),
        }
    }

    /// Parses and validates an intent document.
    ///
    /// The returned value has passed [`GlobalIntent::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self, IntentError> {
        let intent: GlobalIntent = toml::from_str(content)?;
        intent.validate()?;
        Ok(intent)
    }

    /// First router scoped to `vrf`, if any.
    pub fn router_for_vrf(&self, vrf: &str) -> Option<&Router> {
        self.routers.iter().find(|r| r.vrf_name() == Some(vrf))
    }

    pub fn vrf(&self, name: &str) -> Option<&Vrf> {
        self.vrfs.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
asn = 64512
log_level = "debug"

[[router]]
router_id = "172.30.1.5"

[[router.peer]]
address = "172.30.1.1"
remote_as = "64513"
description = "spine1"
fabric = true

[[router]]
vrf = "hedge"
router_id = "192.168.1.1"

[[router.peer]]
address = "192.168.1.2"
remote_as = 64513
description = "hedge's friend"

[[router.peer]]
address = "192.168.1.3"
remote_as = 64514
password = "nothedge"

[[vrf]]
name = "hedge"
vni = 100
static_routes = [{ destination = "0.0.0.0/0", next_hop = "192.168.1.3" }]

[[vrf]]
name = "hog"
vni = 200

[[prefix_list]]
name = "test"
seq = 10
action = "permit"
prefix = "10.10.0.0/16"

[[route_map]]
name = "test"
action = "permit"
seq = 10
prefix_list = "test"

[[evpn]]
vrf = "hedge"
"#;

    #[test]
    fn test_parse_sample() {
        let intent = GlobalIntent::from_toml_str(SAMPLE).unwrap();

        assert_eq!(intent.asn, Asn(64512));
        assert_eq!(intent.hostname, DEFAULT_HOSTNAME);
        assert_eq!(intent.log_level, LogLevel::Debugging);
        assert_eq!(intent.routers.len(), 2);
        assert_eq!(intent.routers[0].vrf_name(), None);
        assert_eq!(intent.routers[1].vrf_name(), Some("hedge"));
        assert_eq!(intent.routers[1].peers[1].password(), Some("nothedge"));
        assert!(intent.routers[0].peers[0].fabric);
        assert_eq!(intent.vrfs[0].static_routes.len(), 1);
        assert_eq!(intent.evpns[0].vrf, "hedge");
    }

    #[test]
    fn test_router_for_vrf_picks_first_match() {
        let intent = GlobalIntent::from_toml_str(SAMPLE).unwrap();

        let router = intent.router_for_vrf("hedge").unwrap();
        assert_eq!(router.router_id, Ipv4Addr::new(192, 168, 1, 1));
        assert!(intent.router_for_vrf("hog").is_none());
    }

    #[test]
    fn test_empty_vrf_is_default_instance() {
        let router = Router {
            vrf: Some(String::new()),
            router_id: Ipv4Addr::new(10, 0, 0, 1),
            peers: Vec::new(),
        };
        assert_eq!(router.vrf_name(), None);
    }

    #[test]
    fn test_empty_optional_strings_are_absent() {
        let mut peer = Peer::new("10.0.0.2".parse().unwrap(), RemoteAs::External);
        peer.password = Some(String::new());
        peer.description = Some(String::new());

        assert_eq!(peer.password(), None);
        assert_eq!(peer.description(), None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = GlobalIntent::from_toml_str("asn = 1\nbogus = true").unwrap_err();
        assert!(matches!(err, IntentError::Parse(_)));
    }
}
