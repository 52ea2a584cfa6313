//! Cross-reference validation of an intent.
//!
//! Runs once after parsing and before anything touches the kernel or the
//! routing daemon. Each failure names the offending object so the operator
//! can find it in the intent file.

use crate::intent::{GlobalIntent, Peer, Router};
use std::collections::HashSet;
use std::net::IpAddr;
use thiserror::Error;

/// Largest value a 24-bit VXLAN network identifier can hold.
pub const MAX_VNI: u32 = 0x00FF_FFFF;

/// Highest sequence number FRR accepts on a route-map entry.
pub const MAX_ROUTE_MAP_SEQ: u32 = 65_535;

/// Errors produced while loading or validating an intent.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("failed to parse intent: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("AS number 0 is reserved")]
    ReservedAsn,

    #[error("invalid {field} '{value}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("VRF '{vrf}' has VNI {vni} outside 1-{max}", max = MAX_VNI)]
    InvalidVni { vrf: String, vni: u32 },

    #[error("VRF '{0}' is declared more than once")]
    DuplicateVrf(String),

    #[error("static route {destination} in VRF '{vrf}' mixes address families with next hop {next_hop}")]
    StaticRouteFamily {
        vrf: String,
        destination: String,
        next_hop: IpAddr,
    },

    #[error("static route {destination} in VRF '{vrf}' is not IPv4; only IPv4 routes are rendered")]
    UnsupportedRouteFamily { vrf: String, destination: String },

    #[error("prefix-list '{name}' seq {seq} matches {prefix}, which is not IPv4")]
    PrefixListFamily {
        name: String,
        seq: u32,
        prefix: String,
    },

    #[error("{kind} '{name}' has seq {seq} outside 1-{max}")]
    SequenceOutOfRange {
        kind: &'static str,
        name: String,
        seq: u32,
        max: u32,
    },

    #[error("{kind} '{name}' uses seq {seq} more than once")]
    DuplicateSequence {
        kind: &'static str,
        name: String,
        seq: u32,
    },

    #[error("route-map '{route_map}' references unknown prefix-list '{prefix_list}'")]
    UnknownPrefixList {
        route_map: String,
        prefix_list: String,
    },

    #[error("{referrer} references unknown VRF '{vrf}'")]
    UnknownVrf { referrer: String, vrf: String },

    #[error("more than one router declared for {scope}")]
    DuplicateRouter { scope: String },

    #[error("neighbor {peer} in {scope} is declared more than once")]
    DuplicatePeer { scope: String, peer: IpAddr },

    #[error("neighbor {peer} in {scope} references unknown route-map '{route_map}'")]
    UnknownRouteMap {
        scope: String,
        peer: IpAddr,
        route_map: String,
    },

    #[error("EVPN instance for VRF '{0}' is declared more than once")]
    DuplicateEvpn(String),
}

impl GlobalIntent {
    /// Checks every invariant the reconciler and renderer rely on.
    ///
    /// Returns the first violation found. Declaration order is not
    /// changed and nothing is normalized.
    pub fn validate(&self) -> Result<(), IntentError> {
        if self.asn.value() == 0 {
            return Err(IntentError::ReservedAsn);
        }
        check_token("hostname", &self.hostname)?;

        let vrf_names = self.validate_vrfs()?;
        let prefix_lists = self.validate_prefix_lists()?;
        let route_maps = self.validate_route_maps(&prefix_lists)?;

        let mut scopes = HashSet::new();
        for router in &self.routers {
            let scope = scope_label(router);
            if let Some(vrf) = router.vrf_name() {
                if !vrf_names.contains(vrf) {
                    return Err(IntentError::UnknownVrf {
                        referrer: format!("router {}", router.router_id),
                        vrf: vrf.to_string(),
                    });
                }
            }
            if !scopes.insert(router.vrf_name()) {
                return Err(IntentError::DuplicateRouter { scope });
            }

            let mut peers = HashSet::new();
            for peer in &router.peers {
                if !peers.insert(peer.address) {
                    return Err(IntentError::DuplicatePeer {
                        scope,
                        peer: peer.address,
                    });
                }
                validate_peer(peer, &scope, &route_maps)?;
            }
        }

        let mut evpns = HashSet::new();
        for evpn in &self.evpns {
            if !vrf_names.contains(evpn.vrf.as_str()) {
                return Err(IntentError::UnknownVrf {
                    referrer: "evpn instance".to_string(),
                    vrf: evpn.vrf.clone(),
                });
            }
            if !evpns.insert(evpn.vrf.as_str()) {
                return Err(IntentError::DuplicateEvpn(evpn.vrf.clone()));
            }
        }

        Ok(())
    }

    fn validate_vrfs(&self) -> Result<HashSet<&str>, IntentError> {
        let mut names = HashSet::new();
        for vrf in &self.vrfs {
            check_token("VRF name", &vrf.name)?;
            if vrf.vni == 0 || vrf.vni > MAX_VNI {
                return Err(IntentError::InvalidVni {
                    vrf: vrf.name.clone(),
                    vni: vrf.vni,
                });
            }
            if !names.insert(vrf.name.as_str()) {
                return Err(IntentError::DuplicateVrf(vrf.name.clone()));
            }
            for route in &vrf.static_routes {
                if route.destination.is_ipv4() != route.next_hop.is_ipv4() {
                    return Err(IntentError::StaticRouteFamily {
                        vrf: vrf.name.clone(),
                        destination: route.destination.to_string(),
                        next_hop: route.next_hop,
                    });
                }
                if !route.destination.is_ipv4() {
                    return Err(IntentError::UnsupportedRouteFamily {
                        vrf: vrf.name.clone(),
                        destination: route.destination.to_string(),
                    });
                }
            }
        }
        Ok(names)
    }

    fn validate_prefix_lists(&self) -> Result<HashSet<&str>, IntentError> {
        let mut names = HashSet::new();
        let mut seqs = HashSet::new();
        for entry in &self.prefix_lists {
            check_token("prefix-list name", &entry.name)?;
            check_seq("prefix-list", &entry.name, entry.seq, u32::MAX)?;
            if !entry.prefix.is_ipv4() {
                return Err(IntentError::PrefixListFamily {
                    name: entry.name.clone(),
                    seq: entry.seq,
                    prefix: entry.prefix.to_string(),
                });
            }
            if !seqs.insert((entry.name.as_str(), entry.seq)) {
                return Err(IntentError::DuplicateSequence {
                    kind: "prefix-list",
                    name: entry.name.clone(),
                    seq: entry.seq,
                });
            }
            names.insert(entry.name.as_str());
        }
        Ok(names)
    }

    fn validate_route_maps(
        &self,
        prefix_lists: &HashSet<&str>,
    ) -> Result<HashSet<&str>, IntentError> {
        let mut names = HashSet::new();
        let mut seqs = HashSet::new();
        for entry in &self.route_maps {
            check_token("route-map name", &entry.name)?;
            check_seq("route-map", &entry.name, entry.seq, MAX_ROUTE_MAP_SEQ)?;
            if !seqs.insert((entry.name.as_str(), entry.seq)) {
                return Err(IntentError::DuplicateSequence {
                    kind: "route-map",
                    name: entry.name.clone(),
                    seq: entry.seq,
                });
            }
            if let Some(list) = entry.prefix_list.as_deref().filter(|l| !l.is_empty()) {
                if !prefix_lists.contains(list) {
                    return Err(IntentError::UnknownPrefixList {
                        route_map: entry.name.clone(),
                        prefix_list: list.to_string(),
                    });
                }
            }
            names.insert(entry.name.as_str());
        }
        Ok(names)
    }
}

fn validate_peer(peer: &Peer, scope: &str, route_maps: &HashSet<&str>) -> Result<(), IntentError> {
    for route_map in [peer.route_map_in(), peer.route_map_out()].into_iter().flatten() {
        if !route_maps.contains(route_map) {
            return Err(IntentError::UnknownRouteMap {
                scope: scope.to_string(),
                peer: peer.address,
                route_map: route_map.to_string(),
            });
        }
    }
    if let Some(password) = peer.password() {
        check_token("neighbor password", password)?;
    }
    if let Some(description) = peer.description() {
        if description.contains(['"', '\n', '\r']) {
            return Err(IntentError::InvalidValue {
                field: "neighbor description",
                value: description.to_string(),
                reason: "must not contain quotes or line breaks",
            });
        }
    }
    Ok(())
}

/// Names and secrets are emitted as bare words, so they must be one token.
fn check_token(field: &'static str, value: &str) -> Result<(), IntentError> {
    if value.is_empty() {
        return Err(IntentError::InvalidValue {
            field,
            value: value.to_string(),
            reason: "must not be empty",
        });
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control() || c == '"') {
        return Err(IntentError::InvalidValue {
            field,
            value: value.to_string(),
            reason: "must be a single word without quotes",
        });
    }
    Ok(())
}

fn check_seq(kind: &'static str, name: &str, seq: u32, max: u32) -> Result<(), IntentError> {
    if seq == 0 || seq > max {
        return Err(IntentError::SequenceOutOfRange {
            kind,
            name: name.to_string(),
            seq,
            max,
        });
    }
    Ok(())
}

fn scope_label(router: &Router) -> String {
    match router.vrf_name() {
        Some(vrf) => format!("VRF '{}'", vrf),
        None => "the default instance".to_string(),
    }
}
