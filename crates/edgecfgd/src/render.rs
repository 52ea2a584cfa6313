//! FRR configuration renderer
//!
//! Turns a [`GlobalIntent`] into the text `frr-reload.py` applies. Output
//! follows declaration order everywhere and never sorts or deduplicates, so
//! the same intent always renders to the same bytes.
//!
//! Layout, top to bottom:
//!
//! 1. header (`frr defaults`, `hostname`, `log syslog`)
//! 2. one `vrf` stanza per VRF
//! 3. `ip prefix-list` lines
//! 4. `route-map` entries
//! 5. one `router bgp` instance per router, peers inside
//! 6. one EVPN `router bgp ... vrf` instance per EVPN entry

use std::fmt::{self, Write};

use edge_types::{GlobalIntent, Peer, Router, Vrf};
use serde::{Deserialize, Serialize};

/// How `vrf` stanzas are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VrfStanzaStyle {
    /// Static routes inline under `vrf` / `exit-vrf`.
    #[default]
    StaticRoutes,
    /// A single `vni` line binding the VRF to its L3 VNI.
    Vni,
}

/// Router-level knobs emitted for every BGP instance.
const ROUTER_DEFAULTS: &[&str] = &[
    "bgp log-neighbor-changes",
    "bgp graceful-restart",
    "no bgp ebgp-requires-policy",
    "no bgp network import-check",
    "no bgp default ipv4-unicast",
];

/// Render the complete FRR configuration for `intent`.
pub fn render(intent: &GlobalIntent, style: VrfStanzaStyle) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "frr defaults traditional")?;
    writeln!(out, "hostname {}", intent.hostname)?;
    writeln!(out, "log syslog {}", intent.log_level)?;
    writeln!(out, "!")?;

    for vrf in &intent.vrfs {
        render_vrf(&mut out, vrf, style)?;
    }

    for entry in &intent.prefix_lists {
        writeln!(
            out,
            "ip prefix-list {} seq {} {} {}",
            entry.name, entry.seq, entry.action, entry.prefix
        )?;
    }
    if !intent.prefix_lists.is_empty() {
        writeln!(out, "!")?;
    }

    for entry in &intent.route_maps {
        writeln!(out, "route-map {} {} {}", entry.name, entry.action, entry.seq)?;
        if let Some(prefix_list) = entry.prefix_list.as_deref().filter(|p| !p.is_empty()) {
            writeln!(out, " match ip address {}", prefix_list)?;
        }
        writeln!(out, " exit")?;
        writeln!(out, "!")?;
    }

    for router in &intent.routers {
        render_router(&mut out, intent, router)?;
    }

    for evpn in &intent.evpns {
        writeln!(out, "router bgp {} vrf {}", intent.asn, evpn.vrf)?;
        writeln!(out, " address-family l2vpn evpn")?;
        writeln!(out, "  advertise ipv4 unicast")?;
        writeln!(out, " exit-address-family")?;
        writeln!(out, "exit")?;
        writeln!(out, "!")?;
    }

    Ok(out)
}

fn render_vrf(out: &mut String, vrf: &Vrf, style: VrfStanzaStyle) -> fmt::Result {
    writeln!(out, "vrf {}", vrf.name)?;
    match style {
        VrfStanzaStyle::StaticRoutes => {
            for route in &vrf.static_routes {
                writeln!(out, " ip route {} {}", route.destination, route.next_hop)?;
            }
        }
        VrfStanzaStyle::Vni => writeln!(out, " vni {}", vrf.vni)?,
    }
    writeln!(out, "exit-vrf")?;
    writeln!(out, "!")
}

fn render_router(out: &mut String, intent: &GlobalIntent, router: &Router) -> fmt::Result {
    match router.vrf_name() {
        Some(vrf) => writeln!(out, "router bgp {} vrf {}", intent.asn, vrf)?,
        None => writeln!(out, "router bgp {}", intent.asn)?,
    }
    writeln!(out, " bgp router-id {}", router.router_id)?;
    for knob in ROUTER_DEFAULTS {
        writeln!(out, " {}", knob)?;
    }

    for peer in &router.peers {
        render_peer(out, peer)?;
    }

    writeln!(out, "exit")?;
    writeln!(out, "!")
}

fn render_peer(out: &mut String, peer: &Peer) -> fmt::Result {
    let ip = peer.address;

    writeln!(out, " neighbor {} remote-as {}", ip, peer.remote_as)?;
    if let Some(password) = peer.password() {
        writeln!(out, " neighbor {} password {}", ip, password)?;
    }
    if let Some(description) = peer.description() {
        writeln!(out, " neighbor {} description \"{}\"", ip, description)?;
    }
    if let Some(route_map) = peer.route_map_in() {
        writeln!(out, " neighbor {} route-map {} in", ip, route_map)?;
    }
    if let Some(route_map) = peer.route_map_out() {
        writeln!(out, " neighbor {} route-map {} out", ip, route_map)?;
    }

    writeln!(out, " address-family ipv4 unicast")?;
    writeln!(out, "  neighbor {} activate", ip)?;
    writeln!(out, " exit-address-family")?;

    if peer.fabric {
        writeln!(out, " address-family l2vpn evpn")?;
        writeln!(out, "  neighbor {} activate", ip)?;
        writeln!(out, "  advertise-all-vni")?;
        writeln!(out, "  advertise-svi-ip")?;
        writeln!(out, " exit-address-family")?;
    }

    Ok(())
}
