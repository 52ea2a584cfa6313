//! Fabric-edge intent model.
//!
//! This crate holds the declarative description of a BGP/EVPN edge node
//! that `edgecfgd` turns into kernel VRF state and an FRR configuration:
//!
//! - [`GlobalIntent`]: the root value, immutable once loaded
//! - [`Router`], [`Peer`]: BGP instances and their neighbors
//! - [`Vrf`], [`StaticRoute`]: VRF devices and per-VRF static routes
//! - [`PrefixListEntry`], [`RouteMapEntry`]: sequence-ordered route policy
//! - [`EvpnInstance`]: VRFs that get a dedicated EVPN-advertising instance
//! - [`IntentError`]: parse and cross-reference validation failures
//!
//! Primitive wire-level types ([`Asn`], [`RemoteAs`], [`Action`],
//! [`LogLevel`], [`IpPrefix`]) live alongside the model.

mod bgp;
mod intent;
mod ip;
mod validate;

pub use bgp::{Action, Asn, LogLevel, RemoteAs};
pub use intent::{
    EvpnInstance, GlobalIntent, Peer, PrefixListEntry, RouteMapEntry, Router, StaticRoute, Vrf,
    DEFAULT_HOSTNAME,
};
pub use ip::IpPrefix;
pub use validate::IntentError;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid AS number: {0}")]
    InvalidAsn(String),

    #[error("invalid remote-as: {0} (expected a number, 'internal' or 'external')")]
    InvalidRemoteAs(String),
}
