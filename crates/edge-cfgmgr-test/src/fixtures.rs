//! Intent fixtures shared by unit and integration tests.

use std::net::Ipv4Addr;

use edge_types::{
    Action, Asn, EvpnInstance, GlobalIntent, LogLevel, Peer, PrefixListEntry, RemoteAs,
    RouteMapEntry, Router, StaticRoute, Vrf,
};

/// Local AS used by every fixture.
pub const FIXTURE_ASN: u32 = 64512;

fn peer(address: &str, remote_as: u32) -> Peer {
    Peer::new(
        address.parse().expect("fixture address"),
        RemoteAs::Number(Asn(remote_as)),
    )
}

/// One VRF `hedge` (VNI 100) with one router and one plain neighbor.
pub fn hedge_intent() -> GlobalIntent {
    let mut intent = GlobalIntent::new(Asn(FIXTURE_ASN));
    intent.vrfs.push(Vrf::new("hedge", 100));

    let mut friend = peer("192.168.1.2", 64513);
    friend.description = Some("hedge's friend".to_string());

    intent.routers.push(Router {
        vrf: Some("hedge".to_string()),
        router_id: Ipv4Addr::new(192, 168, 1, 1),
        peers: vec![friend],
    });
    intent
}

/// A full edge node: an underlay router with a fabric spine session, two
/// tenant VRFs with policy, static routes and EVPN instances.
pub fn sample_fabric() -> GlobalIntent {
    let mut intent = GlobalIntent::new(Asn(FIXTURE_ASN));
    intent.log_level = LogLevel::Debugging;

    let mut spine = peer("172.30.1.1", 64513);
    spine.description = Some("spine1".to_string());
    spine.fabric = true;

    let mut hedge_friend = peer("192.168.1.2", 64513);
    hedge_friend.description = Some("hedge's friend".to_string());
    let mut hedge_secret = peer("192.168.1.3", 64514);
    hedge_secret.password = Some("nothedge".to_string());

    let mut hog_friend = peer("192.168.2.2", 64515);
    hog_friend.description = Some("hog's friend".to_string());
    hog_friend.route_map_in = Some("test".to_string());
    hog_friend.route_map_out = Some("test".to_string());

    intent.routers = vec![
        Router {
            vrf: None,
            router_id: Ipv4Addr::new(172, 30, 1, 5),
            peers: vec![spine],
        },
        Router {
            vrf: Some("hedge".to_string()),
            router_id: Ipv4Addr::new(192, 168, 1, 1),
            peers: vec![hedge_friend, hedge_secret],
        },
        Router {
            vrf: Some("hog".to_string()),
            router_id: Ipv4Addr::new(192, 168, 2, 1),
            peers: vec![hog_friend],
        },
    ];

    let mut hedge = Vrf::new("hedge", 100);
    hedge.static_routes.push(StaticRoute {
        destination: "0.0.0.0/0".parse().expect("fixture prefix"),
        next_hop: "192.168.1.3".parse().expect("fixture next hop"),
    });
    intent.vrfs = vec![hedge, Vrf::new("hog", 200)];

    intent.prefix_lists.push(PrefixListEntry {
        name: "test".to_string(),
        seq: 10,
        action: Action::Permit,
        prefix: "10.10.0.0/16".parse().expect("fixture prefix"),
    });
    intent.route_maps.push(RouteMapEntry {
        name: "test".to_string(),
        action: Action::Permit,
        seq: 10,
        prefix_list: Some("test".to_string()),
    });
    intent.evpns = vec![
        EvpnInstance {
            vrf: "hedge".to_string(),
        },
        EvpnInstance {
            vrf: "hog".to_string(),
        },
    ];
    intent
}

/// Three VRFs (`red`, `green`, `blue`), each with its own router.
pub fn three_vrf_intent() -> GlobalIntent {
    let mut intent = GlobalIntent::new(Asn(FIXTURE_ASN));
    for (idx, name) in ["red", "green", "blue"].into_iter().enumerate() {
        let octet = idx as u8 + 1;
        intent.vrfs.push(Vrf::new(name, 1000 + u32::from(octet)));
        intent.routers.push(Router {
            vrf: Some(name.to_string()),
            router_id: Ipv4Addr::new(10, octet, 0, 1),
            peers: vec![peer(&format!("10.{}.0.2", octet), 65000 + u32::from(octet))],
        });
    }
    intent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_validate() {
        assert!(hedge_intent().validate().is_ok());
        assert!(sample_fabric().validate().is_ok());
        assert!(three_vrf_intent().validate().is_ok());
    }

    #[test]
    fn test_three_vrf_order() {
        let names: Vec<_> = three_vrf_intent()
            .vrfs
            .iter()
            .map(|v| v.name.clone())
            .collect();
        assert_eq!(names, ["red", "green", "blue"]);
    }
}
