//! Classification of the addresses clients report.
//!
//! A client may announce an address different from the one it connects from
//! with the `ip`, `ipv4` and `ipv6` params. Only globally routable addresses
//! are accepted, otherwise a client could hand out addresses of private
//! networks to the swarm.
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// It returns `true` when the address is globally routable.
///
/// ```rust
/// use std::net::IpAddr;
///
/// use bittorrent_http_protocol::ip::is_routable;
///
/// assert!(is_routable("126.0.0.1".parse::<IpAddr>().unwrap()));
/// assert!(!is_routable("192.168.1.2".parse::<IpAddr>().unwrap()));
/// ```
#[must_use]
pub fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_routable_ipv4(ipv4),
        IpAddr::V6(ipv6) => is_routable_ipv6(ipv6),
    }
}

#[must_use]
pub fn is_routable_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();

    let reserved = match octets {
        // "this" network, private, loopback and link local
        [0 | 10 | 127, ..] | [169, 254, ..] | [192, 168, ..] => true,
        // shared address space, 100.64.0.0/10
        [100, second, ..] => second & 0xC0 == 64,
        // private, 172.16.0.0/12
        [172, second, ..] => second & 0xF0 == 16,
        // protocol assignments and TEST-NET-1
        [192, 0, 0 | 2, _] => true,
        // benchmarking, 198.18.0.0/15
        [198, second, ..] if second & 0xFE == 18 => true,
        // TEST-NET-2 and TEST-NET-3
        [198, 51, 100, _] | [203, 0, 113, _] => true,
        // multicast, reserved and broadcast
        [first, ..] => first >= 224,
    };

    !reserved
}

#[must_use]
pub fn is_routable_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_routable_ipv4(mapped);
    }

    let segments = ip.segments();

    // NAT64 well-known prefix, 64:ff9b::/96
    if segments[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        let octets = ip.octets();
        return is_routable_ipv4(Ipv4Addr::new(octets[12], octets[13], octets[14], octets[15]));
    }

    let reserved = ip.is_unspecified()
        || ip.is_loopback()
        // discard-only, 100::/64
        || segments[..4] == [0x100, 0, 0, 0]
        // documentation, 2001:db8::/32
        || segments[..2] == [0x2001, 0xdb8]
        // IETF protocol assignments, 2001::/23
        || (segments[0] == 0x2001 && segments[1] < 0x200)
        // unique local, fc00::/7
        || segments[0] & 0xFE00 == 0xFC00
        // link local, fe80::/10
        || segments[0] & 0xFFC0 == 0xFE80
        // multicast, ff00::/8
        || segments[0] & 0xFF00 == 0xFF00;

    !reserved
}
