// ── Object naming ──
//
// Names of everything the driver creates are derived from the logical
// identity of the object, so a restarted driver finds its own objects
// again without any stored state.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

/// Separator between an address and its route-domain tag.
pub const PARTITION_SEPARATOR: char = '%';

/// `vs-<protocol>-<addr>-<port>`, with any partition suffix removed from
/// the address first.
pub fn virtual_server_name(protocol: &str, address: &str, port: u16) -> String {
    format!("vs-{protocol}-{}-{port}", strip_partition(address))
}

/// `vlan-<tag>`
pub fn vlan_name(tag: u32) -> String {
    format!("vlan-{tag}")
}

/// `<ip>-<port>`
pub fn member_key(ip: &str, port: u16) -> String {
    format!("{ip}-{port}")
}

/// `<addr>%<tag>`
pub fn tag_with_partition(address: &str, tag: u32) -> String {
    format!("{address}{PARTITION_SEPARATOR}{tag}")
}

/// Drop everything from the first `%`, unless the `%` leads the string.
pub fn strip_partition(address: &str) -> &str {
    match address.find(PARTITION_SEPARATOR) {
        Some(idx) if idx > 0 => &address[..idx],
        _ => address,
    }
}

/// Whether `a` and `b` are in the same IPv4 network under `netmask`.
///
/// Partitions are stripped first. Anything unparsable is "not in subnet".
pub fn same_subnet(a: &str, b: &str, netmask: &str) -> bool {
    let parse = |s: &str| strip_partition(s).parse::<Ipv4Addr>().ok();
    let (Some(a), Some(b), Ok(mask)) = (parse(a), parse(b), netmask.parse::<Ipv4Addr>()) else {
        return false;
    };
    match (Ipv4Net::with_netmask(a, mask), Ipv4Net::with_netmask(b, mask)) {
        (Ok(a), Ok(b)) => a.network() == b.network(),
        _ => false,
    }
}
