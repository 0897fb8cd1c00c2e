use std::net::{IpAddr, Ipv4Addr};

use sysinfo::{NetworkData, Networks};

use super::counters::NetTotals;
use super::metrics::NetInterface;

#[cfg(target_os = "linux")]
use crate::platform::system::linux::procfs;

/// Sum of every interface's cumulative counters
pub fn global_totals(networks: &Networks) -> NetTotals {
    networks
        .values()
        .fold(NetTotals::default(), |acc, data| NetTotals {
            bytes_sent: acc.bytes_sent + data.total_transmitted(),
            bytes_recv: acc.bytes_recv + data.total_received(),
            packets_sent: acc.packets_sent + data.total_packets_transmitted(),
            packets_recv: acc.packets_recv + data.total_packets_received(),
        })
}

pub fn interface(name: &str, data: &NetworkData) -> NetInterface {
    let ipv4 = data.ip_networks().iter().find_map(|net| match net.addr {
        IpAddr::V4(addr) => Some((addr, net.prefix)),
        IpAddr::V6(_) => None,
    });
    let mac = data.mac_address();

    #[cfg(target_os = "linux")]
    let (is_up, speed, duplex) = {
        let link = procfs::read_link_info(name);
        (link.is_up, link.speed, link.duplex)
    };

    // No link query here; an interface holding an address counts as up
    #[cfg(not(target_os = "linux"))]
    let (is_up, speed, duplex) = (
        !data.ip_networks().is_empty(),
        0,
        "unknown".to_string(),
    );

    NetInterface {
        name: name.to_string(),
        is_up,
        duplex,
        speed,
        mtu: data.mtu(),
        mac_address: (!mac.is_unspecified()).then(|| mac.to_string()),
        ip_address: ipv4.map(|(addr, _)| addr.to_string()),
        netmask: ipv4.map(|(_, prefix)| prefix_to_netmask(prefix).to_string()),
        broadcast: ipv4.map(|(addr, prefix)| broadcast(addr, prefix).to_string()),
        bytes_sent: data.total_transmitted(),
        bytes_recv: data.total_received(),
    }
}

/// 24 -> 255.255.255.0
pub fn prefix_to_netmask(prefix: u8) -> Ipv4Addr {
    Ipv4Addr::from(mask_bits(prefix))
}

/// Directed broadcast address of the subnet holding `addr`
pub fn broadcast(addr: Ipv4Addr, prefix: u8) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr) | !mask_bits(prefix))
}

fn mask_bits(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_to_netmask() {
        assert_eq!(prefix_to_netmask(24), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(prefix_to_netmask(20), Ipv4Addr::new(255, 255, 240, 0));
        assert_eq!(prefix_to_netmask(0), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(prefix_to_netmask(32), Ipv4Addr::new(255, 255, 255, 255));
    }

    #[test]
    fn test_broadcast() {
        let addr = Ipv4Addr::new(192, 168, 1, 37);
        assert_eq!(broadcast(addr, 24), Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(broadcast(addr, 32), addr);
        assert_eq!(
            broadcast(Ipv4Addr::new(10, 1, 2, 3), 8),
            Ipv4Addr::new(10, 255, 255, 255)
        );
    }
}
