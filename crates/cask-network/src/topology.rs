//! Network topology configuration.

use std::net::Ipv4Addr;

/// Canonical interface name inside a container namespace.
pub const CONTAINER_IFNAME: &str = "eth0";

/// The virtual network a set of containers shares.
///
/// Threaded explicitly through the bridge, address, and orchestration code so
/// alternative topologies (and test doubles) are possible; the default matches
/// the single built-in network. Creation is idempotent at the bridge level: an
/// existing bridge is never recreated or reconfigured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTopology {
    /// Bridge device name.
    pub bridge: String,
    /// Bridge address on the host side; containers route through it.
    pub host_address: Ipv4Addr,
    /// Subnet base address.
    pub subnet_base: Ipv4Addr,
    /// Subnet prefix length.
    pub prefix_len: u8,
    /// First host offset handed out to containers.
    pub alloc_offset: u32,
    /// Size of the allocation pool.
    pub alloc_pool: u32,
}

impl NetworkTopology {
    /// Bridge address in CIDR notation, e.g. `10.200.0.1/24`.
    #[must_use]
    pub fn bridge_cidr(&self) -> String {
        format!("{}/{}", self.host_address, self.prefix_len)
    }

    /// Subnet in CIDR notation, e.g. `10.200.0.0/24`.
    #[must_use]
    pub fn subnet_cidr(&self) -> String {
        format!("{}/{}", self.subnet_base, self.prefix_len)
    }
}

impl Default for NetworkTopology {
    fn default() -> Self {
        Self {
            bridge: "cask0".to_string(),
            host_address: Ipv4Addr::new(10, 200, 0, 1),
            subnet_base: Ipv4Addr::new(10, 200, 0, 0),
            prefix_len: 24,
            alloc_offset: 10,
            alloc_pool: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_topology_cidrs() {
        let topo = NetworkTopology::default();
        assert_eq!(topo.bridge_cidr(), "10.200.0.1/24");
        assert_eq!(topo.subnet_cidr(), "10.200.0.0/24");
        assert_eq!(topo.bridge, "cask0");
    }
}
