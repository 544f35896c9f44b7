//! Container address allocation.

use std::net::Ipv4Addr;

use crate::topology::NetworkTopology;

/// Allocate a container address from the topology's pool.
///
/// Deterministic: maps the launching process id into the subnet's host range
/// at `offset + pid % pool`. Nothing is reserved or tracked, so two
/// concurrently started containers whose pids collide modulo the pool size
/// compute the same address. That is a known correctness gap of the
/// allocation scheme, accepted rather than papered over with different
/// semantics.
#[must_use]
pub fn allocate(topology: &NetworkTopology, pid: u32) -> Ipv4Addr {
    let base = u32::from(topology.subnet_base);
    let host = topology.alloc_offset + pid % topology.alloc_pool;
    Ipv4Addr::from(base + host)
}
