//! # cask-network
//!
//! Host-side network plumbing for Cask containers: the shared bridge, per
//! container veth pairs, deterministic address allocation, port forwarding
//! (DNAT), and resolver configuration for the container rootfs.
//!
//! All link and firewall manipulation shells out to `ip` and `iptables`; the
//! resulting kernel objects are live state only and are never persisted or
//! torn down by Cask.

#![warn(missing_docs)]

pub mod addr;
pub mod bridge;
pub mod cmd;
pub mod portmap;
pub mod resolv;
pub mod topology;
pub mod veth;

pub use portmap::PortMapping;
pub use topology::NetworkTopology;
pub use veth::VethPair;
