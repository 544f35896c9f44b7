//! # Cask Container Launcher
//!
//! Cask launches a command inside fresh Linux namespaces (pid, network, ipc,
//! uts, mount), wires the new network namespace to the host through a bridge
//! and a veth pair, and replaces itself with the command as the container's
//! PID 1.
//!
//! A run involves two cooperating processes with no shared memory:
//!
//! - the **host orchestrator** prepares the rootfs and the host side of the
//!   network, spawns the child, and hands the veth peer across the namespace
//!   boundary;
//! - the **container init** (this same binary re-executed in its init role)
//!   restructures mounts, claims the veth peer, pivots into the new root, and
//!   execs the user command.
//!
//! The two synchronize purely through kernel-observable state (namespace
//! identity divergence on one side, interface appearance on the other) with
//! bounded polling on both ends.

#![warn(missing_docs)]

pub mod cli;
pub mod filesystem;
pub mod image;
pub mod init;
pub mod runtime;

pub use runtime::spec::ContainerSpec;
