//! Virtual ethernet pair management.

use cask_common::{CaskError, CaskResult, ContainerIdentity};

use crate::cmd;

/// A veth pair connecting a container to the bridge.
///
/// Both endpoint names derive deterministically from the container identity.
/// The host end stays attached to the bridge; the peer end is moved into the
/// child's network namespace once the child has unshared, and renamed there.
///
/// There is no explicit destruction: the peer disappears with its namespace
/// when the container exits, taking the pair with it, but a run that fails
/// between creation and namespace entry leaks the pair on the host. That is a
/// documented cost of the no-teardown design, not something this type cleans
/// up.
#[derive(Debug, Clone)]
pub struct VethPair {
    /// Host-side endpoint name.
    pub host: String,
    /// Container-side endpoint name.
    pub peer: String,
}

impl VethPair {
    /// Derive the pair names for a container identity.
    #[must_use]
    pub fn for_identity(id: &ContainerIdentity) -> Self {
        Self {
            host: id.host_veth(),
            peer: id.peer_veth(),
        }
    }

    /// Create the pair on the host.
    pub async fn create(&self) -> CaskResult<()> {
        tracing::debug!(host = %self.host, peer = %self.peer, "creating veth pair");

        cmd::run(
            "ip",
            &[
                "link", "add", &self.host, "type", "veth", "peer", "name", &self.peer,
            ],
        )
        .map_err(|e| CaskError::setup("create veth pair", e))
    }

    /// Attach the host end to a bridge and bring it up.
    pub async fn attach_to_bridge(&self, bridge: &str) -> CaskResult<()> {
        tracing::debug!(host = %self.host, bridge, "attaching veth to bridge");

        cmd::run("ip", &["link", "set", &self.host, "master", bridge])
            .map_err(|e| CaskError::setup("attach veth to bridge", e))?;
        cmd::run("ip", &["link", "set", &self.host, "up"])
            .map_err(|e| CaskError::setup("bring veth up", e))
    }

    /// Move the peer end into the network namespace of a process.
    ///
    /// Must only be called after the child has observably unshared its
    /// network namespace; moving earlier strands the peer in the host
    /// namespace where the child will never find it.
    pub async fn move_to_netns(&self, pid: u32) -> CaskResult<()> {
        tracing::debug!(peer = %self.peer, pid, "moving veth peer into container netns");

        cmd::run("ip", &["link", "set", &self.peer, "netns", &pid.to_string()])
            .map_err(|e| CaskError::setup("move veth to container", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_derive_from_identity() {
        let id = ContainerIdentity::from_pid(7);
        let pair = VethPair::for_identity(&id);
        assert!(pair.host.starts_with("vethh"));
        assert!(pair.peer.starts_with("vethc"));
        assert_ne!(pair.host, pair.peer);
    }
}
