//! The host-side run orchestrator.
//!
//! Strictly sequential: every phase must complete before the next begins, a
//! failure in any phase aborts the run, and nothing already set up is
//! unwound. Host resources created before a failure (bridge, veth pair,
//! firewall rules, the rootfs working directory) survive the run and need
//! manual removal; that is the documented scope boundary, not an oversight.

use std::path::Path;

use serde::Serialize;

use cask_common::{CaskError, CaskResult, CaskPaths, ContainerIdentity};
use cask_network::{NetworkTopology, VethPair, addr, bridge, portmap, resolv};

use crate::filesystem::VolumeMount;
use crate::image::ImageStore;

use super::launcher;
use super::spec::ContainerSpec;
use super::sync::{self, RetryPolicy};

/// Phases of a container run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Rootfs extracted and resolver config written.
    RootfsReady,
    /// Veth pair created and attached to the bridge.
    VethCreated,
    /// Child process started in fresh namespaces.
    NamespaceSpawned,
    /// Child observed in its own network namespace.
    NamespaceConfirmed,
    /// Veth peer handed into the child's namespace.
    VethMoved,
    /// Port forwarding rules installed.
    PortsConfigured,
    /// Waiting on the container command.
    Running,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootfsReady => write!(f, "rootfs"),
            Self::VethCreated => write!(f, "veth"),
            Self::NamespaceSpawned => write!(f, "spawn"),
            Self::NamespaceConfirmed => write!(f, "netns"),
            Self::VethMoved => write!(f, "handoff"),
            Self::PortsConfigured => write!(f, "ports"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// What the user asked `run` to do.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Image name in the local store.
    pub image: String,
    /// Shell command line for the container.
    pub command: String,
    /// Raw `;`-separated volume mappings.
    pub volumes: String,
    /// Raw `;`-separated port mappings.
    pub ports: String,
}

/// Informational record dropped next to the rootfs before spawn.
///
/// Never read back by the runtime; it exists so a human poking around the
/// containers directory can tell what a working directory belongs to.
#[derive(Debug, Serialize)]
struct ContainerRecord<'a> {
    id: &'a str,
    image: &'a str,
    address: String,
    command: &'a str,
    host_veth: &'a str,
    peer_veth: &'a str,
}

/// Sequences a container run from rootfs preparation to child exit.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    topology: NetworkTopology,
    paths: CaskPaths,
}

impl Orchestrator {
    /// Create an orchestrator over a topology and path layout.
    #[must_use]
    pub fn new(topology: NetworkTopology, paths: CaskPaths) -> Self {
        Self { topology, paths }
    }

    /// Run a container to completion and return its exit code.
    pub async fn run(&self, request: RunRequest) -> CaskResult<i32> {
        bridge::ensure(&self.topology).await?;

        let identity = ContainerIdentity::current();
        // Host-side validation; the init parses its own copy again before
        // mounting anything.
        let volumes = VolumeMount::parse_list(&request.volumes)?;

        let rootfs = self.prepare_rootfs(&identity, &request.image)?;
        tracing::info!(phase = %RunPhase::RootfsReady, identity = %identity, rootfs = %rootfs.display(), "rootfs ready");

        let address = addr::allocate(&self.topology, std::process::id());
        let veth = VethPair::for_identity(&identity);
        veth.create().await?;
        veth.attach_to_bridge(&self.topology.bridge).await?;
        tracing::info!(phase = %RunPhase::VethCreated, host = %veth.host, peer = %veth.peer, "veth ready");

        // The init bind-mounts its netns handle onto this marker; the file
        // itself must exist on the host first.
        let marker = CaskPaths::netns_marker(&identity);
        std::fs::write(&marker, b"")
            .map_err(|e| CaskError::setup("create netns marker file", e))?;

        let spec = ContainerSpec {
            rootfs,
            identity: identity.clone(),
            address,
            peer_veth: veth.peer.clone(),
            volumes,
            command: request.command.clone(),
        };
        self.write_record(&spec, &request.image, &veth)?;

        let mut child = launcher::spawn_init(&spec)?;
        let pid = child.id();
        tracing::info!(phase = %RunPhase::NamespaceSpawned, pid, "container namespace started");

        // Moving the veth before the child has unshared would strand it in
        // the host namespace, so confirm the divergence first.
        sync::wait_for_child_netns(pid, RetryPolicy::host_netns()).await?;
        tracing::info!(phase = %RunPhase::NamespaceConfirmed, pid, "child entered its own netns");

        veth.move_to_netns(pid).await?;
        tracing::info!(phase = %RunPhase::VethMoved, peer = %veth.peer, "veth handed to container");

        if !request.ports.is_empty() {
            portmap::install(address, &request.ports).await?;
            tracing::info!(phase = %RunPhase::PortsConfigured, %address, "port forwarding installed");
        }

        tracing::info!(phase = %RunPhase::Running, pid, command = %request.command, "container running");
        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| CaskError::setup("wait for container", std::io::Error::other(e)))?
            .map_err(|e| CaskError::setup("wait for container", e))?;

        let exit_code = exit_code_of(status);
        tracing::info!(pid, exit_code, "container exited");
        Ok(exit_code)
    }

    /// Extract the image into the container's rootfs and write resolver
    /// config into it.
    fn prepare_rootfs(
        &self,
        identity: &ContainerIdentity,
        image: &str,
    ) -> CaskResult<std::path::PathBuf> {
        let rootfs = self.paths.container_rootfs(identity);
        std::fs::create_dir_all(&rootfs)
            .map_err(|e| CaskError::setup("create rootfs directory", e))?;

        ImageStore::new(&self.paths.images).unpack(image, &rootfs)?;
        resolv::write_into(&rootfs)?;

        Ok(rootfs)
    }

    /// Drop the informational container record into the working directory.
    fn write_record(
        &self,
        spec: &ContainerSpec,
        image: &str,
        veth: &VethPair,
    ) -> CaskResult<()> {
        let record = ContainerRecord {
            id: spec.identity.as_str(),
            image,
            address: spec.address.to_string(),
            command: &spec.command,
            host_veth: &veth.host,
            peer_veth: &veth.peer,
        };
        let path = self.paths.container_record(&spec.identity);
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| CaskError::setup("serialize container record", std::io::Error::other(e)))?;
        std::fs::write(&path, json)
            .map_err(|e| CaskError::setup("write container record", e))?;
        Ok(())
    }
}

/// Fold an exit status into a single code, signal deaths as `128 + signal`.
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .unwrap_or_else(|| status.signal().map_or(1, |sig| 128 + sig))
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}

/// Resolve the containers root: explicit override, else the default.
#[must_use]
pub fn containers_root(override_dir: Option<&Path>) -> CaskPaths {
    override_dir.map_or_else(CaskPaths::new, CaskPaths::with_containers_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_render_in_order() {
        let phases = [
            RunPhase::RootfsReady,
            RunPhase::VethCreated,
            RunPhase::NamespaceSpawned,
            RunPhase::NamespaceConfirmed,
            RunPhase::VethMoved,
            RunPhase::PortsConfigured,
            RunPhase::Running,
        ];
        let rendered: Vec<String> = phases.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["rootfs", "veth", "spawn", "netns", "handoff", "ports", "running"]
        );
    }

    #[test]
    fn containers_root_honors_override() {
        let paths = containers_root(Some(Path::new("/custom/containers")));
        assert_eq!(paths.containers, Path::new("/custom/containers"));
    }

    #[test]
    fn malformed_volumes_rejected_before_spawn() {
        // run() parses the volume list before creating the veth pair or
        // spawning the child, so a bad mapping never reaches a mount.
        assert!(VolumeMount::parse_list("/host-only").is_err());
    }
}
