//! The container init sequence.
//!
//! Runs only inside the fresh namespaces, as PID 1, re-invoked by the
//! launcher. The process has exactly one job, completing the sequence below
//! and becoming the user command, so every failure is fatal immediately;
//! there is no degraded or partial-init state.
//!
//! Ordering constraints worth keeping in mind when touching this:
//! - the netns handle export comes before the mount tree goes private;
//! - the rootfs self-bind must precede the pivot, which requires the new
//!   root to be a mount point distinct from its parent's mount;
//! - the veth claim must finish before addressing, because the canonical
//!   interface does not exist until the rename lands.

use std::os::unix::fs::DirBuilderExt;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use cask_common::{CaskError, CaskPaths, CaskResult};
use cask_network::cmd;
use cask_network::topology::{CONTAINER_IFNAME, NetworkTopology};

use crate::filesystem::{mounts, pivot, volume};
use crate::runtime::spec::ContainerSpec;
use crate::runtime::sync::{self, RetryPolicy};

/// Where the old root is parked inside the rootfs until the lazy unmount.
const PUT_OLD: &str = "old_root";

/// Run the init sequence and become the container command.
///
/// Returns only on failure: the final step replaces this process image, so
/// success never comes back to the caller.
pub async fn run() -> CaskResult<()> {
    let spec = ContainerSpec::from_env()?;
    let topology = NetworkTopology::default();

    tracing::info!(
        rootfs = %spec.rootfs.display(),
        identity = %spec.identity,
        address = %spec.address,
        veth = %spec.peer_veth,
        command = %spec.command,
        "initializing container"
    );

    // Export this namespace's net handle onto the host-created marker so
    // observers can reference it independently of our (recyclable) pid.
    let marker = CaskPaths::netns_marker(&spec.identity);
    mounts::bind(Path::new("/proc/self/ns/net"), &marker)
        .map_err(|e| CaskError::init("export network namespace handle", e))?;

    // From here on, nothing we mount may propagate back to the host.
    mounts::make_rprivate(Path::new("/"))
        .map_err(|e| CaskError::init("make mount tree private", e))?;

    // pivot_root requires the new root to be a mount point.
    mounts::bind(&spec.rootfs, &spec.rootfs)
        .map_err(|e| CaskError::init("bind rootfs onto itself", e))?;

    mounts::rbind(Path::new("/dev"), &spec.rootfs.join("dev"))
        .map_err(|e| CaskError::init("bind host device tree", e))?;

    volume::mount_all(&spec.rootfs, &spec.volumes)
        .map_err(|e| CaskError::init("mount volumes", e))?;

    cmd::run("ip", &["link", "set", "lo", "up"])
        .map_err(|e| CaskError::init("bring loopback up", e))?;

    // Wait for the host to hand the veth peer across, claiming it by rename.
    sync::claim_interface(&spec.peer_veth, RetryPolicy::veth_claim()).await?;

    let cidr = format!("{}/{}", spec.address, topology.prefix_len);
    cmd::run("ip", &["addr", "add", &cidr, "dev", CONTAINER_IFNAME])
        .map_err(|e| CaskError::init("assign container address", e))?;
    cmd::run("ip", &["link", "set", CONTAINER_IFNAME, "up"])
        .map_err(|e| CaskError::init("bring container interface up", e))?;
    cmd::run(
        "ip",
        &[
            "route",
            "add",
            "default",
            "via",
            &topology.host_address.to_string(),
        ],
    )
    .map_err(|e| CaskError::init("add default route", e))?;

    let hostname = spec.identity.hostname();
    rustix::system::sethostname(hostname.as_bytes())
        .map_err(|e| CaskError::init("set hostname", e.into()))?;

    switch_root(&spec.rootfs)?;

    tracing::info!(pid = std::process::id(), command = %spec.command, "handing over to container command");

    // exec only returns on failure; on success the user command is PID 1
    // from here on and no init logic survives.
    let err = Command::new("/bin/bash")
        .arg("-c")
        .arg(format!("exec {}", spec.command))
        .exec();
    Err(CaskError::init("exec container command", err))
}

/// Pivot into the rootfs and drop the old root.
///
/// After this the host filesystem is permanently unreachable from the
/// namespace: the old root is lazily unmounted and its holder directory is
/// all that remains of it.
fn switch_root(rootfs: &Path) -> CaskResult<()> {
    let put_old = rootfs.join(PUT_OLD);
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(&put_old)
        .map_err(|e| CaskError::init("create old-root holder", e))?;

    pivot::pivot_root(rootfs, &put_old)
        .map_err(|e| CaskError::init("pivot into rootfs", e))?;

    rustix::process::chdir("/")
        .map_err(|e| CaskError::init("chdir to new root", e.into()))?;

    mounts::mount_proc(Path::new("/proc"))
        .map_err(|e| CaskError::init("mount proc", e))?;

    mounts::unmount_lazy(&Path::new("/").join(PUT_OLD))
        .map_err(|e| CaskError::init("unmount old root", e))?;

    Ok(())
}
