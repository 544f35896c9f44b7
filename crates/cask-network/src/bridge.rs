//! Shared bridge management.
//!
//! One bridge device joins the host ends of every container's veth pair and
//! NATs the subnet out through the host's uplink.

use cask_common::{CaskError, CaskResult};

use crate::cmd;
use crate::topology::NetworkTopology;

/// Check whether a link with the given name exists.
#[must_use]
pub fn exists(name: &str) -> bool {
    cmd::succeeds("ip", &["link", "show", name])
}

/// Ensure the topology's bridge exists and the subnet is routable.
///
/// If the bridge is absent: create it, assign its address, bring it up,
/// enable IPv4 forwarding system-wide, and install the masquerade and forward
/// rules the subnet needs. If it is already present, do nothing: the bridge
/// may be left over from a prior run and must not be recreated or
/// reconfigured.
///
/// Running this concurrently from two processes can race on the existence
/// check and duplicate the firewall rules; duplicate appends are tolerated
/// (they do not change filtering behavior) and are not deduplicated here.
pub async fn ensure(topology: &NetworkTopology) -> CaskResult<()> {
    let name = topology.bridge.as_str();

    if exists(name) {
        tracing::debug!(bridge = name, "bridge exists");
        return Ok(());
    }

    tracing::info!(bridge = name, cidr = %topology.bridge_cidr(), "creating bridge");

    cmd::run("ip", &["link", "add", name, "type", "bridge"])
        .map_err(|e| CaskError::setup("add bridge", e))?;
    cmd::run("ip", &["addr", "add", &topology.bridge_cidr(), "dev", name])
        .map_err(|e| CaskError::setup("assign bridge address", e))?;
    cmd::run("ip", &["link", "set", name, "up"])
        .map_err(|e| CaskError::setup("bring bridge up", e))?;

    // Forwarding must be on for the masquerade rule to have any effect.
    std::fs::write("/proc/sys/net/ipv4/ip_forward", "1")
        .map_err(|e| CaskError::setup("enable ipv4 forwarding", e))?;

    let subnet = topology.subnet_cidr();
    cmd::run(
        "iptables",
        &[
            "-t", "nat", "-A", "POSTROUTING", "-s", &subnet, "!", "-o", name, "-j", "MASQUERADE",
        ],
    )
    .map_err(|e| CaskError::setup("configure subnet masquerade", e))?;
    cmd::run("iptables", &["-A", "FORWARD", "-i", name, "-j", "ACCEPT"])
        .map_err(|e| CaskError::setup("allow forward from bridge", e))?;
    cmd::run(
        "iptables",
        &[
            "-A",
            "FORWARD",
            "-o",
            name,
            "-m",
            "conntrack",
            "--ctstate",
            "RELATED,ESTABLISHED",
            "-j",
            "ACCEPT",
        ],
    )
    .map_err(|e| CaskError::setup("allow established to bridge", e))?;

    tracing::info!(bridge = name, "bridge ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_bridge_reports_absent() {
        assert!(!exists("cask_no_such_bridge_12345"));
    }

    #[tokio::test]
    async fn ensure_is_a_no_op_when_bridge_exists() {
        // Loopback always exists, so ensure() must take the early-return
        // path and perform no action at all. Skipped when iproute2 is not
        // installed, since the existence probe itself needs `ip`.
        if !exists("lo") {
            return;
        }
        let topo = NetworkTopology {
            bridge: "lo".to_string(),
            ..NetworkTopology::default()
        };
        ensure(&topo).await.unwrap();
        ensure(&topo).await.unwrap();
    }
}
