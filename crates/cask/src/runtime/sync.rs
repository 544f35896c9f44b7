//! The host↔child namespace handshake.
//!
//! The two processes of a run share no memory and no pipe; the only signals
//! that cross the namespace boundary are kernel-observable side effects. Two
//! symmetric bounded polling loops stand in for the cross-namespace
//! notification primitive the kernel does not offer:
//!
//! - the host waits for the child's network-namespace identity to diverge
//!   from its own before moving the veth peer (moving earlier would strand
//!   the peer in the host namespace);
//! - the child waits for the veth peer to appear in its namespace by
//!   repeatedly attempting the rename to the canonical interface name.
//!
//! Both loops have a fixed budget; exhausting it is a hard failure because
//! the handoff has exactly one valid outcome per attempt.

use std::time::Duration;

use cask_common::{CaskError, CaskResult};
use cask_network::cmd;
use cask_network::topology::CONTAINER_IFNAME;

/// Budget for a bounded polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of probe attempts.
    pub attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Host-side budget for the netns-divergence wait.
    #[must_use]
    pub const fn host_netns() -> Self {
        Self::new(50, Duration::from_millis(100))
    }

    /// Child-side budget for the veth-claim wait.
    #[must_use]
    pub const fn veth_claim() -> Self {
        Self::new(50, Duration::from_millis(200))
    }
}

/// Poll until an observed value diverges from a baseline.
///
/// Returns on the first observed inequality; probes returning `None`
/// (unreadable state) consume an attempt like any other failure.
pub async fn wait_for_divergence<F>(
    policy: RetryPolicy,
    what: &str,
    baseline: &str,
    mut probe: F,
) -> CaskResult<()>
where
    F: FnMut() -> Option<String>,
{
    for attempt in 0..policy.attempts {
        if let Some(observed) = probe() {
            if observed != baseline {
                tracing::debug!(what, attempt, %observed, "divergence observed");
                return Ok(());
            }
        }
        tokio::time::sleep(policy.interval).await;
    }

    Err(CaskError::Timeout {
        what: what.to_string(),
        attempts: policy.attempts,
    })
}

/// Poll an attempt until it reports success.
pub async fn wait_until<F>(policy: RetryPolicy, what: &str, mut attempt: F) -> CaskResult<()>
where
    F: FnMut() -> bool,
{
    for tries in 0..policy.attempts {
        if attempt() {
            tracing::debug!(what, tries, "wait satisfied");
            return Ok(());
        }
        tokio::time::sleep(policy.interval).await;
    }

    Err(CaskError::Timeout {
        what: what.to_string(),
        attempts: policy.attempts,
    })
}

/// Host side: wait until a child process has unshared its network namespace.
///
/// Reads the host's own namespace identity once, then compares the child's
/// (by pid) against it. The identity is only ever compared for equality; it
/// is observed, never joined.
pub async fn wait_for_child_netns(pid: u32, policy: RetryPolicy) -> CaskResult<()> {
    let host_netns = std::fs::read_link("/proc/self/ns/net")
        .map_err(|e| CaskError::setup("read host netns", e))?;
    let baseline = host_netns.to_string_lossy().into_owned();
    let target = format!("/proc/{pid}/ns/net");

    wait_for_divergence(policy, "child network namespace", &baseline, move || {
        std::fs::read_link(&target)
            .ok()
            .map(|p| p.to_string_lossy().into_owned())
    })
    .await
}

/// Child side: wait for the veth peer to arrive, claiming it on arrival.
///
/// The rename to the canonical name doubles as the presence probe: it can
/// only succeed once the host has moved the device into this namespace, so a
/// successful rename is both the signal and the claim.
pub async fn claim_interface(expected: &str, policy: RetryPolicy) -> CaskResult<()> {
    let what = format!("interface {expected} in container netns");
    wait_until(policy, &what, || {
        cmd::succeeds("ip", &["link", "set", expected, "name", CONTAINER_IFNAME])
    })
    .await
}
