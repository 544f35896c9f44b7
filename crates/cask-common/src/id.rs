//! Per-run container identity and the names derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Usable characters in a Linux interface name (IFNAMSIZ minus the NUL).
pub const IFNAMSIZ_USABLE: usize = 15;

/// Length of the truncated identity used in device names.
const SHORT_LEN: usize = 6;

/// An opaque per-run container identity token.
///
/// Derived from the launching process id, so it is unique among concurrently
/// running containers (pids are only recycled after exit). Every per-container
/// name flows from it: veth endpoint names, the container hostname, the netns
/// marker file, and the working directory. Device names use a truncated form
/// because veth names are capped at [`IFNAMSIZ_USABLE`] characters; filesystem
/// paths use the full token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerIdentity(String);

impl ContainerIdentity {
    /// Derive the identity for the current process.
    #[must_use]
    pub fn current() -> Self {
        Self::from_pid(std::process::id())
    }

    /// Derive the identity from a process id.
    #[must_use]
    pub fn from_pid(pid: u32) -> Self {
        Self(format!("{}-{}", pid, u64::from(pid) + 12345))
    }

    /// Reconstruct an identity from a token received over the parameter channel.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The full token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncated form used in device names.
    #[must_use]
    pub fn short(&self) -> &str {
        if self.0.len() <= SHORT_LEN {
            &self.0
        } else {
            &self.0[..SHORT_LEN]
        }
    }

    /// Host-side veth endpoint name.
    #[must_use]
    pub fn host_veth(&self) -> String {
        format!("vethh{}", self.short())
    }

    /// Container-side veth endpoint name (before the in-namespace rename).
    #[must_use]
    pub fn peer_veth(&self) -> String {
        format!("vethc{}", self.short())
    }

    /// Hostname assigned inside the container.
    #[must_use]
    pub fn hostname(&self) -> String {
        format!("cask-{}", self.0)
    }
}

impl fmt::Display for ContainerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContainerIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_pids_distinct_tokens() {
        let a = ContainerIdentity::from_pid(100);
        let b = ContainerIdentity::from_pid(101);
        assert_ne!(a, b);
    }

    #[test]
    fn veth_names_fit_interface_limit() {
        // Largest pid on 64-bit Linux defaults (pid_max 4194304)
        let id = ContainerIdentity::from_pid(4_194_304);
        assert!(id.host_veth().len() <= IFNAMSIZ_USABLE);
        assert!(id.peer_veth().len() <= IFNAMSIZ_USABLE);
        assert_ne!(id.host_veth(), id.peer_veth());
    }

    #[test]
    fn short_form_truncates() {
        let id = ContainerIdentity::from_pid(1_234_567);
        assert_eq!(id.short().len(), 6);
        assert!(id.as_str().starts_with(id.short()));
    }

    #[test]
    fn token_round_trip() {
        let id = ContainerIdentity::from_pid(42);
        let back = ContainerIdentity::from_token(id.as_str());
        assert_eq!(id, back);
    }

    #[test]
    fn hostname_carries_full_token() {
        let id = ContainerIdentity::from_pid(42);
        assert_eq!(id.hostname(), format!("cask-{}", id.as_str()));
    }
}
