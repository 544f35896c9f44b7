//! The container spec and the parameter channel that carries it.
//!
//! The launcher re-executes this binary inside fresh namespaces, so the spec
//! travels host→child through inherited environment variables rather than
//! arguments or files: the re-exec must not depend on any filesystem state
//! outside what the child inherits. All values are strings; the init role
//! parses them back before touching anything and aborts on the first missing
//! key.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use cask_common::{CaskError, CaskResult, ContainerIdentity};

use crate::filesystem::VolumeMount;

/// Channel key: absolute rootfs path.
pub const ENV_ROOTFS: &str = "ROOTFS";
/// Channel key: container identity token.
pub const ENV_CID: &str = "CID";
/// Channel key: allocated IPv4 address.
pub const ENV_CIP: &str = "CIP";
/// Channel key: container-side veth name.
pub const ENV_VETH: &str = "VETH";
/// Channel key: `;`-separated volume mappings (may be empty).
pub const ENV_VOLUMES: &str = "VOLUMES";
/// Channel key: shell command line to exec.
pub const ENV_CMD: &str = "CMD";

/// Everything the container init needs to bring the container up.
///
/// Created once per invocation by the orchestrator and immutable afterwards;
/// the init receives its copy through the parameter channel, not shared
/// memory. Port mappings are deliberately absent: they are host-side
/// firewall state and never cross into the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Prepared rootfs directory.
    pub rootfs: PathBuf,
    /// Per-run identity token.
    pub identity: ContainerIdentity,
    /// Allocated container address.
    pub address: Ipv4Addr,
    /// Name the veth peer will appear under before the in-namespace rename.
    pub peer_veth: String,
    /// Volume mappings, in mount order.
    pub volumes: Vec<VolumeMount>,
    /// Shell command line the container runs as PID 1.
    pub command: String,
}

impl ContainerSpec {
    /// Render the spec as parameter-channel pairs.
    #[must_use]
    pub fn to_env(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_ROOTFS, self.rootfs.display().to_string()),
            (ENV_CID, self.identity.as_str().to_string()),
            (ENV_CIP, self.address.to_string()),
            (ENV_VETH, self.peer_veth.clone()),
            (ENV_VOLUMES, VolumeMount::encode_list(&self.volumes)),
            (ENV_CMD, self.command.clone()),
        ]
    }

    /// Rebuild a spec from the process environment.
    ///
    /// # Errors
    ///
    /// `MissingParam` if any channel key is absent; `Config` if a present
    /// value fails to parse.
    pub fn from_env() -> CaskResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Rebuild a spec from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CaskResult<Self> {
        let required = |key: &'static str| -> CaskResult<String> {
            lookup(key).ok_or(CaskError::MissingParam { key })
        };

        let address = required(ENV_CIP)?;
        let address: Ipv4Addr = address.parse().map_err(|_| CaskError::Config {
            message: format!("invalid container address: {address}"),
        })?;

        Ok(Self {
            rootfs: PathBuf::from(required(ENV_ROOTFS)?),
            identity: ContainerIdentity::from_token(required(ENV_CID)?),
            address,
            peer_veth: required(ENV_VETH)?,
            volumes: VolumeMount::parse_list(&required(ENV_VOLUMES)?)?,
            command: required(ENV_CMD)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContainerSpec {
        ContainerSpec {
            rootfs: PathBuf::from("/tmp/cask/containers/42-12387/rootfs"),
            identity: ContainerIdentity::from_pid(42),
            address: Ipv4Addr::new(10, 200, 0, 52),
            peer_veth: "vethc42-123".to_string(),
            volumes: VolumeMount::parse_list("/host/a:/cont/a").unwrap(),
            command: "sleep 30".to_string(),
        }
    }

    fn lookup_from<'a>(pairs: &'a [(&'static str, String)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn channel_round_trip() {
        let spec = sample();
        let env = spec.to_env();
        let back = ContainerSpec::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(spec, back);
    }

    #[test]
    fn missing_key_names_the_key() {
        let spec = sample();
        let env: Vec<_> = spec
            .to_env()
            .into_iter()
            .filter(|(k, _)| *k != ENV_VETH)
            .collect();
        let err = ContainerSpec::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, CaskError::MissingParam { key: ENV_VETH }));
    }

    #[test]
    fn empty_volumes_are_allowed() {
        let mut spec = sample();
        spec.volumes.clear();
        let env = spec.to_env();
        let back = ContainerSpec::from_lookup(lookup_from(&env)).unwrap();
        assert!(back.volumes.is_empty());
    }

    #[test]
    fn bad_address_is_a_config_error() {
        let spec = sample();
        let env: Vec<_> = spec
            .to_env()
            .into_iter()
            .map(|(k, v)| {
                if k == ENV_CIP {
                    (k, "not-an-ip".to_string())
                } else {
                    (k, v)
                }
            })
            .collect();
        let err = ContainerSpec::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, CaskError::Config { .. }));
    }
}
