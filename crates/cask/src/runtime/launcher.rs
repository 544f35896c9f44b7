//! Container process launcher.
//!
//! New namespaces only take effect for the process that enters them, so the
//! child must be this same program re-invoked in its init role already inside
//! the namespaces. The re-exec goes through `unshare(1)`, which forks after
//! unsharing so the child lands as PID 1 of the new pid namespace, and the
//! spec travels through the inherited environment (see
//! [`crate::runtime::spec`]).

use std::process::{Child, Command};

use cask_common::{CaskError, CaskResult};

use super::spec::ContainerSpec;

/// Namespace set every container gets: pid, network, ipc, uts, mount, with
/// the new mount namespace flagged for a private /proc.
const UNSHARE_ARGS: &[&str] = &[
    "--fork",
    "--pid",
    "--net",
    "--ipc",
    "--uts",
    "--mount",
    "--mount-proc",
];

/// Spawn the container init in fresh namespaces.
///
/// Returns as soon as the child is started; the caller proceeds to the
/// namespace handshake while the child initializes. Stdio is inherited so
/// the container command talks to the user's terminal directly.
///
/// # Errors
///
/// `Launch` if the process cannot be created.
pub fn spawn_init(spec: &ContainerSpec) -> CaskResult<Child> {
    let self_exe =
        std::env::current_exe().map_err(|source| CaskError::Launch { source })?;

    tracing::info!(identity = %spec.identity, "starting container namespace");

    let mut command = Command::new("unshare");
    command.args(UNSHARE_ARGS).arg(&self_exe).arg("init");
    for (key, value) in spec.to_env() {
        command.env(key, value);
    }

    command
        .spawn()
        .map_err(|source| CaskError::Launch { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unshare_args_cover_required_namespaces() {
        for flag in ["--pid", "--net", "--ipc", "--uts", "--mount"] {
            assert!(UNSHARE_ARGS.contains(&flag));
        }
        // fork is what makes the child PID 1 of the new pid namespace
        assert!(UNSHARE_ARGS.contains(&"--fork"));
        assert!(UNSHARE_ARGS.contains(&"--mount-proc"));
    }
}
