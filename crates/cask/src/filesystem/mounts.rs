//! Mount operations used by the container init sequence.
//!
//! Thin wrappers over `rustix::mount`; callers attach their own step
//! descriptions when wrapping failures.

use std::path::Path;

/// Make a mount subtree private, recursively.
///
/// Applied to `/` before any other mount so nothing the init does propagates
/// back into the host's mount namespace.
#[cfg(target_os = "linux")]
pub fn make_rprivate(target: &Path) -> std::io::Result<()> {
    use rustix::mount::{MountPropagationFlags, mount_change};

    tracing::debug!(target = %target.display(), "making mounts recursively private");

    mount_change(
        target,
        MountPropagationFlags::PRIVATE | MountPropagationFlags::REC,
    )
    .map_err(std::io::Error::from)
}

/// Bind-mount a path onto a target.
#[cfg(target_os = "linux")]
pub fn bind(source: &Path, target: &Path) -> std::io::Result<()> {
    use rustix::mount::mount_bind;

    tracing::debug!(source = %source.display(), target = %target.display(), "bind mount");

    mount_bind(source, target).map_err(std::io::Error::from)
}

/// Recursively bind-mount a subtree onto a target.
#[cfg(target_os = "linux")]
pub fn rbind(source: &Path, target: &Path) -> std::io::Result<()> {
    use rustix::mount::mount_bind_recursive;

    tracing::debug!(source = %source.display(), target = %target.display(), "recursive bind mount");

    mount_bind_recursive(source, target).map_err(std::io::Error::from)
}

/// Mount a fresh procfs at a target.
#[cfg(target_os = "linux")]
pub fn mount_proc(target: &Path) -> std::io::Result<()> {
    use rustix::mount::{MountFlags, mount};

    tracing::debug!(target = %target.display(), "mounting proc");

    mount("proc", target, "proc", MountFlags::empty(), c"").map_err(std::io::Error::from)
}

/// Lazily unmount a target (detach now, release when unused).
#[cfg(target_os = "linux")]
pub fn unmount_lazy(target: &Path) -> std::io::Result<()> {
    use rustix::mount::{UnmountFlags, unmount};

    tracing::debug!(target = %target.display(), "lazy unmount");

    unmount(target, UnmountFlags::DETACH).map_err(std::io::Error::from)
}

#[cfg(not(target_os = "linux"))]
mod unsupported {
    use std::path::Path;

    fn unsupported() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Unsupported, "requires Linux")
    }

    /// Unsupported off Linux.
    pub fn make_rprivate(_target: &Path) -> std::io::Result<()> {
        Err(unsupported())
    }

    /// Unsupported off Linux.
    pub fn bind(_source: &Path, _target: &Path) -> std::io::Result<()> {
        Err(unsupported())
    }

    /// Unsupported off Linux.
    pub fn rbind(_source: &Path, _target: &Path) -> std::io::Result<()> {
        Err(unsupported())
    }

    /// Unsupported off Linux.
    pub fn mount_proc(_target: &Path) -> std::io::Result<()> {
        Err(unsupported())
    }

    /// Unsupported off Linux.
    pub fn unmount_lazy(_target: &Path) -> std::io::Result<()> {
        Err(unsupported())
    }
}

#[cfg(not(target_os = "linux"))]
pub use unsupported::*;
