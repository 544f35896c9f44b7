//! Root switch via pivot_root.

use std::path::Path;

/// Pivot the process root onto `new_root`, parking the old root at `put_old`.
///
/// `new_root` must already be a mount point (the init bind-mounts the rootfs
/// onto itself for exactly this reason) and `put_old` must live underneath
/// it. After the pivot the caller still has to chdir to the new root and drop
/// the old one; this only performs the kernel operation.
#[cfg(target_os = "linux")]
pub fn pivot_root(new_root: &Path, put_old: &Path) -> std::io::Result<()> {
    tracing::debug!(
        new_root = %new_root.display(),
        put_old = %put_old.display(),
        "pivoting root"
    );

    rustix::process::pivot_root(new_root, put_old).map_err(std::io::Error::from)
}

/// Unsupported off Linux.
#[cfg(not(target_os = "linux"))]
pub fn pivot_root(_new_root: &Path, _put_old: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "pivot_root requires Linux",
    ))
}
