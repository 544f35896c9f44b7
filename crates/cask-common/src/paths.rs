//! Standard filesystem paths for Cask.

use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::id::ContainerIdentity;

/// Base directory for per-container working directories.
///
/// Defaults to a temp-filesystem location to avoid permission quirks on
/// shared or network-backed mounts (e.g. macOS host paths inside a Lima VM
/// with root-squash semantics).
pub static CASK_CONTAINERS_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("CASK_CONTAINERS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("cask").join("containers"))
});

/// Base directory for the local image store.
pub static CASK_IMAGES_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("CASK_IMAGES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("images"))
});

/// Standard paths used by the Cask runtime.
#[derive(Debug, Clone)]
pub struct CaskPaths {
    /// Root for per-container working directories.
    pub containers: PathBuf,
    /// Root of the local image store.
    pub images: PathBuf,
}

impl CaskPaths {
    /// Create paths with default (environment-overridable) locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom containers root.
    #[must_use]
    pub fn with_containers_root(root: impl Into<PathBuf>) -> Self {
        Self {
            containers: root.into(),
            images: CASK_IMAGES_DIR.clone(),
        }
    }

    /// Working directory for a container.
    #[must_use]
    pub fn container(&self, id: &ContainerIdentity) -> PathBuf {
        self.containers.join(id.as_str())
    }

    /// Rootfs directory for a container.
    #[must_use]
    pub fn container_rootfs(&self, id: &ContainerIdentity) -> PathBuf {
        self.container(id).join("rootfs")
    }

    /// Metadata record for a container.
    #[must_use]
    pub fn container_record(&self, id: &ContainerIdentity) -> PathBuf {
        self.container(id).join("container.json")
    }

    /// Marker file the container init bind-mounts its netns handle onto.
    ///
    /// Lives under /var/run so it survives independently of the child's pid;
    /// pids are recycled, the bind-mounted handle is not.
    #[must_use]
    pub fn netns_marker(id: &ContainerIdentity) -> PathBuf {
        PathBuf::from(format!("/var/run/cask-{}.ns", id.as_str()))
    }
}

impl Default for CaskPaths {
    fn default() -> Self {
        Self {
            containers: CASK_CONTAINERS_DIR.clone(),
            images: CASK_IMAGES_DIR.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_paths_under_root() {
        let paths = CaskPaths::with_containers_root("/tmp/cask-test");
        let id = ContainerIdentity::from_pid(42);
        assert_eq!(
            paths.container_rootfs(&id),
            PathBuf::from("/tmp/cask-test").join(id.as_str()).join("rootfs")
        );
    }

    #[test]
    fn netns_marker_uses_full_token() {
        let id = ContainerIdentity::from_pid(42);
        let marker = CaskPaths::netns_marker(&id);
        assert_eq!(
            marker,
            PathBuf::from(format!("/var/run/cask-{}.ns", id.as_str()))
        );
    }
}
