//! Host-to-container volume mappings.

use std::path::{Path, PathBuf};

use cask_common::{CaskError, CaskResult};

use super::mounts;

/// A host path bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    /// Path on the host.
    pub source: PathBuf,
    /// Absolute path inside the container.
    pub target: PathBuf,
}

impl VolumeMount {
    /// Parse a `host:container` segment.
    ///
    /// # Errors
    ///
    /// Returns a config error unless the segment is exactly two non-empty
    /// colon-separated paths.
    pub fn parse(segment: &str) -> CaskResult<Self> {
        let mut fields = segment.split(':');
        let (Some(source), Some(target), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(CaskError::Config {
                message: format!("invalid volume mapping: {segment}"),
            });
        };
        if source.is_empty() || target.is_empty() {
            return Err(CaskError::Config {
                message: format!("invalid volume mapping: {segment}"),
            });
        }

        Ok(Self {
            source: PathBuf::from(source),
            target: PathBuf::from(target),
        })
    }

    /// Parse a `;`-separated mapping list, preserving order.
    ///
    /// Empty segments are skipped; a malformed segment fails the whole parse
    /// so nothing is ever mounted from a partially-valid list.
    pub fn parse_list(spec: &str) -> CaskResult<Vec<Self>> {
        spec.split(';')
            .filter(|segment| !segment.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Encode a mapping list back into the channel format.
    #[must_use]
    pub fn encode_list(mounts: &[Self]) -> String {
        mounts
            .iter()
            .map(|m| format!("{}:{}", m.source.display(), m.target.display()))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// The mount target resolved under a rootfs.
    #[must_use]
    pub fn target_under(&self, rootfs: &Path) -> PathBuf {
        rootfs.join(self.target.strip_prefix("/").unwrap_or(&self.target))
    }
}

/// Bind-mount every mapping into the rootfs, in list order.
///
/// Creates missing target directories. Runs inside the container's mount
/// namespace; a failure aborts the init.
pub fn mount_all(rootfs: &Path, volumes: &[VolumeMount]) -> std::io::Result<()> {
    for volume in volumes {
        let target = volume.target_under(rootfs);
        std::fs::create_dir_all(&target)?;
        mounts::bind(&volume.source, &target)?;

        tracing::debug!(
            source = %volume.source.display(),
            target = %target.display(),
            "volume mounted"
        );
    }
    Ok(())
}
