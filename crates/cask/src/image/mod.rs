//! The image-store boundary.
//!
//! The run orchestration only needs a populated rootfs directory before it
//! starts; this module is the collaborator that produces one. An image is a
//! directory under the store root holding a `layer.tar` (optionally
//! gzip-compressed) that gets unpacked into the per-container rootfs. How the
//! layer got there (registry pull, build, `tar -c` by hand) is outside the
//! core's concern.

use std::path::{Path, PathBuf};

use cask_common::{CaskError, CaskResult};

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Local store of extracted-ready image layers.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open a store rooted at a directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of an image's base layer tarball.
    #[must_use]
    pub fn layer_path(&self, image: &str) -> PathBuf {
        self.root.join(image).join("layer.tar")
    }

    /// List the images present in the store.
    pub fn list(&self) -> CaskResult<Vec<String>> {
        let mut images = Vec::new();
        if !self.root.exists() {
            return Ok(images);
        }

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if entry.path().join("layer.tar").exists() {
                images.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        images.sort();
        Ok(images)
    }

    /// Unpack an image's base layer into a rootfs directory.
    ///
    /// Compression is detected from magic bytes, not the file name, matching
    /// how registry layers arrive. Permissions are preserved.
    pub fn unpack(&self, image: &str, rootfs: &Path) -> CaskResult<()> {
        let layer = self.layer_path(image);
        if !layer.exists() {
            return Err(CaskError::Config {
                message: format!("image not found in store: {image}"),
            });
        }

        tracing::info!(image, layer = %layer.display(), rootfs = %rootfs.display(), "extracting base layer");

        let data = std::fs::File::open(&layer)
            .map_err(|e| CaskError::setup("open base layer", e))?;
        let mut header = [0u8; 2];
        let compressed = {
            use std::io::Read;
            let mut probe = std::fs::File::open(&layer)
                .map_err(|e| CaskError::setup("open base layer", e))?;
            probe.read_exact(&mut header).is_ok() && header == GZIP_MAGIC
        };

        let reader: Box<dyn std::io::Read> = if compressed {
            Box::new(flate2::read::GzDecoder::new(data))
        } else {
            Box::new(data)
        };

        let mut archive = tar::Archive::new(reader);
        archive.set_preserve_permissions(true);
        archive
            .unpack(rootfs)
            .map_err(|e| CaskError::setup("extract base layer", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_image(image: &str) -> (tempfile::TempDir, ImageStore) {
        let temp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(temp.path());

        let image_dir = temp.path().join(image);
        std::fs::create_dir_all(&image_dir).unwrap();

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "etc/os-release", &b"cask\n"[..])
            .unwrap();
        let bytes = builder.into_inner().unwrap();
        std::fs::write(image_dir.join("layer.tar"), bytes).unwrap();

        (temp, store)
    }

    #[test]
    fn unpack_populates_rootfs() {
        let (temp, store) = store_with_image("alpine");
        let rootfs = temp.path().join("rootfs");
        std::fs::create_dir_all(&rootfs).unwrap();

        store.unpack("alpine", &rootfs).unwrap();
        assert!(rootfs.join("etc/os-release").exists());
    }

    #[test]
    fn unknown_image_is_a_config_error() {
        let temp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(temp.path());
        let err = store.unpack("missing", temp.path()).unwrap_err();
        assert!(matches!(err, CaskError::Config { .. }));
    }

    #[test]
    fn list_reports_only_complete_images() {
        let (temp, store) = store_with_image("alpine");
        // A directory without a layer is not an image
        std::fs::create_dir_all(temp.path().join("half-pulled")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpine".to_string()]);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let store = ImageStore::new("/nonexistent/cask-store");
        assert!(store.list().unwrap().is_empty());
    }
}
