//! Filesystem operations for container setup.

pub mod mounts;
pub mod pivot;
pub mod volume;

pub use volume::VolumeMount;
