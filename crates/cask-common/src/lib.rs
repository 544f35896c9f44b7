//! # cask-common
//!
//! Shared types for the Cask container launcher:
//! - Per-run container identity and the names derived from it
//! - Standard filesystem paths with environment overrides
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;

pub use error::{CaskError, CaskResult};
pub use id::ContainerIdentity;
pub use paths::CaskPaths;
