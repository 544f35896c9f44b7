//! Common error types for the Cask launcher.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`CaskError`].
pub type CaskResult<T> = Result<T, CaskError>;

/// Errors produced across the Cask workspace.
///
/// The variants follow the run's failure taxonomy: host-side setup failures,
/// handshake timeouts, and failures inside the container init process. None of
/// them trigger cleanup of host resources created earlier in the run; bridge,
/// veth, and firewall state outlives a failed run and must be removed by hand.
#[derive(Error, Diagnostic, Debug)]
pub enum CaskError {
    /// A host-side setup operation failed.
    #[error("Setup step failed: {step}")]
    #[diagnostic(code(cask::setup))]
    Setup {
        /// Description of the failing step.
        step: String,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// The container child process could not be created.
    #[error("Failed to launch container process")]
    #[diagnostic(
        code(cask::launch),
        help("Cask re-executes itself under unshare(1); check that unshare is installed")
    )]
    Launch {
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// A bounded polling loop exhausted its retry budget.
    #[error("Timed out waiting for {what} after {attempts} attempts")]
    #[diagnostic(
        code(cask::timeout),
        help("The namespace handoff has exactly one valid outcome per attempt; a timeout is fatal")
    )]
    Timeout {
        /// What the loop was waiting for.
        what: String,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A step of the in-namespace init sequence failed.
    #[error("Container init step failed: {step}")]
    #[diagnostic(code(cask::init))]
    Init {
        /// Description of the failing step.
        step: String,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// A required key was absent from the container parameter channel.
    #[error("Missing container parameter: {key}")]
    #[diagnostic(
        code(cask::missing_param),
        help("The init role is only ever invoked by the launcher; do not run it by hand")
    )]
    MissingParam {
        /// The absent environment key.
        key: &'static str,
    },

    /// Invalid configuration or user input.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cask::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(cask::io))]
    Io(#[from] std::io::Error),
}

impl CaskError {
    /// Wrap an I/O error as a host-side setup failure.
    pub fn setup(step: impl Into<String>, source: std::io::Error) -> Self {
        CaskError::Setup {
            step: step.into(),
            source,
        }
    }

    /// Wrap an I/O error as a container-init failure.
    pub fn init(step: impl Into<String>, source: std::io::Error) -> Self {
        CaskError::Init {
            step: step.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CaskError::Timeout {
            what: "child network namespace".to_string(),
            attempts: 50,
        };
        assert_eq!(
            err.to_string(),
            "Timed out waiting for child network namespace after 50 attempts"
        );
    }

    #[test]
    fn missing_param_names_key() {
        let err = CaskError::MissingParam { key: "ROOTFS" };
        assert!(err.to_string().contains("ROOTFS"));
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CaskError = io_err.into();
        assert!(matches!(err, CaskError::Io(_)));
    }
}
