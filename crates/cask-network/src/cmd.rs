//! External command execution for link and firewall setup.
//!
//! Mirrors what `ip(8)` and `iptables(8)` would be invoked with by hand; the
//! callers wrap failures with their own step descriptions.

use std::process::Command;

/// Run a command, mapping a non-zero exit into an `io::Error`.
pub fn run(program: &str, args: &[&str]) -> std::io::Result<()> {
    tracing::debug!(program, ?args, "running");

    let status = Command::new(program).args(args).status()?;
    if !status.success() {
        return Err(std::io::Error::other(format!(
            "{program} {} exited with {status}",
            args.join(" ")
        )));
    }
    Ok(())
}

/// Run a command and report only whether it succeeded.
///
/// Used for existence probes and for polling attempts where failure is an
/// expected outcome, not an error.
pub fn succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_reports_nonzero_exit() {
        let err = run("false", &[]).unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[test]
    fn succeeds_on_true_command() {
        assert!(succeeds("true", &[]));
        assert!(!succeeds("false", &[]));
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(run("cask-no-such-program-12345", &[]).is_err());
        assert!(!succeeds("cask-no-such-program-12345", &[]));
    }
}
