//! Port forwarding into containers.
//!
//! Each mapping becomes one DNAT rule on the host's nat PREROUTING chain.
//! Rules are appended only; nothing removes them when the container exits,
//! and the same mapping requested twice is installed twice.

use std::net::Ipv4Addr;

use cask_common::{CaskError, CaskResult};

use crate::cmd;

/// A single host-to-container port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    /// Port on the host.
    pub host: u16,
    /// Port inside the container.
    pub container: u16,
}

impl PortMapping {
    /// Parse a `host:container` segment.
    ///
    /// # Errors
    ///
    /// Returns a config error unless the segment is exactly two
    /// colon-separated port numbers.
    pub fn parse(segment: &str) -> CaskResult<Self> {
        let mut fields = segment.split(':');
        let (Some(host), Some(container), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(CaskError::Config {
                message: format!("invalid port mapping: {segment}"),
            });
        };

        let host = host.parse().map_err(|_| CaskError::Config {
            message: format!("invalid host port in mapping: {segment}"),
        })?;
        let container = container.parse().map_err(|_| CaskError::Config {
            message: format!("invalid container port in mapping: {segment}"),
        })?;

        Ok(Self { host, container })
    }

    /// Append the DNAT rule forwarding this mapping to `ip`.
    async fn install(self, ip: Ipv4Addr) -> CaskResult<()> {
        tracing::debug!(host = self.host, container = self.container, %ip, "adding port forward");

        cmd::run(
            "iptables",
            &[
                "-t",
                "nat",
                "-A",
                "PREROUTING",
                "-p",
                "tcp",
                "--dport",
                &self.host.to_string(),
                "-j",
                "DNAT",
                "--to-destination",
                &format!("{}:{}", ip, self.container),
            ],
        )
        .map_err(|e| CaskError::setup("add port forward", e))
    }
}

/// Install forwarding rules for a `;`-separated mapping list.
///
/// Segments are parsed and installed in order; an empty segment is skipped.
/// The first malformed segment fails the call immediately; mappings earlier
/// in the list may already be installed at that point and are not rolled
/// back.
pub async fn install(ip: Ipv4Addr, mappings: &str) -> CaskResult<()> {
    for segment in mappings.split(';') {
        if segment.is_empty() {
            continue;
        }
        PortMapping::parse(segment)?.install(ip).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_mapping() {
        let m = PortMapping::parse("8080:80").unwrap();
        assert_eq!(m, PortMapping { host: 8080, container: 80 });
    }

    #[test]
    fn rejects_missing_separator() {
        let err = PortMapping::parse("8080").unwrap_err();
        assert!(err.to_string().contains("8080"));
    }

    #[test]
    fn rejects_extra_fields() {
        assert!(PortMapping::parse("1:2:3").is_err());
    }

    #[test]
    fn rejects_non_numeric_ports() {
        assert!(PortMapping::parse("http:80").is_err());
        assert!(PortMapping::parse("8080:www").is_err());
    }

    #[tokio::test]
    async fn malformed_list_installs_nothing() {
        // The malformed segment is rejected at parse time, before any
        // iptables invocation for it.
        let err = install(Ipv4Addr::new(10, 200, 0, 37), "8080")
            .await
            .unwrap_err();
        assert!(matches!(err, CaskError::Config { .. }));
    }

    #[tokio::test]
    async fn empty_list_is_a_no_op() {
        install(Ipv4Addr::new(10, 200, 0, 37), "").await.unwrap();
        install(Ipv4Addr::new(10, 200, 0, 37), ";;").await.unwrap();
    }
}
