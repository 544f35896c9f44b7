//! Resolver configuration for the container rootfs.
//!
//! Containers cannot reach loopback-scoped resolvers on the host (the
//! systemd-resolved stub at 127.0.0.53 being the common case), so the host's
//! resolver list is filtered before being copied in, with public resolvers
//! appended as a reliable fallback.

use std::fmt::Write as _;
use std::path::Path;

use cask_common::{CaskError, CaskResult};

/// Public resolvers appended after the host's usable ones.
const FALLBACK_RESOLVERS: &[&str] = &["1.1.1.1", "8.8.8.8"];

/// Filter a host resolv.conf into one usable inside a container.
///
/// `nameserver` entries pointing at loopback are dropped, the rest are kept
/// in order and deduplicated by address, and the fallback resolvers are
/// appended. Non-nameserver lines (search domains, options) survive only if
/// at least one host nameserver did; a host list with nothing usable is
/// replaced wholesale by the fallbacks.
#[must_use]
pub fn filter_host_resolv(content: &str) -> String {
    let mut filtered = String::new();
    let mut seen: Vec<String> = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if let Some(rest) = line.strip_prefix("nameserver") {
            let Some(ns) = rest.split_whitespace().next() else {
                continue;
            };
            if ns.starts_with("127.") || ns == "::1" {
                continue;
            }
            if !seen.iter().any(|s| s == ns) {
                let _ = writeln!(filtered, "nameserver {ns}");
                seen.push(ns.to_string());
            }
        } else {
            filtered.push_str(raw);
            filtered.push('\n');
        }
    }

    for ns in FALLBACK_RESOLVERS {
        if seen.iter().any(|s| s == ns) {
            continue;
        }
        if seen.is_empty() {
            filtered.clear();
        }
        let _ = writeln!(filtered, "nameserver {ns}");
        seen.push((*ns).to_string());
    }

    filtered
}

/// Write a filtered copy of the host's resolver config into a rootfs.
///
/// Prefers the real resolver list behind the systemd-resolved stub when the
/// stub address is detected in /etc/resolv.conf.
pub fn write_into(rootfs: &Path) -> CaskResult<()> {
    let mut content = std::fs::read_to_string("/etc/resolv.conf")
        .map_err(|e| CaskError::setup("read host resolv.conf", e))?;

    if content.contains("127.0.0.53") {
        if let Ok(real) = std::fs::read_to_string("/run/systemd/resolve/resolv.conf") {
            if !real.is_empty() {
                content = real;
            }
        }
    }

    let filtered = filter_host_resolv(&content);

    let dst = rootfs.join("etc").join("resolv.conf");
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CaskError::setup("ensure etc dir", e))?;
    }
    std::fs::write(&dst, filtered)
        .map_err(|e| CaskError::setup("write container resolv.conf", e))?;

    tracing::debug!(path = %dst.display(), "wrote container resolv.conf");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_loopback_resolvers() {
        let out = filter_host_resolv("nameserver 127.0.0.53\nnameserver 192.168.1.1\n");
        assert!(!out.contains("127.0.0.53"));
        assert!(out.contains("nameserver 192.168.1.1"));
    }

    #[test]
    fn deduplicates_by_address() {
        let out = filter_host_resolv("nameserver 9.9.9.9\nnameserver 9.9.9.9\n");
        assert_eq!(out.matches("9.9.9.9").count(), 1);
    }

    #[test]
    fn appends_fallbacks_once() {
        let out = filter_host_resolv("nameserver 8.8.8.8\n");
        assert_eq!(out.matches("8.8.8.8").count(), 1);
        assert!(out.contains("nameserver 1.1.1.1"));
    }

    #[test]
    fn unusable_host_list_replaced_by_fallbacks() {
        let out = filter_host_resolv("search lan\nnameserver 127.0.0.1\n");
        assert_eq!(out, "nameserver 1.1.1.1\nnameserver 8.8.8.8\n");
    }

    #[test]
    fn keeps_other_lines_when_a_nameserver_survives() {
        let out = filter_host_resolv("search lan\nnameserver 192.168.1.1\n");
        assert!(out.contains("search lan"));
        assert!(out.contains("nameserver 192.168.1.1"));
    }

    #[test]
    fn writes_into_rootfs_etc() {
        let temp = tempfile::tempdir().unwrap();
        // write_into reads the host's real /etc/resolv.conf; only verify the
        // destination handling here.
        if write_into(temp.path()).is_ok() {
            assert!(temp.path().join("etc/resolv.conf").exists());
        }
    }
}
