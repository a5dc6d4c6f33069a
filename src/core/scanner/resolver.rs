// src/core/scanner/resolver.rs

use tracing::{debug, info};

use crate::core::models::ScanTarget;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use url::Url;

/// Extracts the host component from a user-supplied target string.
///
/// Inputs without a scheme are prefixed with `http://` before parsing, so
/// "example.com", "example.com/login" and "https://example.com:8443/x" all
/// normalize to their bare host. Returns `None` when no host can be parsed.
pub fn extract_host(raw: &str) -> Option<String> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    let url = Url::parse(&with_scheme).ok()?;
    url.host_str().map(str::to_string)
}

/// Normalizes the raw target and resolves it to an address.
///
/// The first resolved address wins (IPv4 or IPv6). Resolution failures are
/// terminal for a scan and reported as the error message; there are no
/// retries, since a failure is assumed persistent within the scan window.
pub async fn resolve_target(raw: &str) -> Result<ScanTarget, String> {
    let host = extract_host(raw)
        .ok_or_else(|| format!("Could not extract a host from '{}'", raw))?;

    debug!(host = %host, "Resolving target host.");
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let lookup = resolver
        .lookup_ip(host.as_str())
        .await
        .map_err(|e| format!("Unable to resolve hostname: {}", e))?;

    let ip = lookup
        .iter()
        .next()
        .ok_or_else(|| "Unable to resolve hostname: no addresses returned".to_string())?;

    info!(host = %host, ip = %ip, "Target resolved.");
    Ok(ScanTarget {
        raw: raw.to_string(),
        host,
        ip,
    })
}
