// src/config.rs

use std::time::Duration;

/// Runtime knobs for the scan engine.
///
/// The two operator-facing values (concurrency ceiling and wall-clock
/// timeout) can come from the environment; the sub-step timeouts are fixed
/// characteristics of the probes and only change in tests.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum number of scans held concurrently across all identities.
    pub max_concurrent_scans: usize,
    /// Wall-clock deadline for one full scan.
    pub scan_timeout: Duration,
    /// Timeout for the single HTTP header fetch.
    pub http_timeout: Duration,
    /// Per-port TCP connect timeout.
    pub probe_timeout: Duration,
    /// How long to wait for a service banner on an open port.
    pub banner_timeout: Duration,
    /// Timeout for the TLS handshake against port 443.
    pub tls_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scans: 3,
            scan_timeout: Duration::from_secs(300),
            http_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
            banner_timeout: Duration::from_secs(2),
            tls_timeout: Duration::from_secs(10),
        }
    }
}

impl ScanConfig {
    /// Builds a config from `MAX_CONCURRENT_SCANS` and `SCAN_TIMEOUT`
    /// (seconds), falling back to the defaults for unset or unparseable
    /// values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_concurrent_scans = std::env::var("MAX_CONCURRENT_SCANS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_concurrent_scans);
        let scan_timeout = std::env::var("SCAN_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.scan_timeout);
        Self {
            max_concurrent_scans,
            scan_timeout,
            ..defaults
        }
    }
}
