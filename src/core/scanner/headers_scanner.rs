// src/core/scanner/headers_scanner.rs

use tracing::{debug, error, info, warn};

use crate::config::ScanConfig;
use crate::core::models::{HeaderStatus, SecurityHeaders};
use std::collections::HashMap;

/// Fetches the response headers for the target with a single GET.
///
/// The fetch is opportunistic: redirects are followed, certificate errors are
/// ignored (header collection, not trust verification), and any network
/// failure degrades to an empty map rather than failing the scan.
pub async fn fetch_http_headers(raw_target: &str, config: &ScanConfig) -> HashMap<String, String> {
    let url = if raw_target.starts_with("http://") || raw_target.starts_with("https://") {
        raw_target.to_string()
    } else {
        format!("http://{}", raw_target)
    };
    info!(url = %url, "Starting HTTP header fetch.");

    let client = match reqwest::Client::builder()
        .user_agent("PerimeterScan/0.1")
        .timeout(config.http_timeout)
        .danger_accept_invalid_certs(true)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client for header fetch.");
            return HashMap::new();
        }
    };

    match client.get(&url).send().await {
        Ok(response) => {
            debug!(status = %response.status(), "Received HTTP response.");
            let mut headers = HashMap::new();
            for (name, value) in response.headers() {
                if let Ok(v) = value.to_str() {
                    headers.insert(name.as_str().to_lowercase(), v.to_string());
                }
            }
            info!(count = headers.len(), "HTTP header fetch finished.");
            headers
        }
        Err(e) => {
            warn!(url = %url, error = %e, "HTTP header fetch failed, continuing without headers.");
            HashMap::new()
        }
    }
}

/// Classifies the seven tracked security headers as present or missing.
///
/// Pure function over the raw (lowercased) header map; the result always
/// carries all seven entries.
pub fn analyze_security_headers(raw: &HashMap<String, String>) -> SecurityHeaders {
    let status = |name: &str| match raw.get(name) {
        Some(value) => HeaderStatus::Present(value.clone()),
        None => HeaderStatus::Missing,
    };

    SecurityHeaders {
        strict_transport_security: status("strict-transport-security"),
        x_frame_options: status("x-frame-options"),
        x_content_type_options: status("x-content-type-options"),
        content_security_policy: status("content-security-policy"),
        x_xss_protection: status("x-xss-protection"),
        referrer_policy: status("referrer-policy"),
        permissions_policy: status("permissions-policy"),
    }
}
