// src/core/scanner/mod.rs

// Public interface of the `scanner` module: the probing stages plus the
// pipeline that composes them into a report.
pub mod headers_scanner;
pub mod port_scanner;
pub mod resolver;
pub mod tls_scanner;

use self::headers_scanner::{analyze_security_headers, fetch_http_headers};
use self::port_scanner::run_port_scan;
use self::resolver::resolve_target;
use self::tls_scanner::run_tls_scan;
use crate::config::ScanConfig;
use crate::core::knowledge_base::DNS_RESOLUTION_FAILED;
use crate::core::models::{PortState, ScanReport, SecurityHeaders};
use crate::core::rules::{self, ScanFindings};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};

/// Runs the full assessment pipeline for one target and aggregates the
/// findings into a `ScanReport`.
///
/// Resolution failure is the only terminal condition and short-circuits to a
/// synthetic single-vulnerability report. Every later stage absorbs its own
/// failures into degraded output, so this function always produces a report.
/// The caller (normally the controller) is responsible for the wall-clock
/// deadline.
pub async fn run_full_scan(raw_target: &str, config: &ScanConfig) -> ScanReport {
    info!(target = raw_target, "Starting full scan.");

    let target = match resolve_target(raw_target).await {
        Ok(target) => target,
        Err(e) => {
            warn!(target = raw_target, error = %e, "Resolution failed, short-circuiting scan.");
            return resolution_failure_report(raw_target);
        }
    };

    // Port probing and the HTTP fetch are independent; run them together.
    let (ports, http_headers) = tokio::join!(
        run_port_scan(target.ip, config),
        fetch_http_headers(raw_target, config)
    );
    let security_headers = analyze_security_headers(&http_headers);

    // TLS inspection is gated on the port scanner reporting 443 open.
    let https_open = ports
        .iter()
        .any(|p| p.port == 443 && p.state == PortState::Open);
    let tls = if https_open {
        Some(run_tls_scan(&target.host, config).await)
    } else {
        None
    };

    let findings = ScanFindings {
        ports: &ports,
        security_headers: &security_headers,
        http_headers: &http_headers,
        tls: tls.as_ref(),
    };
    let vulnerabilities = rules::identify_vulnerabilities(&findings);
    let risk_score = rules::calculate_risk_score(&vulnerabilities);

    info!(
        host = %target.host,
        vulnerabilities = vulnerabilities.len(),
        risk_score,
        "Full scan finished."
    );

    ScanReport {
        raw_target: target.raw,
        host: target.host,
        ip: Some(target.ip),
        timestamp: Utc::now(),
        ports,
        http_headers,
        security_headers,
        tls,
        vulnerabilities,
        risk_score,
    }
}

/// Synthesizes the report for an unresolvable target: one HIGH "DNS
/// Resolution" vulnerability, everything else empty.
fn resolution_failure_report(raw_target: &str) -> ScanReport {
    let host = resolver::extract_host(raw_target).unwrap_or_else(|| raw_target.to_string());
    let vulnerabilities = vec![rules::build_vulnerability(
        &DNS_RESOLUTION_FAILED,
        "Unable to resolve hostname".to_string(),
        "Verify the domain name is correct".to_string(),
    )];
    let risk_score = rules::calculate_risk_score(&vulnerabilities);

    ScanReport {
        raw_target: raw_target.to_string(),
        host,
        ip: None,
        timestamp: Utc::now(),
        ports: Vec::new(),
        http_headers: HashMap::new(),
        security_headers: SecurityHeaders::default(),
        tls: None,
        vulnerabilities,
        risk_score,
    }
}
