// src/core/rules.rs

//! The vulnerability rule engine and the risk scorer.
//!
//! Both are pure functions over an immutable snapshot of scan findings: no
//! I/O, no shared state, and every rule is evaluated independently — one rule
//! firing never suppresses another. Report order is the canonical rule order
//! below, never severity order.

use tracing::debug;

use crate::core::knowledge_base::{
    FindingDetail, HEADER_MISSING, NO_HTTPS, PORT_RISKY_OPEN, SERVER_BANNER_DISCLOSURE, TLS_ISSUE,
};
use crate::core::models::{PortRecord, PortState, SecurityHeaders, TlsOutcome, Vulnerability};
use std::collections::HashMap;

/// Ports whose exposure is flagged regardless of the service behind them.
pub const RISKY_PORTS: [u16; 4] = [21, 23, 25, 3389];

/// Server products whose banner disclosure is flagged.
const DISCLOSED_PRODUCTS: [&str; 3] = ["apache", "nginx", "iis"];

/// Immutable snapshot of everything the probing stages produced. The rule
/// engine borrows it; nothing here is mutated.
pub struct ScanFindings<'a> {
    pub ports: &'a [PortRecord],
    pub security_headers: &'a SecurityHeaders,
    /// Raw HTTP response headers, names lowercased.
    pub http_headers: &'a HashMap<String, String>,
    pub tls: Option<&'a TlsOutcome>,
}

/// Builds a vulnerability from a catalog entry plus instance-specific text.
pub fn build_vulnerability(
    detail: &'static FindingDetail,
    description: String,
    recommendation: String,
) -> Vulnerability {
    Vulnerability {
        kind: detail.title.to_string(),
        severity: detail.severity,
        description,
        recommendation,
    }
}

/// Evaluates all rules over the findings snapshot, in canonical order.
///
/// An empty snapshot (no ports, empty headers, no TLS outcome) yields an
/// empty list.
pub fn identify_vulnerabilities(findings: &ScanFindings<'_>) -> Vec<Vulnerability> {
    let mut vulnerabilities = Vec::new();
    check_risky_ports(findings, &mut vulnerabilities);
    check_missing_headers(findings, &mut vulnerabilities);
    check_tls_issue(findings, &mut vulnerabilities);
    check_https_support(findings, &mut vulnerabilities);
    check_server_banner(findings, &mut vulnerabilities);
    debug!(count = vulnerabilities.len(), "Rule evaluation finished.");
    vulnerabilities
}

/// Rule 1: one MEDIUM finding per open port in the risky set.
fn check_risky_ports(findings: &ScanFindings<'_>, out: &mut Vec<Vulnerability>) {
    for record in findings.ports {
        if record.state == PortState::Open && RISKY_PORTS.contains(&record.port) {
            out.push(build_vulnerability(
                &PORT_RISKY_OPEN,
                format!("Port {} ({}) is open", record.port, record.service),
                format!("Consider closing port {} if not required", record.port),
            ));
        }
    }
}

/// Rule 2: one MEDIUM finding per missing critical header.
fn check_missing_headers(findings: &ScanFindings<'_>, out: &mut Vec<Vulnerability>) {
    for (name, status) in findings.security_headers.critical() {
        if status.is_missing() {
            out.push(build_vulnerability(
                &HEADER_MISSING,
                format!("{} header is not set", name),
                format!("Implement {} to enhance security", name),
            ));
        }
    }
}

/// Rule 3: one HIGH finding when the TLS inspection recorded an error.
fn check_tls_issue(findings: &ScanFindings<'_>, out: &mut Vec<Vulnerability>) {
    if findings.tls.is_some_and(|tls| tls.is_failed()) {
        out.push(build_vulnerability(
            &TLS_ISSUE,
            "SSL/TLS certificate validation failed".to_string(),
            TLS_ISSUE.remediation.to_string(),
        ));
    }
}

/// Rule 4: one HIGH finding when port 80 is open but 443 is not.
fn check_https_support(findings: &ScanFindings<'_>, out: &mut Vec<Vulnerability>) {
    let port_open = |port: u16| {
        findings
            .ports
            .iter()
            .any(|p| p.port == port && p.state == PortState::Open)
    };
    if port_open(80) && !port_open(443) {
        out.push(build_vulnerability(
            &NO_HTTPS,
            "Website does not support HTTPS".to_string(),
            NO_HTTPS.remediation.to_string(),
        ));
    }
}

/// Rule 5: one LOW finding when the Server header discloses a known product.
fn check_server_banner(findings: &ScanFindings<'_>, out: &mut Vec<Vulnerability>) {
    let Some(server) = findings.http_headers.get("server") else {
        return;
    };
    let lowered = server.to_lowercase();
    if DISCLOSED_PRODUCTS.iter().any(|p| lowered.contains(p)) {
        out.push(build_vulnerability(
            &SERVER_BANNER_DISCLOSURE,
            format!("Server banner reveals: {}", server),
            SERVER_BANNER_DISCLOSURE.remediation.to_string(),
        ));
    }
}

/// Reduces a vulnerability list to a single bounded score:
/// `min(100, sum of severity weights)`. Deterministic and order-independent.
pub fn calculate_risk_score(vulnerabilities: &[Vulnerability]) -> u8 {
    let total: u32 = vulnerabilities.iter().map(|v| v.severity.weight()).sum();
    total.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{HeaderStatus, Severity, TlsDetails};
    use chrono::Utc;

    fn open_port(port: u16, service: &str) -> PortRecord {
        PortRecord {
            port,
            state: PortState::Open,
            service: service.to_string(),
            product: None,
            version: None,
        }
    }

    fn empty_findings<'a>(
        ports: &'a [PortRecord],
        headers: &'a SecurityHeaders,
        raw: &'a HashMap<String, String>,
    ) -> ScanFindings<'a> {
        ScanFindings {
            ports,
            security_headers: headers,
            http_headers: raw,
            tls: None,
        }
    }

    fn present_headers() -> SecurityHeaders {
        SecurityHeaders {
            strict_transport_security: HeaderStatus::Present("max-age=63072000".into()),
            x_frame_options: HeaderStatus::Present("DENY".into()),
            x_content_type_options: HeaderStatus::Present("nosniff".into()),
            content_security_policy: HeaderStatus::Present("default-src 'self'".into()),
            x_xss_protection: HeaderStatus::Present("1; mode=block".into()),
            referrer_policy: HeaderStatus::Present("no-referrer".into()),
            permissions_policy: HeaderStatus::Present("geolocation=()".into()),
        }
    }

    fn vuln(severity: Severity) -> Vulnerability {
        Vulnerability {
            kind: "test".into(),
            severity,
            description: String::new(),
            recommendation: String::new(),
        }
    }

    #[test]
    fn empty_input_yields_no_vulnerabilities() {
        let raw = HashMap::new();
        let headers = present_headers();
        let findings = empty_findings(&[], &headers, &raw);
        assert!(identify_vulnerabilities(&findings).is_empty());
    }

    #[test]
    fn risky_ports_raise_one_medium_each() {
        let ports = vec![
            open_port(21, "ftp"),
            open_port(22, "ssh"),
            open_port(23, "telnet"),
            open_port(443, "https"),
        ];
        let raw = HashMap::new();
        let headers = present_headers();
        let findings = empty_findings(&ports, &headers, &raw);
        let vulns = identify_vulnerabilities(&findings);
        assert_eq!(vulns.len(), 2);
        assert!(vulns.iter().all(|v| v.severity == Severity::Medium));
        assert_eq!(vulns[0].description, "Port 21 (ftp) is open");
        assert_eq!(vulns[1].description, "Port 23 (telnet) is open");
    }

    #[test]
    fn closed_risky_port_does_not_fire() {
        let ports = vec![PortRecord {
            port: 23,
            state: PortState::Closed,
            service: "telnet".into(),
            product: None,
            version: None,
        }];
        let raw = HashMap::new();
        let headers = present_headers();
        let findings = empty_findings(&ports, &headers, &raw);
        assert!(identify_vulnerabilities(&findings).is_empty());
    }

    #[test]
    fn all_headers_missing_fires_exactly_four_times() {
        let raw = HashMap::new();
        let headers = SecurityHeaders::default();
        let ports = vec![open_port(443, "https")];
        let findings = empty_findings(&ports, &headers, &raw);
        let vulns = identify_vulnerabilities(&findings);
        // Only the four critical headers count; the other three tracked
        // headers never raise a finding on their own.
        assert_eq!(vulns.len(), 4);
        assert!(vulns.iter().all(|v| v.kind == "Missing Security Header"));
        assert_eq!(calculate_risk_score(&vulns), 12);
    }

    #[test]
    fn http_without_https_fires_once_high() {
        let ports = vec![open_port(80, "http")];
        let raw = HashMap::new();
        let headers = present_headers();
        let findings = empty_findings(&ports, &headers, &raw);
        let vulns = identify_vulnerabilities(&findings);
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].kind, "No HTTPS");
        assert_eq!(vulns[0].severity, Severity::High);
        assert_eq!(calculate_risk_score(&vulns), 5);
    }

    #[test]
    fn http_with_open_https_does_not_fire() {
        let ports = vec![open_port(80, "http"), open_port(443, "https")];
        let raw = HashMap::new();
        let headers = present_headers();
        let findings = empty_findings(&ports, &headers, &raw);
        assert!(identify_vulnerabilities(&findings).is_empty());
    }

    #[test]
    fn closed_443_still_counts_as_no_https() {
        let mut closed = open_port(443, "https");
        closed.state = PortState::Filtered;
        let ports = vec![open_port(80, "http"), closed];
        let raw = HashMap::new();
        let headers = present_headers();
        let findings = empty_findings(&ports, &headers, &raw);
        let vulns = identify_vulnerabilities(&findings);
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].kind, "No HTTPS");
    }

    #[test]
    fn tls_failure_raises_high_finding() {
        let raw = HashMap::new();
        let headers = present_headers();
        let tls = TlsOutcome::Failed {
            error: "handshake failed".into(),
        };
        let findings = ScanFindings {
            ports: &[],
            security_headers: &headers,
            http_headers: &raw,
            tls: Some(&tls),
        };
        let vulns = identify_vulnerabilities(&findings);
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].kind, "SSL/TLS Issue");
        assert_eq!(vulns[0].severity, Severity::High);
    }

    #[test]
    fn established_tls_raises_nothing() {
        let raw = HashMap::new();
        let headers = present_headers();
        let tls = TlsOutcome::Established(TlsDetails {
            protocol_version: "TLSv1.3".into(),
            cipher_suite: "TLS13_AES_256_GCM_SHA384".into(),
            valid_from: Utc::now(),
            valid_until: Utc::now(),
        });
        let findings = ScanFindings {
            ports: &[],
            security_headers: &headers,
            http_headers: &raw,
            tls: Some(&tls),
        };
        assert!(identify_vulnerabilities(&findings).is_empty());
    }

    #[test]
    fn server_banner_disclosure_is_case_insensitive_and_quotes_raw_value() {
        let mut raw = HashMap::new();
        raw.insert("server".to_string(), "Apache/2.4.57 (Debian)".to_string());
        let headers = present_headers();
        let findings = empty_findings(&[], &headers, &raw);
        let vulns = identify_vulnerabilities(&findings);
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].severity, Severity::Low);
        assert_eq!(
            vulns[0].description,
            "Server banner reveals: Apache/2.4.57 (Debian)"
        );
    }

    #[test]
    fn unknown_server_banner_does_not_fire() {
        let mut raw = HashMap::new();
        raw.insert("server".to_string(), "cloudflare".to_string());
        let headers = present_headers();
        let findings = empty_findings(&[], &headers, &raw);
        assert!(identify_vulnerabilities(&findings).is_empty());
    }

    #[test]
    fn rule_order_is_stable_not_severity_sorted() {
        // A risky port (MEDIUM) must precede the no-HTTPS finding (HIGH)
        // because rule 1 runs before rule 4.
        let ports = vec![open_port(21, "ftp"), open_port(80, "http")];
        let raw = HashMap::new();
        let headers = present_headers();
        let findings = empty_findings(&ports, &headers, &raw);
        let vulns = identify_vulnerabilities(&findings);
        assert_eq!(vulns.len(), 2);
        assert_eq!(vulns[0].kind, "Open Risky Port");
        assert_eq!(vulns[1].kind, "No HTTPS");
    }

    #[test]
    fn score_of_empty_list_is_zero() {
        assert_eq!(calculate_risk_score(&[]), 0);
    }

    #[test]
    fn score_sums_severity_weights() {
        let vulns = vec![
            vuln(Severity::Low),
            vuln(Severity::Medium),
            vuln(Severity::High),
            vuln(Severity::Critical),
        ];
        assert_eq!(calculate_risk_score(&vulns), 19);
    }

    #[test]
    fn score_is_invariant_under_permutation() {
        let mut vulns = vec![
            vuln(Severity::High),
            vuln(Severity::Low),
            vuln(Severity::Critical),
            vuln(Severity::Medium),
            vuln(Severity::Medium),
        ];
        let forward = calculate_risk_score(&vulns);
        vulns.reverse();
        assert_eq!(calculate_risk_score(&vulns), forward);
    }

    #[test]
    fn score_saturates_at_one_hundred() {
        let vulns: Vec<Vulnerability> = (0..15).map(|_| vuln(Severity::Critical)).collect();
        assert_eq!(calculate_risk_score(&vulns), 100);
    }
}
