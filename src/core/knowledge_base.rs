//! Static, read-only catalog of every finding the rule engine can raise.
//!
//! Each entry carries the machine-readable code, the report-facing kind name,
//! the fixed severity, and generic explanation/remediation text. The rule
//! engine references these entries directly so that severity and naming live
//! in exactly one place.

use crate::core::models::Severity;
use std::fmt;

/// High-level grouping for findings, used by rendering collaborators to
/// section a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// Name resolution and reachability.
    Network,
    /// Open ports and exposed services.
    Ports,
    /// HTTP response headers.
    Http,
    /// TLS handshake and certificate state.
    Tls,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Network => write!(f, "Network & DNS"),
            FindingCategory::Ports => write!(f, "Ports & Services"),
            FindingCategory::Http => write!(f, "HTTP Security Headers"),
            FindingCategory::Tls => write!(f, "SSL/TLS Configuration"),
        }
    }
}

/// Full static detail for one finding code.
pub struct FindingDetail {
    /// Unique machine-readable identifier (e.g. "PORT_RISKY_OPEN").
    pub code: &'static str,
    /// Report-facing kind name; becomes the vulnerability's `type`.
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    /// Generic explanation of why this class of finding matters.
    pub description: &'static str,
    /// Generic remediation guidance for this class of finding.
    pub remediation: &'static str,
}

pub static DNS_RESOLUTION_FAILED: FindingDetail = FindingDetail {
    code: "DNS_RESOLUTION_FAILED",
    title: "DNS Resolution",
    category: FindingCategory::Network,
    severity: Severity::High,
    description: "The supplied hostname could not be resolved to an IP address, so the target is unreachable and no further assessment is possible.",
    remediation: "Verify the domain name is correct and that its authoritative DNS records are published and reachable.",
};

pub static PORT_RISKY_OPEN: FindingDetail = FindingDetail {
    code: "PORT_RISKY_OPEN",
    title: "Open Risky Port",
    category: FindingCategory::Ports,
    severity: Severity::Medium,
    description: "A service commonly targeted by attackers (FTP, Telnet, SMTP relay, RDP) is accepting connections from the public internet.",
    remediation: "Close the port, restrict it to trusted networks, or replace the service with an encrypted alternative.",
};

pub static HEADER_MISSING: FindingDetail = FindingDetail {
    code: "HEADER_MISSING",
    title: "Missing Security Header",
    category: FindingCategory::Http,
    severity: Severity::Medium,
    description: "A security header that instructs browsers to enforce protections (transport security, framing, content sniffing, script sources) is not set.",
    remediation: "Configure the web server or application to emit the header on every response.",
};

pub static TLS_ISSUE: FindingDetail = FindingDetail {
    code: "TLS_ISSUE",
    title: "SSL/TLS Issue",
    category: FindingCategory::Tls,
    severity: Severity::High,
    description: "The TLS handshake failed or the presented certificate did not validate, so clients cannot establish a trusted encrypted session.",
    remediation: "Verify SSL certificate is valid and properly configured.",
};

pub static NO_HTTPS: FindingDetail = FindingDetail {
    code: "NO_HTTPS",
    title: "No HTTPS",
    category: FindingCategory::Tls,
    severity: Severity::High,
    description: "The host serves plain HTTP without an HTTPS counterpart, exposing all traffic to interception and tampering.",
    remediation: "Implement SSL/TLS certificate for secure communication.",
};

pub static SERVER_BANNER_DISCLOSURE: FindingDetail = FindingDetail {
    code: "SERVER_BANNER_DISCLOSURE",
    title: "Server Banner Disclosure",
    category: FindingCategory::Http,
    severity: Severity::Low,
    description: "The Server response header reveals the web server software, giving attackers a head start on matching known exploits.",
    remediation: "Hide server version information in HTTP headers.",
};

/// Every catalog entry, in rule-evaluation order of first appearance.
static FINDINGS: &[&FindingDetail] = &[
    &DNS_RESOLUTION_FAILED,
    &PORT_RISKY_OPEN,
    &HEADER_MISSING,
    &TLS_ISSUE,
    &NO_HTTPS,
    &SERVER_BANNER_DISCLOSURE,
];

/// Looks up the full detail for a finding code.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().copied().find(|f| f.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_every_catalog_entry() {
        for detail in FINDINGS {
            let found = get_finding_detail(detail.code).unwrap();
            assert_eq!(found.title, detail.title);
        }
        assert!(get_finding_detail("NOT_A_CODE").is_none());
    }

    #[test]
    fn catalog_severities_match_rule_contract() {
        assert_eq!(DNS_RESOLUTION_FAILED.severity, Severity::High);
        assert_eq!(PORT_RISKY_OPEN.severity, Severity::Medium);
        assert_eq!(HEADER_MISSING.severity, Severity::Medium);
        assert_eq!(TLS_ISSUE.severity, Severity::High);
        assert_eq!(NO_HTTPS.severity, Severity::High);
        assert_eq!(SERVER_BANNER_DISCLOSURE.severity, Severity::Low);
    }
}
