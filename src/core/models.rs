// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Sentinel value reported for a tracked security header that the target
/// did not send. This exact string appears in serialized reports.
pub const MISSING_SENTINEL: &str = "Missing";

// --- Target ---

/// A resolved scan target. Built once by the resolver and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The string exactly as the user supplied it.
    pub raw: String,
    /// Normalized host component (scheme and port stripped).
    pub host: String,
    /// First address returned by name resolution.
    pub ip: IpAddr,
}

// --- Port scan models ---

/// Connection-level state of a probed port, using nmap's state names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

/// One probed port. A scan produces these sorted by port number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortRecord {
    pub port: u16,
    pub state: PortState,
    /// Well-known service name for the port (e.g. "ssh", "https").
    pub service: String,
    /// Product guessed from the banner, when one was captured.
    pub product: Option<String>,
    /// Version string guessed from the banner.
    pub version: Option<String>,
}

// --- Security header models ---

/// Presence marker for a single tracked header.
///
/// Serializes to the raw header value, or to the `"Missing"` sentinel, so a
/// serialized `SecurityHeaders` reads as a flat name -> value map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HeaderStatus {
    Present(String),
    #[default]
    Missing,
}

impl HeaderStatus {
    pub fn is_missing(&self) -> bool {
        matches!(self, HeaderStatus::Missing)
    }

    /// The raw header value, if the header was present.
    pub fn value(&self) -> Option<&str> {
        match self {
            HeaderStatus::Present(v) => Some(v),
            HeaderStatus::Missing => None,
        }
    }
}

impl std::fmt::Display for HeaderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderStatus::Present(v) => write!(f, "{}", v),
            HeaderStatus::Missing => write!(f, "{}", MISSING_SENTINEL),
        }
    }
}

impl Serialize for HeaderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HeaderStatus::Present(v) => serializer.serialize_str(v),
            HeaderStatus::Missing => serializer.serialize_str(MISSING_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for HeaderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == MISSING_SENTINEL {
            Ok(HeaderStatus::Missing)
        } else {
            Ok(HeaderStatus::Present(value))
        }
    }
}

/// The fixed set of seven tracked security headers. Every report carries all
/// seven entries; absent headers are `Missing`, never omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityHeaders {
    #[serde(rename = "Strict-Transport-Security")]
    pub strict_transport_security: HeaderStatus,
    #[serde(rename = "X-Frame-Options")]
    pub x_frame_options: HeaderStatus,
    #[serde(rename = "X-Content-Type-Options")]
    pub x_content_type_options: HeaderStatus,
    #[serde(rename = "Content-Security-Policy")]
    pub content_security_policy: HeaderStatus,
    #[serde(rename = "X-XSS-Protection")]
    pub x_xss_protection: HeaderStatus,
    #[serde(rename = "Referrer-Policy")]
    pub referrer_policy: HeaderStatus,
    #[serde(rename = "Permissions-Policy")]
    pub permissions_policy: HeaderStatus,
}

impl SecurityHeaders {
    /// All tracked headers in canonical order, paired with their status.
    pub fn tracked(&self) -> [(&'static str, &HeaderStatus); 7] {
        [
            ("Strict-Transport-Security", &self.strict_transport_security),
            ("X-Frame-Options", &self.x_frame_options),
            ("X-Content-Type-Options", &self.x_content_type_options),
            ("Content-Security-Policy", &self.content_security_policy),
            ("X-XSS-Protection", &self.x_xss_protection),
            ("Referrer-Policy", &self.referrer_policy),
            ("Permissions-Policy", &self.permissions_policy),
        ]
    }

    /// The four headers whose absence raises a vulnerability, in the order
    /// the rule engine evaluates them.
    pub fn critical(&self) -> [(&'static str, &HeaderStatus); 4] {
        [
            ("Strict-Transport-Security", &self.strict_transport_security),
            ("X-Frame-Options", &self.x_frame_options),
            ("X-Content-Type-Options", &self.x_content_type_options),
            ("Content-Security-Policy", &self.content_security_policy),
        ]
    }
}

// --- TLS models ---

/// Details extracted from a successful TLS handshake on port 443.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsDetails {
    pub protocol_version: String,
    pub cipher_suite: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

/// Outcome of the TLS inspection. A failed handshake is evidence the rule
/// engine consumes, not an error that aborts the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TlsOutcome {
    Established(TlsDetails),
    Failed { error: String },
}

impl TlsOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TlsOutcome::Failed { .. })
    }
}

// --- Vulnerability models ---

/// Ordinal severity classification. The numeric weight feeds the risk score;
/// severity never influences vulnerability ordering in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Contribution of one finding of this severity to the risk score.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 3,
            Severity::High => 5,
            Severity::Critical => 10,
        }
    }
}

/// A single derived finding. Produced only by the rule engine; report order
/// is rule evaluation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

// --- Report ---

/// The aggregate result of one scan: the sole externally visible artifact of
/// the engine. Owns all nested data; nothing mutates it after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Target string exactly as supplied by the caller.
    pub raw_target: String,
    /// Normalized host, or the raw input when no host could be extracted.
    pub host: String,
    /// Resolved address. `None` only when name resolution failed.
    pub ip: Option<IpAddr>,
    pub timestamp: DateTime<Utc>,
    pub ports: Vec<PortRecord>,
    /// Raw response headers from the HTTP fetch, names lowercased.
    pub http_headers: HashMap<String, String>,
    pub security_headers: SecurityHeaders,
    /// `None` when port 443 was not reported open.
    pub tls: Option<TlsOutcome>,
    pub vulnerabilities: Vec<Vulnerability>,
    /// Bounded risk summary in [0, 100].
    pub risk_score: u8,
}

impl ScanReport {
    /// Serializes the report for the rendering collaborator.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Persistence payload handed to the `ScanSink` collaborator after a
/// completed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub user_id: i64,
    pub target: String,
    pub risk_score: u8,
    pub timestamp: DateTime<Utc>,
}
