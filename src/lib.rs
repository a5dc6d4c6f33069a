//! External security posture assessment for a network-accessible host:
//! service discovery over a fixed candidate port set, HTTP security header
//! and TLS configuration inspection, rule-based vulnerability derivation, and
//! a single bounded risk score per target.
//!
//! The crate is the scan engine only. A host application (a bot front-end, an
//! API, a CLI) drives it through [`ScanController::scan`], pre-checks
//! admission with [`ScanController::can_admit`], and renders or persists the
//! resulting [`ScanReport`] itself — persistence plugs in via the
//! [`ScanSink`] trait.

pub mod config;
pub mod core;
pub mod logging;

pub use config::ScanConfig;
pub use core::controller::{ScanController, ScanError, ScanSink};
pub use core::models::{
    HeaderStatus, PortRecord, PortState, ScanRecord, ScanReport, ScanTarget, SecurityHeaders,
    Severity, TlsDetails, TlsOutcome, Vulnerability,
};
pub use core::rules::{calculate_risk_score, identify_vulnerabilities, ScanFindings};
pub use core::scanner::run_full_scan;
