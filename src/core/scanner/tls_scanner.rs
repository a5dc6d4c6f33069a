// src/core/scanner/tls_scanner.rs

use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::core::models::{TlsDetails, TlsOutcome};
use chrono::{DateTime, Utc};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

/// Performs a TLS handshake against port 443 and extracts the negotiated
/// protocol, cipher suite, and certificate validity window.
///
/// Certificates are verified against the standard trust anchors on purpose: a
/// handshake or validation failure is itself evidence the rule engine
/// consumes, so every failure is absorbed into `TlsOutcome::Failed` instead
/// of propagating.
pub async fn run_tls_scan(host: &str, config: &ScanConfig) -> TlsOutcome {
    info!(host, "Starting TLS inspection.");
    match inspect_tls(host, config).await {
        Ok(details) => {
            info!(
                protocol = %details.protocol_version,
                cipher = %details.cipher_suite,
                "TLS inspection finished."
            );
            TlsOutcome::Established(details)
        }
        Err(error) => {
            warn!(host, error = %error, "TLS inspection failed.");
            TlsOutcome::Failed { error }
        }
    }
}

async fn inspect_tls(host: &str, config: &ScanConfig) -> Result<TlsDetails, String> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(tls_config));

    debug!(host, "Connecting TCP stream to port 443.");
    let tcp = timeout(config.tls_timeout, TcpStream::connect((host, 443)))
        .await
        .map_err(|_| "TCP connection timed out".to_string())?
        .map_err(|e| format!("TCP Connection Error: {}", e))?;

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| format!("Invalid server name: {}", e))?;

    debug!(host, "Performing TLS handshake.");
    let stream = timeout(config.tls_timeout, connector.connect(server_name, tcp))
        .await
        .map_err(|_| "TLS handshake timed out".to_string())?
        .map_err(|e| format!("TLS Handshake Error: {}", e))?;

    let (_, session) = stream.get_ref();

    let protocol_version = match session.protocol_version() {
        Some(rustls::ProtocolVersion::TLSv1_2) => "TLSv1.2".to_string(),
        Some(rustls::ProtocolVersion::TLSv1_3) => "TLSv1.3".to_string(),
        Some(v) => format!("{:?}", v),
        None => "Unknown".to_string(),
    };
    let cipher_suite = session
        .negotiated_cipher_suite()
        .map(|cs| format!("{:?}", cs.suite()))
        .unwrap_or_else(|| "Unknown".to_string());

    let cert_der = session
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| "Server did not provide a certificate".to_string())?;

    let (_, x509) = parse_x509_certificate(cert_der.as_ref())
        .map_err(|e| format!("X.509 Parse Error: {}", e))?;

    let validity = x509.validity();
    Ok(TlsDetails {
        protocol_version,
        cipher_suite,
        valid_from: asn1_time_to_chrono_utc(&validity.not_before),
        valid_until: asn1_time_to_chrono_utc(&validity.not_after),
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}
