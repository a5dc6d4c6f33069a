// src/core/scanner/port_scanner.rs

use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::core::models::{PortRecord, PortState};
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// The fixed candidate set of commonly significant ports.
pub const COMMON_PORTS: [u16; 18] = [
    21, 22, 23, 25, 53, 80, 110, 143, 443, 465, 587, 993, 995, 3306, 3389, 5432, 8080, 8443,
];

lazy_static! {
    /// Matches "product<sep>version" at the start of a cleaned banner,
    /// e.g. "OpenSSH_8.9p1", "ProFTPD 1.3.5", "nginx/1.18.0".
    static ref BANNER_RE: Regex =
        Regex::new(r"^([A-Za-z][A-Za-z0-9.+-]*)[/_ ]v?(\d[\w.-]*)").expect("banner regex");
}

/// Well-known service name for a candidate port, as nmap reports them.
fn service_name(port: u16) -> &'static str {
    match port {
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "domain",
        80 => "http",
        110 => "pop3",
        143 => "imap",
        443 => "https",
        465 => "smtps",
        587 => "submission",
        993 => "imaps",
        995 => "pop3s",
        3306 => "mysql",
        3389 => "ms-wbt-server",
        5432 => "postgresql",
        8080 => "http-proxy",
        8443 => "https-alt",
        _ => "unknown",
    }
}

/// Probes every candidate port concurrently and returns the records sorted
/// by port number, so the output order is reproducible regardless of probe
/// completion order.
///
/// This stage never fails: ports that cannot be probed at all are simply
/// absent from the result, and the worst case is an empty list.
pub async fn run_port_scan(ip: IpAddr, config: &ScanConfig) -> Vec<PortRecord> {
    info!(%ip, candidates = COMMON_PORTS.len(), "Starting port scan.");

    let probes = COMMON_PORTS.iter().map(|&port| probe_port(ip, port, config));
    let mut records: Vec<PortRecord> = join_all(probes).await.into_iter().flatten().collect();
    records.sort_by_key(|r| r.port);

    let open = records
        .iter()
        .filter(|r| r.state == PortState::Open)
        .count();
    info!(recorded = records.len(), open, "Port scan finished.");
    records
}

/// Probes one port with a connect attempt and classifies the outcome:
/// connected -> open, refused -> closed, timed out -> filtered. Any other
/// socket error is below the detection layer and produces no record.
pub(crate) async fn probe_port(ip: IpAddr, port: u16, config: &ScanConfig) -> Option<PortRecord> {
    let addr = SocketAddr::new(ip, port);

    let stream = match timeout(config.probe_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
            return Some(record(port, PortState::Closed, None));
        }
        Ok(Err(e)) => {
            debug!(port, error = %e, "Probe failed below the detection layer.");
            return None;
        }
        Err(_) => {
            return Some(record(port, PortState::Filtered, None));
        }
    };

    let banner = grab_banner(stream, config.banner_timeout).await;
    if let Some(b) = &banner {
        debug!(port, banner = %b, "Captured service banner.");
    }
    Some(record(port, PortState::Open, banner.as_deref()))
}

fn record(port: u16, state: PortState, banner: Option<&str>) -> PortRecord {
    let (product, version) = banner.map(parse_banner).unwrap_or((None, None));
    PortRecord {
        port,
        state,
        service: service_name(port).to_string(),
        product,
        version,
    }
}

/// Waits briefly for the service to speak first and returns a printable
/// banner, control characters stripped. Services that expect the client to
/// speak first (HTTP and friends) simply yield nothing.
async fn grab_banner(mut stream: TcpStream, wait: Duration) -> Option<String> {
    let mut buf = vec![0u8; 1024];
    match timeout(wait, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            let raw = String::from_utf8_lossy(&buf[..n]);
            let cleaned: String = raw
                .chars()
                .filter(|c| !c.is_control() || *c == ' ')
                .collect::<String>()
                .trim()
                .to_string();
            (!cleaned.is_empty()).then_some(cleaned)
        }
        _ => None,
    }
}

/// Extracts a product/version guess from a raw banner.
pub(crate) fn parse_banner(banner: &str) -> (Option<String>, Option<String>) {
    // SMTP/FTP/POP3 banners open with a status code, SSH with the protocol
    // preamble; drop both before matching.
    let mut cleaned = banner.trim_start_matches(|c: char| c.is_ascii_digit() || c == ' ' || c == '-');
    if let Some(rest) = cleaned.strip_prefix("SSH") {
        // "SSH-2.0-OpenSSH_8.9p1 ..." -> "OpenSSH_8.9p1 ..."
        cleaned = rest.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-');
    }

    match BANNER_RE.captures(cleaned) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn candidate_list_matches_contract() {
        assert_eq!(COMMON_PORTS.len(), 18);
        assert!(COMMON_PORTS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn service_names_cover_the_candidate_set() {
        for port in COMMON_PORTS {
            assert_ne!(service_name(port), "unknown", "port {}", port);
        }
        assert_eq!(service_name(22), "ssh");
        assert_eq!(service_name(3389), "ms-wbt-server");
        assert_eq!(service_name(49152), "unknown");
    }

    #[test]
    fn parse_banner_handles_common_greetings() {
        assert_eq!(
            parse_banner("SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.6"),
            (Some("OpenSSH".to_string()), Some("8.9p1".to_string()))
        );
        assert_eq!(
            parse_banner("220 ProFTPD 1.3.5 Server ready"),
            (Some("ProFTPD".to_string()), Some("1.3.5".to_string()))
        );
        assert_eq!(
            parse_banner("nginx/1.18.0"),
            (Some("nginx".to_string()), Some("1.18.0".to_string()))
        );
    }

    #[test]
    fn parse_banner_without_version_yields_nothing() {
        assert_eq!(parse_banner("220-Welcome to the server"), (None, None));
        assert_eq!(parse_banner(""), (None, None));
    }

    #[tokio::test]
    async fn listening_port_is_recorded_open_with_banner() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"220 ProFTPD 1.3.5 Server ready\r\n").await;
                // Hold the socket open until the probe finishes reading.
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });

        let config = ScanConfig::default();
        let rec = probe_port(IpAddr::V4(Ipv4Addr::LOCALHOST), port, &config)
            .await
            .unwrap();
        assert_eq!(rec.state, PortState::Open);
        assert_eq!(rec.product.as_deref(), Some("ProFTPD"));
        assert_eq!(rec.version.as_deref(), Some("1.3.5"));
    }

    #[tokio::test]
    async fn refused_port_is_recorded_closed() {
        // Bind then drop to obtain a loopback port with nothing listening.
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ScanConfig::default();
        let rec = probe_port(IpAddr::V4(Ipv4Addr::LOCALHOST), port, &config)
            .await
            .unwrap();
        assert_eq!(rec.state, PortState::Closed);
        assert!(rec.product.is_none());
    }
}
