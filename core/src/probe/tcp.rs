//! TCP connect probe.
//!
//! Works without elevated privileges: a completed handshake marks the port
//! open, an active refusal proves the host is up, silence proves nothing.

use std::collections::BTreeSet;
use std::io::{self, ErrorKind};
use std::net::{IpAddr, SocketAddr};
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use lanscout_common::ProbeError;
use lanscout_common::config::ScanSettings;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant, timeout};
use tracing::trace;

use super::{Probe, ProbeResult};

const HTTP_PORTS: &[u16] = &[80, 8008, 8080, 8081, 8888];
const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";
const BANNER_BUFFER_SIZE: usize = 512;

#[derive(Debug)]
enum PortOutcome {
    Open(Option<String>),
    Refused,
    Silent,
}

#[derive(Debug, Clone)]
pub struct TcpProbe {
    port_parallelism: usize,
    banner_timeout: Duration,
}

impl TcpProbe {
    pub fn new(port_parallelism: usize, banner_timeout: Duration) -> Self {
        Self {
            port_parallelism: port_parallelism.max(1),
            banner_timeout,
        }
    }

    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(
            settings.port_parallelism,
            Duration::from_millis(settings.banner_timeout_ms),
        )
    }

    async fn probe_port(
        &self,
        addr: IpAddr,
        port: u16,
        probe_timeout: Duration,
    ) -> Result<PortOutcome, ProbeError> {
        let socket_addr = SocketAddr::new(addr, port);

        match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(stream)) => Ok(PortOutcome::Open(self.grab_banner(stream, port).await)),
            Ok(Err(e)) => connect_error_outcome(e),
            Err(_elapsed) => Ok(PortOutcome::Silent),
        }
    }

    /// Best-effort read of whatever the service says first.
    async fn grab_banner(&self, mut stream: TcpStream, port: u16) -> Option<String> {
        if HTTP_PORTS.contains(&port) {
            let _ = timeout(self.banner_timeout, stream.write_all(HTTP_PROBE)).await;
        }

        let mut buffer = [0u8; BANNER_BUFFER_SIZE];
        match timeout(self.banner_timeout, stream.read(&mut buffer)).await {
            Ok(Ok(n)) if n > 0 => {
                let text: String = String::from_utf8_lossy(&buffer[..n])
                    .chars()
                    .filter(|c| !c.is_control() || *c == '\n')
                    .collect();
                let text = text.trim().to_string();
                (!text.is_empty()).then_some(text)
            }
            _ => None,
        }
    }

    /// Probes every port, stopping early at `deadline` if one is given.
    async fn probe_ports(
        &self,
        address: IpAddr,
        ports: &BTreeSet<u16>,
        probe_timeout: Duration,
        deadline: Option<Instant>,
    ) -> Result<ProbeResult, ProbeError> {
        let mut outcomes = pin!(
            stream::iter(ports.iter().copied())
                .map(|port| async move { (port, self.probe_port(address, port, probe_timeout).await) })
                .buffer_unordered(self.port_parallelism)
        );

        let mut tally = PortTally::new(address);
        loop {
            let next = match deadline {
                Some(deadline) => match time::timeout_at(deadline, outcomes.next()).await {
                    Ok(next) => next,
                    Err(_elapsed) => {
                        trace!(%address, "host deadline reached, keeping partial result");
                        break;
                    }
                },
                None => outcomes.next().await,
            };
            let Some((port, outcome)) = next else { break };
            tally.record(port, outcome);
        }

        let result = tally.finish();
        if let Ok(result) = &result {
            trace!(%address, live = result.live, open = result.open_ports.len(), "tcp probe finished");
        }
        result
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(
        &self,
        address: IpAddr,
        ports: &BTreeSet<u16>,
        probe_timeout: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        self.probe_ports(address, ports, probe_timeout, None).await
    }

    async fn probe_until(
        &self,
        address: IpAddr,
        ports: &BTreeSet<u16>,
        probe_timeout: Duration,
        deadline: Instant,
    ) -> Result<ProbeResult, ProbeError> {
        self.probe_ports(address, ports, probe_timeout, Some(deadline)).await
    }
}

/// Folds per-port outcomes into one result.
///
/// A transport error only fails the host when no port answered.
struct PortTally {
    result: ProbeResult,
    transport_error: Option<ProbeError>,
}

impl PortTally {
    fn new(address: IpAddr) -> Self {
        Self {
            result: ProbeResult::unreachable(address),
            transport_error: None,
        }
    }

    fn record(&mut self, port: u16, outcome: Result<PortOutcome, ProbeError>) {
        match outcome {
            Ok(PortOutcome::Open(banner)) => {
                self.result.live = true;
                self.result.open_ports.insert(port);
                if let Some(banner) = banner {
                    self.result.banners.insert(port, banner);
                }
            }
            Ok(PortOutcome::Refused) => self.result.live = true,
            Ok(PortOutcome::Silent) => {}
            Err(err) => {
                trace!(address = %self.result.address, port, %err, "port probe failed");
                self.transport_error.get_or_insert(err);
            }
        }
    }

    fn finish(self) -> Result<ProbeResult, ProbeError> {
        match self.transport_error {
            Some(err) if !self.result.live => Err(err),
            _ => Ok(self.result),
        }
    }
}

/// Maps a failed connect onto what it says about the host.
fn connect_error_outcome(err: io::Error) -> Result<PortOutcome, ProbeError> {
    match err.kind() {
        ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset => Ok(PortOutcome::Refused),
        ErrorKind::PermissionDenied | ErrorKind::AddrNotAvailable | ErrorKind::Unsupported => {
            Err(ProbeError::Transport(err.to_string()))
        }
        _ => Ok(PortOutcome::Silent),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
