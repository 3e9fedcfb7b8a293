//! The **probe** port: one reachability and banner check against one address.
//!
//! The orchestrator only ever talks to the [`Probe`] trait, so the concrete
//! technique (the bundled [`TcpProbe`], a raw-socket prober, or a scripted
//! test double) can be swapped without touching the scan loop.
//!
//! Contract for implementors:
//! * Silence within `timeout` means `live = false`, never an error.
//! * Every port is checked independently; partial answers are reported as is.
//! * [`ProbeError::Transport`] is reserved for "could not probe at all".
//! * Past the host deadline, report what was seen so far.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use lanscout_common::ProbeError;
use lanscout_common::config::ProbeBudget;
use tokio::time::{self, Instant};

mod tcp;

pub use tcp::TcpProbe;

/// What a probe observed about one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub address: IpAddr,
    pub live: bool,
    pub open_ports: BTreeSet<u16>,
    pub banners: BTreeMap<u16, String>,
}

impl ProbeResult {
    pub fn unreachable(address: IpAddr) -> Self {
        Self {
            address,
            live: false,
            open_ports: BTreeSet::new(),
            banners: BTreeMap::new(),
        }
    }

    /// A live host with the given open ports and no banners.
    pub fn live(address: IpAddr, open_ports: impl IntoIterator<Item = u16>) -> Self {
        Self {
            address,
            live: true,
            open_ports: open_ports.into_iter().collect(),
            banners: BTreeMap::new(),
        }
    }

    pub fn with_banner(mut self, port: u16, banner: impl Into<String>) -> Self {
        self.banners.insert(port, banner.into());
        self
    }

    /// Lower-cased banners, for case-insensitive rule matching.
    pub fn banners_lowercase(&self) -> impl Iterator<Item = (u16, String)> + '_ {
        self.banners
            .iter()
            .map(|(port, banner)| (*port, banner.to_lowercase()))
    }
}

#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(
        &self,
        address: IpAddr,
        ports: &BTreeSet<u16>,
        timeout: Duration,
    ) -> Result<ProbeResult, ProbeError>;

    /// [`Probe::probe`] that stops at `deadline`.
    ///
    /// The default cannot see inside `probe`, so an overrun yields
    /// [`ProbeError::Timeout`]. Probers that collect per port override this and
    /// return their partial result instead.
    async fn probe_until(
        &self,
        address: IpAddr,
        ports: &BTreeSet<u16>,
        timeout: Duration,
        deadline: Instant,
    ) -> Result<ProbeResult, ProbeError> {
        match time::timeout_at(deadline, self.probe(address, ports, timeout)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ProbeError::Timeout),
        }
    }
}

/// Runs `probe` under the budget's per-host ceiling.
///
/// A [`ProbeError::Timeout`] from an overrun is treated by callers as an
/// unreachable host.
pub async fn probe_within_budget(
    probe: &dyn Probe,
    address: IpAddr,
    budget: &ProbeBudget,
) -> Result<ProbeResult, ProbeError> {
    let deadline = Instant::now() + budget.host_ceiling;
    probe
        .probe_until(address, &budget.ports, budget.timeout, deadline)
        .await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
