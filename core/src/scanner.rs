//! # Scan Orchestrator
//!
//! Owns the lifecycle of a scan session: validates the request, walks the
//! address range with a bounded window of concurrent probes, and commits
//! classified devices and their findings to the [`ResultStore`].
//!
//! Probes complete in any order but are consumed through an ordered buffered
//! stream, so devices, log lines and progress always follow ascending address
//! order. Cancellation is cooperative: the scan loop selects on a
//! [`CancellationToken`] next to the probe stream and simply stops pulling.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use lanscout_common::config::{ProbeBudget, ScanRequest, ScanSettings, ScanType};
use lanscout_common::models::device::{Device, DeviceId};
use lanscout_common::models::finding::Finding;
use lanscout_common::models::session::{LogEntry, ScanSession, ScanState, SessionId};
use lanscout_common::network::ports::PortRange;
use lanscout_common::network::range::AddressRange;
use lanscout_common::{ProbeError, Result};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analyze::analyze;
use crate::classify::Classifier;
use crate::probe::{Probe, ProbeResult, TcpProbe, probe_within_budget};
use crate::store::{DeviceDetail, ResultStore, Snapshot};

/// Refers to one started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub session: SessionId,
}

/// Live updates for subscribers. Every event is also reflected in the store.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    SessionStarted(ScanSession),
    Log(LogEntry),
    DeviceCommitted { device: Device, findings: Vec<Finding> },
    Progress { session: SessionId, percent: u8 },
    SessionEnded { session: SessionId, state: ScanState },
}

struct ActiveScan {
    session: SessionId,
    cancel: CancellationToken,
    state_rx: watch::Receiver<ScanState>,
}

pub struct Scanner {
    probe: Arc<dyn Probe>,
    settings: ScanSettings,
    store: Arc<ResultStore>,
    events: broadcast::Sender<ScanEvent>,
    active: Mutex<Option<ActiveScan>>,
}

impl Scanner {
    pub fn new(probe: Arc<dyn Probe>, settings: ScanSettings) -> Self {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        Self {
            probe,
            settings,
            store: Arc::new(ResultStore::new()),
            events,
            active: Mutex::new(None),
        }
    }

    pub fn with_tcp_probe(settings: ScanSettings) -> Self {
        let probe = Arc::new(TcpProbe::from_settings(&settings));
        Self::new(probe, settings)
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Validates `request` and starts a session in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_scan(&self, request: &ScanRequest) -> Result<SessionHandle> {
        let scan_type: ScanType = request.scan_type.parse()?;
        let max_len = u128::from(self.settings.max_range_len);
        let range = AddressRange::parse_with_limit(&request.address_range, max_len)?;
        let port_range: PortRange = request.port_range.parse()?;
        let budget = self.settings.budget(scan_type, &port_range);

        let mut active = self.active.lock();
        let session = self
            .store
            .begin_session(range, port_range, scan_type)?;
        let id = session.id;

        info!(
            session = %id,
            %range,
            %scan_type,
            ports = budget.ports.len(),
            "Starting network scan"
        );
        let _ = self.events.send(ScanEvent::SessionStarted(session));
        if let Some(entry) = self.store.append_log(id, "Starting network scan...") {
            let _ = self.events.send(ScanEvent::Log(entry));
        }

        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ScanState::Running);
        let run = ScanRun {
            session: id,
            range,
            budget: Arc::new(budget),
            concurrency: self.settings.concurrency.max(1),
            probe: Arc::clone(&self.probe),
            store: Arc::clone(&self.store),
            events: self.events.clone(),
            cancel: cancel.clone(),
            classifier: Classifier::new(),
            next_id: 1,
        };

        tokio::spawn(async move {
            let state = run.run().await;
            debug!(session = %id, %state, "scan task finished");
            let _ = state_tx.send(state);
        });

        *active = Some(ActiveScan {
            session: id,
            cancel,
            state_rx,
        });
        Ok(SessionHandle { session: id })
    }

    /// Stops the session behind `handle`.
    ///
    /// Returns `false` when the handle is stale or the session already ended.
    pub fn cancel_scan(&self, handle: &SessionHandle) -> bool {
        let active = self.active.lock();
        let Some(scan) = active.as_ref().filter(|a| a.session == handle.session) else {
            return false;
        };
        if !self.store.finish(handle.session, ScanState::Cancelled) {
            return false;
        }

        scan.cancel.cancel();
        info!(session = %handle.session, "Scan cancelled");
        let _ = self.events.send(ScanEvent::SessionEnded {
            session: handle.session,
            state: ScanState::Cancelled,
        });
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn session(&self) -> Option<ScanSession> {
        self.store.session()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Resolves once the session reaches a terminal state.
    ///
    /// A handle from a session that is no longer current yields `Idle`.
    pub async fn wait(&self, handle: &SessionHandle) -> ScanState {
        let rx = self
            .active
            .lock()
            .as_ref()
            .filter(|a| a.session == handle.session)
            .map(|a| a.state_rx.clone());
        let Some(mut rx) = rx else {
            return ScanState::Idle;
        };

        match rx.wait_for(ScanState::is_terminal).await {
            Ok(state) => *state,
            Err(_) => self
                .store
                .session()
                .filter(|s| s.id == handle.session)
                .map_or(ScanState::Idle, |s| s.state),
        }
    }

    pub fn device_detail(&self, id: DeviceId) -> Option<DeviceDetail> {
        self.store.device_detail(id)
    }
}

/// State owned by the background task of one session.
struct ScanRun {
    session: SessionId,
    range: AddressRange,
    budget: Arc<ProbeBudget>,
    concurrency: usize,
    probe: Arc<dyn Probe>,
    store: Arc<ResultStore>,
    events: broadcast::Sender<ScanEvent>,
    cancel: CancellationToken,
    classifier: Classifier,
    next_id: DeviceId,
}

impl ScanRun {
    async fn run(mut self) -> ScanState {
        let probe = Arc::clone(&self.probe);
        let budget = Arc::clone(&self.budget);
        let probes = stream::iter(self.range.iter())
            .map(move |addr| {
                let probe = Arc::clone(&probe);
                let budget = Arc::clone(&budget);
                async move { (addr, probe_within_budget(probe.as_ref(), addr, &budget).await) }
            })
            .buffered(self.concurrency);
        tokio::pin!(probes);

        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return ScanState::Cancelled;
                }

                next = probes.next() => {
                    match next {
                        Some((addr, outcome)) => {
                            if self.record(addr, outcome).is_none() {
                                return self.current_state();
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        match self.store.complete(self.session) {
            Some(entry) => {
                info!(session = %self.session, devices = self.next_id - 1, "Scan completed");
                let _ = self.events.send(ScanEvent::Log(entry));
                let _ = self.events.send(ScanEvent::SessionEnded {
                    session: self.session,
                    state: ScanState::Completed,
                });
                ScanState::Completed
            }
            None => self.current_state(),
        }
    }

    /// Handles one address. `None` means the store no longer accepts writes.
    fn record(
        &mut self,
        addr: IpAddr,
        outcome: std::result::Result<ProbeResult, ProbeError>,
    ) -> Option<()> {
        self.log(format!("Scanning IP: {addr}"))?;

        match outcome {
            Ok(result) if result.live => self.commit_live(result)?,
            Ok(_) => debug!(%addr, "no response"),
            Err(ProbeError::Timeout) => debug!(%addr, "host ceiling reached"),
            Err(ProbeError::Transport(reason)) => {
                warn!(%addr, %reason, "Probe failed");
                self.log(format!("Probe failed for {addr}: {reason}"))?;
            }
        }

        let percent = self.store.advance(self.session)?;
        let _ = self.events.send(ScanEvent::Progress {
            session: self.session,
            percent,
        });
        Some(())
    }

    fn commit_live(&mut self, result: ProbeResult) -> Option<()> {
        let classification = self.classifier.classify(&result);
        let device = Device {
            id: self.next_id,
            address: result.address,
            identifier: classification.identifier,
            display_name: classification.display_name,
            category: classification.category,
            open_ports: result.open_ports,
            banners: result.banners,
            last_seen_at: Utc::now(),
        };
        let findings = analyze(&device);

        let committed = self.store.commit(self.session, device, findings)?;
        if committed.is_new {
            self.next_id += 1;
        }
        let name = committed.device.display_name.clone();
        let address = committed.device.address;
        let vulnerable = !committed.findings.is_empty();

        info!(
            %address,
            name = %name,
            category = %committed.device.category,
            findings = committed.findings.len(),
            "Found device"
        );
        let _ = self.events.send(ScanEvent::DeviceCommitted {
            device: committed.device,
            findings: committed.findings,
        });

        self.log(format!("Found device: {name} ({address})"))?;
        if vulnerable {
            self.log(format!("Potential vulnerabilities found on {name}"))?;
        }
        Some(())
    }

    fn log(&self, message: String) -> Option<()> {
        let entry = self.store.append_log(self.session, message)?;
        let _ = self.events.send(ScanEvent::Log(entry));
        Some(())
    }

    fn current_state(&self) -> ScanState {
        self.store
            .session()
            .filter(|s| s.id == self.session)
            .map_or(ScanState::Cancelled, |s| s.state)
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
