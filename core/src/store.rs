//! # Result Store
//!
//! Session state, devices, findings and the scan log behind a single lock.
//!
//! Writes are scoped to a [`SessionId`]: once a session has ended (or a newer
//! one has begun) every write carrying its id is rejected, which is what keeps
//! a cancelled scan from appending anything after the fact.

use std::collections::BTreeMap;

use lanscout_common::ScanError;
use lanscout_common::config::ScanType;
use lanscout_common::models::device::{Device, DeviceId, RiskLevel};
use lanscout_common::models::finding::Finding;
use lanscout_common::models::session::{LogEntry, ScanSession, ScanState, SessionId};
use lanscout_common::network::ports::{self, PortRange};
use lanscout_common::network::range::AddressRange;
use parking_lot::RwLock;
use serde::Serialize;

use crate::analyze::analyze;

#[derive(Debug, Default)]
struct Inner {
    session: Option<ScanSession>,
    devices: Vec<Device>,
    findings: BTreeMap<DeviceId, Vec<Finding>>,
    log: Vec<LogEntry>,
    next_session_id: u64,
}

impl Inner {
    fn running(&mut self, session: SessionId) -> Option<&mut ScanSession> {
        self.session
            .as_mut()
            .filter(|s| s.id == session && s.state == ScanState::Running)
    }
}

/// Outcome of committing a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub device: Device,
    pub findings: Vec<Finding>,
    /// False when the address was already known and the device was refreshed.
    pub is_new: bool,
}

#[derive(Debug, Default)]
pub struct ResultStore {
    inner: RwLock<Inner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the store and starts a new running session.
    ///
    /// Fails without touching anything while another session is running.
    pub fn begin_session(
        &self,
        range: AddressRange,
        port_range: PortRange,
        scan_type: ScanType,
    ) -> Result<ScanSession, ScanError> {
        let mut inner = self.inner.write();
        if let Some(current) = inner.session.as_ref().filter(|s| s.state == ScanState::Running) {
            return Err(ScanError::ScanInProgress { session: current.id });
        }

        inner.next_session_id += 1;
        let session = ScanSession::start(
            SessionId(inner.next_session_id),
            range,
            port_range,
            scan_type,
        );
        inner.devices.clear();
        inner.findings.clear();
        inner.log.clear();
        inner.session = Some(session.clone());
        Ok(session)
    }

    pub fn append_log(&self, session: SessionId, message: impl Into<String>) -> Option<LogEntry> {
        let mut inner = self.inner.write();
        inner.running(session)?;
        let entry = LogEntry::now(message);
        inner.log.push(entry.clone());
        Some(entry)
    }

    /// Adds a device and its findings in one step.
    ///
    /// A device whose address is already stored is refreshed instead, and
    /// its findings are recomputed from the merged port and banner data.
    pub fn commit(
        &self,
        session: SessionId,
        device: Device,
        findings: Vec<Finding>,
    ) -> Option<Committed> {
        let mut inner = self.inner.write();
        inner.running(session)?;

        if let Some(existing) = inner.devices.iter_mut().find(|d| d.address == device.address) {
            existing.refresh(&device.open_ports, &device.banners, device.last_seen_at);
            let merged = existing.clone();
            let findings = analyze(&merged);
            inner.findings.insert(merged.id, findings.clone());
            return Some(Committed {
                device: merged,
                findings,
                is_new: false,
            });
        }

        inner.findings.insert(device.id, findings.clone());
        inner.devices.push(device.clone());
        Some(Committed {
            device,
            findings,
            is_new: true,
        })
    }

    /// Marks one more address as processed, returning the new progress.
    pub fn advance(&self, session: SessionId) -> Option<u8> {
        let mut inner = self.inner.write();
        inner.running(session).map(|s| s.advance())
    }

    /// Moves a running session into a terminal state.
    pub fn finish(&self, session: SessionId, state: ScanState) -> bool {
        let mut inner = self.inner.write();
        match inner.running(session) {
            Some(current) => {
                current.finish(state);
                true
            }
            None => false,
        }
    }

    /// Writes the closing log line and completes the session atomically.
    pub fn complete(&self, session: SessionId) -> Option<LogEntry> {
        let mut inner = self.inner.write();
        let count = inner.devices.len();
        inner.running(session)?.finish(ScanState::Completed);
        let entry = LogEntry::now(format!("Scan completed. Found {count} devices."));
        inner.log.push(entry.clone());
        Some(entry)
    }

    pub fn session(&self) -> Option<ScanSession> {
        self.inner.read().session.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        Snapshot {
            state: inner.session.as_ref().map(|s| s.state).unwrap_or_default(),
            progress_percent: inner.session.as_ref().map_or(0, |s| s.progress_percent),
            session: inner.session.clone(),
            devices: inner.devices.clone(),
            findings_by_device_id: inner.findings.clone(),
            log: inner.log.clone(),
        }
    }

    pub fn device_detail(&self, id: DeviceId) -> Option<DeviceDetail> {
        let inner = self.inner.read();
        let device = inner.devices.iter().find(|d| d.id == id)?.clone();
        let findings = inner.findings.get(&id).cloned();
        Some(DeviceDetail::new(device, findings))
    }
}

/// Consistent, point-in-time copy of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub state: ScanState,
    pub progress_percent: u8,
    pub session: Option<ScanSession>,
    pub devices: Vec<Device>,
    pub findings_by_device_id: BTreeMap<DeviceId, Vec<Finding>>,
    pub log: Vec<LogEntry>,
}

impl Snapshot {
    /// `None` means the device was never analyzed, an empty slice means clean.
    pub fn findings_for(&self, id: DeviceId) -> Option<&[Finding]> {
        self.findings_by_device_id.get(&id).map(Vec::as_slice)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn total_findings(&self) -> usize {
        self.findings_by_device_id.values().map(Vec::len).sum()
    }
}

/// One open port with its well-known service, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDetail {
    pub port: u16,
    pub service: &'static str,
    pub description: &'static str,
}

impl PortDetail {
    pub fn new(port: u16) -> Self {
        match ports::service(port) {
            Some(known) => Self {
                port,
                service: known.service,
                description: known.description,
            },
            None => Self {
                port,
                service: "Unknown",
                description: "Unknown",
            },
        }
    }
}

/// Everything shown for a single selected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDetail {
    pub device: Device,
    pub findings: Option<Vec<Finding>>,
    pub risk: RiskLevel,
    pub ports: Vec<PortDetail>,
}

impl DeviceDetail {
    pub fn new(device: Device, findings: Option<Vec<Finding>>) -> Self {
        let risk = RiskLevel::from_finding_count(findings.as_ref().map_or(0, Vec::len));
        let ports = device.open_ports.iter().copied().map(PortDetail::new).collect();
        Self {
            device,
            findings,
            risk,
            ports,
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lanscout_common::models::device::Category;
    use lanscout_common::models::finding::FindingKind;
    use std::collections::BTreeSet;
    use std::net::{IpAddr, Ipv4Addr};

    fn begin(store: &ResultStore) -> SessionId {
        store
            .begin_session(
                "10.0.0.1-4".parse().unwrap(),
                "1-1024".parse().unwrap(),
                ScanType::Quick,
            )
            .unwrap()
            .id
    }

    fn device(id: DeviceId, last: u8, ports: &[u16]) -> Device {
        Device {
            id,
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)),
            identifier: format!("02:00:0a:00:00:{last:02x}"),
            display_name: format!("Desktop-{id}"),
            category: Category::Workstation,
            open_ports: ports.iter().copied().collect::<BTreeSet<_>>(),
            banners: BTreeMap::new(),
            last_seen_at: Utc::now(),
        }
    }

    #[test]
    fn test_second_begin_is_rejected_while_running() {
        let store = ResultStore::new();
        let session = begin(&store);
        store.append_log(session, "Starting network scan...");
        let before = store.snapshot();

        let err = store
            .begin_session(
                "10.0.1.1-2".parse().unwrap(),
                "80".parse().unwrap(),
                ScanType::Deep,
            )
            .unwrap_err();

        assert_eq!(err, ScanError::ScanInProgress { session });
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_begin_after_finish_resets_results() {
        let store = ResultStore::new();
        let first = begin(&store);
        store.commit(first, device(1, 1, &[80]), vec![]);
        assert!(store.finish(first, ScanState::Cancelled));

        let second = begin(&store);
        assert_ne!(first, second);
        let snapshot = store.snapshot();
        assert!(snapshot.devices.is_empty());
        assert!(snapshot.log.is_empty());
        assert_eq!(snapshot.state, ScanState::Running);
    }

    #[test]
    fn test_writes_after_finish_are_rejected() {
        let store = ResultStore::new();
        let session = begin(&store);
        assert!(store.finish(session, ScanState::Cancelled));

        assert!(store.append_log(session, "late").is_none());
        assert!(store.commit(session, device(1, 1, &[]), vec![]).is_none());
        assert!(store.advance(session).is_none());
        assert!(store.complete(session).is_none());
        assert!(!store.finish(session, ScanState::Completed));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.state, ScanState::Cancelled);
        assert!(snapshot.log.is_empty());
    }

    #[test]
    fn test_clean_device_is_distinct_from_unanalyzed() {
        let store = ResultStore::new();
        let session = begin(&store);
        store.commit(session, device(1, 1, &[443]), vec![]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.findings_for(1), Some(&[][..]));
        assert_eq!(snapshot.findings_for(2), None);
    }

    #[test]
    fn test_duplicate_address_refreshes_device() {
        let store = ResultStore::new();
        let session = begin(&store);
        let first = store.commit(session, device(1, 1, &[443]), vec![]).unwrap();
        assert!(first.is_new);

        let again = store.commit(session, device(2, 1, &[23]), vec![]).unwrap();
        assert!(!again.is_new);
        assert_eq!(again.device.id, 1);
        assert_eq!(again.findings, vec![Finding::from(FindingKind::OpenTelnet)]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.devices.len(), 1);
        assert_eq!(
            snapshot.devices[0].open_ports.iter().copied().collect::<Vec<_>>(),
            vec![23, 443]
        );
    }

    #[test]
    fn test_complete_logs_device_count() {
        let store = ResultStore::new();
        let session = begin(&store);
        store.commit(session, device(1, 2, &[80]), vec![]);
        store.advance(session);

        let entry = store.complete(session).unwrap();
        assert_eq!(entry.message, "Scan completed. Found 1 devices.");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.state, ScanState::Completed);
        assert_eq!(snapshot.progress_percent, 100);
    }

    #[test]
    fn test_device_detail() {
        let store = ResultStore::new();
        let session = begin(&store);
        let findings = vec![
            Finding::from(FindingKind::OpenTelnet),
            Finding::from(FindingKind::HttpWithoutTls),
        ];
        store.commit(session, device(1, 3, &[23, 80, 40000]), findings);

        let detail = store.device_detail(1).unwrap();
        assert_eq!(detail.risk, RiskLevel::Critical);
        assert_eq!(detail.ports.len(), 3);
        assert_eq!(detail.ports[0].service, "Telnet");
        assert_eq!(detail.ports[2].service, "Unknown");
        assert!(store.device_detail(9).is_none());
    }
}
