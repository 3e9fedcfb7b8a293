use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ScanType;
use crate::network::ports::PortRange;
use crate::network::range::AddressRange;

/// Identifies one run of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Cancelled)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanState::Idle => "idle",
            ScanState::Running => "running",
            ScanState::Completed => "completed",
            ScanState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One line of the append-only scan log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// State of one scan run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSession {
    pub id: SessionId,
    pub state: ScanState,
    pub progress_percent: u8,
    pub range: AddressRange,
    pub port_range: PortRange,
    pub scan_type: ScanType,
    pub addresses_processed: u64,
    pub addresses_total: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanSession {
    pub fn start(
        id: SessionId,
        range: AddressRange,
        port_range: PortRange,
        scan_type: ScanType,
    ) -> Self {
        Self {
            id,
            state: ScanState::Running,
            progress_percent: 0,
            addresses_total: u64::try_from(range.len()).unwrap_or(u64::MAX),
            range,
            port_range,
            scan_type,
            addresses_processed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Records one more processed address and recomputes progress.
    ///
    /// Progress is `floor(processed * 100 / total)`, so it only reaches 100
    /// with the last address.
    pub fn advance(&mut self) -> u8 {
        self.addresses_processed = (self.addresses_processed + 1).min(self.addresses_total);
        self.progress_percent = progress_percent(self.addresses_processed, self.addresses_total);
        self.progress_percent
    }

    pub fn finish(&mut self, state: ScanState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
        if state == ScanState::Completed {
            self.progress_percent = 100;
        }
    }
}

/// `floor(processed / total * 100)` in integer arithmetic.
pub fn progress_percent(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = u128::from(processed.min(total)) * 100 / u128::from(total);
    pct as u8
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
