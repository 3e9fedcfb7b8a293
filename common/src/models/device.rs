use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Session-scoped device sequence number, starting at 1.
pub type DeviceId = u64;

/// Device-type classification assigned to a discovered host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Router,
    ServerHost,
    MobileDevice,
    Workstation,
    IotDevice,
    Printer,
    StorageAppliance,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Router,
        Category::ServerHost,
        Category::MobileDevice,
        Category::Workstation,
        Category::IotDevice,
        Category::Printer,
        Category::StorageAppliance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Router => "Router/Gateway",
            Category::ServerHost => "Server",
            Category::MobileDevice => "Mobile Device",
            Category::Workstation => "Computer",
            Category::IotDevice => "IoT Device",
            Category::Printer => "Printer",
            Category::StorageAppliance => "NAS",
        }
    }

    /// Prefix of synthesized display names, e.g. `Router` in `Router-1`.
    pub fn hostname_prefix(&self) -> &'static str {
        match self {
            Category::Router => "Router",
            Category::ServerHost => "Server",
            Category::MobileDevice => "Mobile",
            Category::Workstation => "Desktop",
            Category::IotDevice => "SmartDevice",
            Category::Printer => "Printer",
            Category::StorageAppliance => "NAS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A discovered host.
///
/// Only `last_seen_at`, `open_ports` and `banners` change after commit, and
/// the port data only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub address: IpAddr,
    pub identifier: String,
    pub display_name: String,
    pub category: Category,
    pub open_ports: BTreeSet<u16>,
    pub banners: BTreeMap<u16, String>,
    pub last_seen_at: DateTime<Utc>,
}

impl Device {
    pub fn has_port(&self, port: u16) -> bool {
        self.open_ports.contains(&port)
    }

    /// Merges a fresh observation of the same host.
    pub fn refresh(
        &mut self,
        open_ports: &BTreeSet<u16>,
        banners: &BTreeMap<u16, String>,
        seen_at: DateTime<Utc>,
    ) {
        self.open_ports.extend(open_ports.iter().copied());
        for (port, banner) in banners {
            self.banners.entry(*port).or_insert_with(|| banner.clone());
        }
        self.last_seen_at = seen_at;
    }
}

/// Severity bucket used to badge a device by how many findings it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Clean,
    Warning,
    Critical,
}

impl RiskLevel {
    pub fn from_finding_count(count: usize) -> Self {
        match count {
            0 => RiskLevel::Clean,
            1 => RiskLevel::Warning,
            _ => RiskLevel::Critical,
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
