//! # Device Classification
//!
//! Turns a live [`ProbeResult`] into a [`Category`], a synthetic hardware
//! identifier and a display name.
//!
//! Rules are checked top to bottom and the first match wins, so the more
//! specific appliance signatures come before the broad host ones.

use std::collections::HashMap;

use lanscout_common::models::device::Category;
use lanscout_common::network::mac::synthetic_mac;

use crate::probe::ProbeResult;

const PRINTER_PORTS: &[u16] = &[9100, 515, 631];
const FILE_SHARE_PORTS: &[u16] = &[445, 139, 548, 2049];
const NAS_MARKERS: &[&str] = &["nas", "synology", "qnap", "truenas", "freenas", "readynas"];
const ROUTER_MARKERS: &[&str] = &["router", "gateway", "openwrt", "dd-wrt", "routeros", "mikrotik"];
const ROUTER_SERVICE_PORTS: &[u16] = &[53, 80, 443];
const MOBILE_PORTS: &[u16] = &[62078, 5555];
const IOT_PORTS: &[u16] = &[1900, 1883, 5683, 8008, 8009];
const SERVER_PORTS: &[u16] = &[25, 110, 143, 1433, 3306, 5432, 6379, 27017];

struct Rule {
    category: Category,
    matches: fn(&ProbeResult) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        category: Category::Printer,
        matches: |r| any_open(r, PRINTER_PORTS),
    },
    Rule {
        category: Category::StorageAppliance,
        matches: |r| any_open(r, FILE_SHARE_PORTS) && banner_mentions(r, NAS_MARKERS),
    },
    Rule {
        category: Category::Router,
        matches: |r| {
            (banner_mentions(r, ROUTER_MARKERS) && any_open(r, ROUTER_SERVICE_PORTS))
                || (is_open(r, 53) && is_open(r, 80) && is_open(r, 443))
        },
    },
    Rule {
        category: Category::MobileDevice,
        matches: |r| any_open(r, MOBILE_PORTS),
    },
    Rule {
        category: Category::IotDevice,
        matches: |r| any_open(r, IOT_PORTS) || banner_mentions(r, &["upnp"]),
    },
    Rule {
        category: Category::ServerHost,
        matches: |r| {
            any_open(r, SERVER_PORTS) || (is_open(r, 22) && (is_open(r, 80) || is_open(r, 443)))
        },
    },
];

fn is_open(result: &ProbeResult, port: u16) -> bool {
    result.open_ports.contains(&port)
}

fn any_open(result: &ProbeResult, ports: &[u16]) -> bool {
    ports.iter().any(|p| is_open(result, *p))
}

fn banner_mentions(result: &ProbeResult, markers: &[&str]) -> bool {
    result
        .banners_lowercase()
        .any(|(_, banner)| markers.iter().any(|m| banner.contains(m)))
}

/// Pure category decision for one probe result.
pub fn categorize(result: &ProbeResult) -> Category {
    RULES
        .iter()
        .find(|rule| (rule.matches)(result))
        .map(|rule| rule.category)
        .unwrap_or(Category::Workstation)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub identifier: String,
    pub display_name: String,
}

/// Hands out per-category ordinals for display names within one session.
#[derive(Debug, Default)]
pub struct Classifier {
    ordinals: HashMap<Category, u32>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, result: &ProbeResult) -> Classification {
        let category = categorize(result);
        let ordinal = self.ordinals.entry(category).or_insert(0);
        *ordinal += 1;

        Classification {
            category,
            identifier: synthetic_mac(result.address).to_string(),
            display_name: format!("{}-{}", category.hostname_prefix(), ordinal),
        }
    }

    pub fn reset(&mut self) {
        self.ordinals.clear();
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
