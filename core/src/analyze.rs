//! # Vulnerability Analyzer
//!
//! Heuristic, port and banner based checks over a committed [`Device`].
//! Nothing here talks to the network; the same device always yields the same
//! findings, in catalog order.

use std::cmp::Ordering;
use std::sync::OnceLock;

use lanscout_common::models::device::Device;
use lanscout_common::models::finding::{Finding, FindingKind};
use regex::Regex;

const DEFAULT_CREDENTIAL_MARKERS: &[&str] = &[
    "default password",
    "default credentials",
    "admin/admin",
    "root/root",
    "login: admin",
    "password: admin",
];
const LEGACY_SMB_MARKERS: &[&str] = &["smbv1", "smb1", "nt lm 0.12", "lanman"];
const SNMP_COMMUNITY_MARKERS: &[&str] = &["public", "private"];

/// Lowest version considered current, per product.
const KNOWN_GOOD_VERSIONS: &[(&str, &[u64])] = &[
    ("firmware", &[2, 0]),
    ("openssh", &[8, 0]),
    ("dropbear", &[2020, 79]),
    ("busybox", &[1, 30]),
    ("lighttpd", &[1, 4, 50]),
    ("boa", &[0, 95]),
    ("mini_httpd", &[1, 30]),
];

static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();

fn version_regex() -> &'static Regex {
    VERSION_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\b(firmware|openssh|dropbear|busybox|lighttpd|boa|mini_httpd)[\s:/_-]*(?:version[\s:]*)?v?(\d+(?:\.\d+)*)",
        )
        .expect("Version pattern is valid")
    })
}

pub fn analyze(device: &Device) -> Vec<Finding> {
    let banners: Vec<(u16, String)> = device
        .banners
        .iter()
        .map(|(port, banner)| (*port, banner.to_lowercase()))
        .collect();
    let any_banner = |markers: &[&str]| {
        banners
            .iter()
            .any(|(_, b)| markers.iter().any(|m| b.contains(m)))
    };
    let banner_on = |port: u16, markers: &[&str]| {
        banners
            .iter()
            .filter(|(p, _)| *p == port)
            .any(|(_, b)| markers.iter().any(|m| b.contains(m)))
    };

    FindingKind::CATALOG
        .into_iter()
        .filter(|kind| match kind {
            FindingKind::DefaultCredentials => any_banner(DEFAULT_CREDENTIAL_MARKERS),
            FindingKind::OpenTelnet => device.has_port(23),
            FindingKind::SmbV1 => device.has_port(445) && banner_on(445, LEGACY_SMB_MARKERS),
            FindingKind::OpenSnmp => device.has_port(161) && banner_on(161, SNMP_COMMUNITY_MARKERS),
            FindingKind::HttpWithoutTls => device.has_port(80) && !device.has_port(443),
            FindingKind::OutdatedFirmware => banners.iter().any(|(_, b)| has_outdated_version(b)),
            FindingKind::UpnpEnabled => any_banner(&["upnp"]),
        })
        .map(Finding::from)
        .collect()
}

fn has_outdated_version(banner: &str) -> bool {
    version_regex().captures_iter(banner).any(|caps| {
        let product = caps[1].to_ascii_lowercase();
        let Some(found) = parse_version(&caps[2]) else {
            return false;
        };
        KNOWN_GOOD_VERSIONS
            .iter()
            .find(|(name, _)| *name == product)
            .is_some_and(|(_, good)| compare_versions(&found, good) == Ordering::Less)
    })
}

fn parse_version(raw: &str) -> Option<Vec<u64>> {
    raw.split('.').map(|part| part.parse().ok()).collect()
}

/// Component-wise comparison, missing components count as zero.
fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
