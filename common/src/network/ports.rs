//! # Port Sets
//!
//! Parses port specifications such as `1-1024`, `443` or `22,80,8000-8080`
//! into an ascending, duplicate-free set, and carries the table of
//! well-known services used by quick scans and by the device detail view.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ScanError;

/// Name and short description of a well-known TCP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortService {
    pub port: u16,
    pub service: &'static str,
    pub description: &'static str,
}

const fn svc(port: u16, service: &'static str, description: &'static str) -> PortService {
    PortService {
        port,
        service,
        description,
    }
}

/// Well-known ports, ascending. Quick scans only probe these.
pub const WELL_KNOWN_SERVICES: &[PortService] = &[
    svc(21, "FTP", "File Transfer Protocol"),
    svc(22, "SSH", "Secure Shell"),
    svc(23, "Telnet", "Remote Login Service (Insecure)"),
    svc(25, "SMTP", "Simple Mail Transfer Protocol"),
    svc(53, "DNS", "Domain Name System"),
    svc(80, "HTTP", "Web Server (Unencrypted)"),
    svc(110, "POP3", "Post Office Protocol"),
    svc(139, "NetBIOS", "NetBIOS Session Service"),
    svc(143, "IMAP", "Internet Message Access Protocol"),
    svc(161, "SNMP", "Simple Network Management Protocol"),
    svc(443, "HTTPS", "Web Server (Encrypted)"),
    svc(445, "SMB", "Server Message Block"),
    svc(515, "LPD", "Line Printer Daemon"),
    svc(548, "AFP", "Apple Filing Protocol"),
    svc(631, "IPP", "Internet Printing Protocol"),
    svc(1433, "MSSQL", "Microsoft SQL Server"),
    svc(1883, "MQTT", "Message Queuing Telemetry Transport"),
    svc(1900, "SSDP", "UPnP Discovery"),
    svc(2049, "NFS", "Network File System"),
    svc(3306, "MySQL", "MySQL Database"),
    svc(3389, "RDP", "Remote Desktop Protocol"),
    svc(5432, "PostgreSQL", "PostgreSQL Database"),
    svc(5555, "ADB", "Android Debug Bridge"),
    svc(5683, "CoAP", "Constrained Application Protocol"),
    svc(6379, "Redis", "Redis Key-Value Store"),
    svc(8008, "HTTP Cast", "Media Streaming Control"),
    svc(8009, "Cast", "Media Streaming Channel"),
    svc(8080, "HTTP Alt", "Alternative HTTP Port"),
    svc(9100, "JetDirect", "Raw Printing"),
    svc(27017, "MongoDB", "MongoDB Database"),
    svc(62078, "iPhone Sync", "Apple Device Sync"),
];

/// Looks up the well-known service listening on `port`.
pub fn service(port: u16) -> Option<&'static PortService> {
    WELL_KNOWN_SERVICES
        .binary_search_by_key(&port, |s| s.port)
        .ok()
        .map(|idx| &WELL_KNOWN_SERVICES[idx])
}

/// Ascending, unique set of ports in `1..=65535`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRange {
    ports: BTreeSet<u16>,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, ScanError> {
        validate_bounds(start, end)?;
        Ok(Self {
            ports: (start..=end).collect(),
        })
    }

    pub fn from_ports<I: IntoIterator<Item = u16>>(ports: I) -> Result<Self, ScanError> {
        let ports: BTreeSet<u16> = ports.into_iter().collect();
        if ports.is_empty() {
            return Err(ScanError::InvalidRange("port range is empty".to_string()));
        }
        if ports.contains(&0) {
            return Err(ScanError::InvalidRange("port 0 is not valid".to_string()));
        }
        Ok(Self { ports })
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    pub fn as_set(&self) -> &BTreeSet<u16> {
        &self.ports
    }

    /// Ports of this range that appear in [`WELL_KNOWN_SERVICES`]. May be empty.
    pub fn well_known(&self) -> BTreeSet<u16> {
        WELL_KNOWN_SERVICES
            .iter()
            .map(|s| s.port)
            .filter(|port| self.ports.contains(port))
            .collect()
    }
}

impl FromStr for PortRange {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ports = BTreeSet::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start_str, end_str)) = part.split_once('-') {
                let start = parse_port(start_str.trim())?;
                let end = parse_port(end_str.trim())?;
                validate_bounds(start, end)?;
                ports.extend(start..=end);
            } else {
                ports.insert(parse_port(part)?);
            }
        }

        Self::from_ports(ports)
    }
}

impl fmt::Display for PortRange {
    /// Collapses consecutive ports into `a-b` runs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(u16, u16)> = Vec::new();
        for port in self.iter() {
            match runs.last_mut() {
                Some((_, end)) if end.checked_add(1) == Some(port) => *end = port,
                _ => runs.push((port, port)),
            }
        }

        let parts: Vec<String> = runs
            .into_iter()
            .map(|(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{start}-{end}")
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

impl Serialize for PortRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn parse_port(s: &str) -> Result<u16, ScanError> {
    let port = s
        .parse::<u16>()
        .map_err(|e| ScanError::InvalidRange(format!("invalid port '{s}': {e}")))?;
    if port == 0 {
        return Err(ScanError::InvalidRange("port 0 is not valid".to_string()));
    }
    Ok(port)
}

fn validate_bounds(start: u16, end: u16) -> Result<(), ScanError> {
    if start == 0 || end == 0 {
        return Err(ScanError::InvalidRange("port 0 is not valid".to_string()));
    }
    if start > end {
        return Err(ScanError::InvalidRange(format!(
            "start port {start} cannot be greater than end port {end}"
        )));
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
