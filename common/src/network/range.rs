//! # Address Range Model
//!
//! Parses and iterates the host range a scan walks through.
//!
//! Supported inputs:
//! * A single address (`192.168.1.5`, `fe80::1`).
//! * A full range (`10.0.0.1-10.0.0.50`, `fe80::1-fe80::ff`).
//! * An abbreviated IPv4 range (`192.168.1.1-254`, `192.168.1.1-2.10`).
//! * A CIDR block (`192.168.1.0/24`).

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::Serialize;

use crate::error::ScanError;

/// Upper bound on the number of addresses a single range may cover.
pub const DEFAULT_MAX_RANGE_LEN: u128 = 65_536;

/// Inclusive range of addresses of one family, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AddressRange {
    start: IpAddr,
    end: IpAddr,
}

impl AddressRange {
    /// Builds a validated range.
    pub fn new(start: IpAddr, end: IpAddr) -> Result<Self, ScanError> {
        if start.is_ipv4() != end.is_ipv4() {
            return Err(ScanError::InvalidRange(format!(
                "{start} and {end} are not of the same address family"
            )));
        }
        if ordinal(start) > ordinal(end) {
            return Err(ScanError::InvalidRange(format!(
                "start address {start} is greater than end address {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(addr: IpAddr) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parses `s` and rejects ranges wider than `max_len` addresses.
    pub fn parse_with_limit(s: &str, max_len: u128) -> Result<Self, ScanError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ScanError::InvalidRange("address range is empty".to_string()));
        }

        let range = if let Ok(addr) = s.parse::<IpAddr>() {
            Self::single(addr)
        } else if let Some((start_str, end_str)) = s.split_once('-') {
            parse_dash_range(start_str.trim(), end_str.trim())?
        } else if let Some((ip_str, prefix_str)) = s.split_once('/') {
            parse_cidr(ip_str.trim(), prefix_str.trim())?
        } else {
            return Err(ScanError::InvalidRange(format!("'{s}' is not an address or range")));
        };

        // The whole IPv6 space holds one more address than u128 can count.
        match (ordinal(range.end) - ordinal(range.start)).checked_add(1) {
            Some(len) if len <= max_len => Ok(range),
            Some(len) => Err(ScanError::InvalidRange(format!(
                "{range} covers {len} addresses, the limit is {max_len}"
            ))),
            None => Err(ScanError::InvalidRange(format!(
                "{range} covers 2^128 addresses, the limit is {max_len}"
            ))),
        }
    }

    pub fn start(&self) -> IpAddr {
        self.start
    }

    pub fn end(&self) -> IpAddr {
        self.end
    }

    /// Number of addresses in the range: `ordinal(end) - ordinal(start) + 1`,
    /// saturating at `u128::MAX`.
    pub fn len(&self) -> u128 {
        (ordinal(self.end) - ordinal(self.start)).saturating_add(1)
    }

    /// A validated range always holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        addr.is_ipv4() == self.start.is_ipv4()
            && (ordinal(self.start)..=ordinal(self.end)).contains(&ordinal(addr))
    }

    /// Ascending iteration from `start` to `end`, inclusive.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = IpAddr> + Clone + Send + 'static {
        let is_v4 = self.start.is_ipv4();
        (ordinal(self.start)..=ordinal(self.end)).map(move |n| from_ordinal(n, is_v4))
    }
}

impl FromStr for AddressRange {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_limit(s, DEFAULT_MAX_RANGE_LEN)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Position of an address on its family's number line.
pub fn ordinal(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn from_ordinal(n: u128, is_v4: bool) -> IpAddr {
    if is_v4 {
        IpAddr::V4(Ipv4Addr::from(n as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(n))
    }
}

/// Parses `start-end`, where `end` may be a full address or trailing IPv4 octets.
fn parse_dash_range(start_str: &str, end_str: &str) -> Result<AddressRange, ScanError> {
    let start = start_str
        .parse::<IpAddr>()
        .map_err(|e| ScanError::InvalidRange(format!("invalid start address '{start_str}': {e}")))?;

    let end = match (start, end_str.parse::<IpAddr>()) {
        (_, Ok(full)) => full,
        (IpAddr::V4(start_v4), Err(_)) => IpAddr::V4(parse_range_end_addr(end_str, &start_v4)?),
        (IpAddr::V6(_), Err(e)) => {
            return Err(ScanError::InvalidRange(format!(
                "invalid end address '{end_str}': {e}"
            )));
        }
    };

    AddressRange::new(start, end)
}

/// Resolves the end of an abbreviated IPv4 range.
///
/// `"50"` after `192.168.1.1` means `192.168.1.50`; `"2.10"` means `192.168.2.10`.
fn parse_range_end_addr(end_str: &str, start_addr: &Ipv4Addr) -> Result<Ipv4Addr, ScanError> {
    if end_str.is_empty() {
        return Err(ScanError::InvalidRange("end of range cannot be empty".to_string()));
    }

    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet| octet.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| ScanError::InvalidRange(format!("invalid end of range '{end_str}': {e}")))?;

    if partial_octets.len() > 4 {
        return Err(ScanError::InvalidRange(format!(
            "end of range has too many octets: {end_str}"
        )));
    }

    let mut end_octets = start_addr.octets();
    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Expands `ip/prefix` into the whole network block.
fn parse_cidr(ip_str: &str, prefix_str: &str) -> Result<AddressRange, ScanError> {
    let ip = ip_str
        .parse::<IpAddr>()
        .map_err(|e| ScanError::InvalidRange(format!("invalid address in CIDR '{ip_str}': {e}")))?;
    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| ScanError::InvalidRange(format!("invalid prefix in CIDR '{prefix_str}': {e}")))?;

    let bits: u8 = if ip.is_ipv4() { 32 } else { 128 };
    if prefix > bits {
        return Err(ScanError::InvalidRange(format!("invalid prefix: {prefix} > {bits}")));
    }

    let host_bits = u32::from(bits - prefix);
    let family_mask: u128 = if bits == 128 { u128::MAX } else { (1u128 << bits) - 1 };
    let host_mask: u128 = if host_bits == 128 { u128::MAX } else { (1u128 << host_bits) - 1 };

    let network = ordinal(ip) & !host_mask & family_mask;
    let broadcast = network | host_mask;

    AddressRange::new(
        from_ordinal(network, ip.is_ipv4()),
        from_ordinal(broadcast, ip.is_ipv4()),
    )
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
