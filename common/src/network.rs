//! # Network Value Objects
//!
//! * [`range::AddressRange`]: an inclusive, ascending range of host addresses.
//! * [`ports::PortRange`]: the ordered set of ports a probe checks.
//! * [`mac`]: stable MAC-like identifiers derived from an address.

pub mod mac;
pub mod ports;
pub mod range;
