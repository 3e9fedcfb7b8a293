//! # Domain Models
//!
//! ## Core Entities
//! * [`device::Device`]: a discovered host, owned by the result store once committed.
//! * [`session::ScanSession`]: one run of the engine over a range.
//!
//! ## Value Objects
//! * [`finding::Finding`]: a named heuristic security observation.
//! * [`session::LogEntry`]: one line of the append-only scan log.

pub mod device;
pub mod finding;
pub mod session;
