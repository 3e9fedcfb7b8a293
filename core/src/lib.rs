//! # lanscout core
//!
//! The scan engine.
//!
//! * **[`scanner`]**: session lifecycle and the concurrent scan loop.
//! * **[`probe`]**: the probe port and the bundled TCP connect probe.
//! * **[`classify`]**: rule-based device categories and display names.
//! * **[`analyze`]**: heuristic vulnerability findings.
//! * **[`store`]**: session, devices, findings and log behind one lock.

pub mod analyze;
pub mod classify;
pub mod probe;
pub mod scanner;
pub mod store;

pub use probe::{Probe, ProbeResult, TcpProbe};
pub use scanner::{ScanEvent, Scanner, SessionHandle};
pub use store::{DeviceDetail, PortDetail, Snapshot};
