//! Error types for the scan engine.

use thiserror::Error;

use crate::models::session::SessionId;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors surfaced to the caller of the engine.
///
/// None of these abort a running scan; they are returned before a scan
/// starts or instead of starting one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Malformed, empty or oversized address/port range.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Scan type other than `quick` or `deep`.
    #[error("Invalid scan type '{0}', expected 'quick' or 'deep'")]
    InvalidScanType(String),

    /// A session is already running.
    #[error("Scan session {session} is already running")]
    ScanInProgress { session: SessionId },

    /// Settings file could not be read or parsed.
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Errors produced by a single host probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// No answer within the probe budget. Routine for unreachable hosts.
    #[error("Probe timed out")]
    Timeout,

    /// The probe could not be sent at all (permissions, missing interface).
    #[error("Transport error: {0}")]
    Transport(String),
}
