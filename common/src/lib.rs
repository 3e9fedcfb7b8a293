//! # lanscout common
//!
//! Shared building blocks for every crate in the workspace.
//!
//! * **[`models`]**: devices, findings, sessions and log entries.
//! * **[`network`]**: address ranges, port sets and synthetic hardware identifiers.
//! * **[`config`]**: scan requests, scan types and engine settings.
//! * **[`error`]**: the error taxonomy surfaced by the engine.

pub mod config;
pub mod error;
pub mod models;
pub mod network;

pub use error::{ProbeError, Result, ScanError};
