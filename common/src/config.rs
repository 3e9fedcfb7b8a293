//! # Scan Configuration
//!
//! * [`ScanRequest`]: the raw, string-typed input of one scan.
//! * [`ScanType`]: quick or deep, which only selects a [`ProbeBudget`].
//! * [`ScanSettings`]: engine-wide tuning, loadable from TOML.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScanError;
use crate::network::ports::PortRange;
use crate::network::range::DEFAULT_MAX_RANGE_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Quick,
    Deep,
}

impl FromStr for ScanType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(ScanType::Quick),
            "deep" => Ok(ScanType::Deep),
            _ => Err(ScanError::InvalidScanType(s.to_string())),
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::Quick => f.write_str("quick"),
            ScanType::Deep => f.write_str("deep"),
        }
    }
}

/// Unvalidated scan input as handed over by the configuration collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub scan_type: String,
    pub address_range: String,
    pub port_range: String,
}

impl ScanRequest {
    pub fn new(
        scan_type: impl Into<String>,
        address_range: impl Into<String>,
        port_range: impl Into<String>,
    ) -> Self {
        Self {
            scan_type: scan_type.into(),
            address_range: address_range.into(),
            port_range: port_range.into(),
        }
    }
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self::new("quick", "192.168.1.1-254", "1-1024")
    }
}

/// Per-scan-type timing.
///
/// Both fields are required when a profile table appears in a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Connect timeout for a single port.
    pub timeout_ms: u64,
    /// Hard cap on the time spent on one host.
    pub host_ceiling_ms: u64,
}

impl ProfileSettings {
    pub const QUICK: ProfileSettings = ProfileSettings {
        timeout_ms: 300,
        host_ceiling_ms: 5_000,
    };

    pub const DEEP: ProfileSettings = ProfileSettings {
        timeout_ms: 1_000,
        host_ceiling_ms: 60_000,
    };
}

/// Engine tuning. Every field has a default so partial TOML files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Hosts probed at the same time. `1` probes sequentially.
    pub concurrency: usize,
    /// Ports probed at the same time on one host.
    pub port_parallelism: usize,
    /// Time allowed to read a banner after a successful connect.
    pub banner_timeout_ms: u64,
    /// Widest accepted address range.
    pub max_range_len: u64,
    /// Buffered events per subscriber before the slowest one lags.
    pub event_capacity: usize,
    pub quick: ProfileSettings,
    pub deep: ProfileSettings,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            concurrency: 16,
            port_parallelism: 64,
            banner_timeout_ms: 500,
            max_range_len: DEFAULT_MAX_RANGE_LEN as u64,
            event_capacity: 1_024,
            quick: ProfileSettings::QUICK,
            deep: ProfileSettings::DEEP,
        }
    }
}

impl ScanSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, ScanError> {
        let settings: ScanSettings =
            toml::from_str(s).map_err(|e| ScanError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Settings(format!("{}: {e}", path.display())))?;
        let settings = Self::from_toml_str(&raw)?;
        debug!(path = %path.display(), ?settings, "loaded scan settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.concurrency == 0 {
            return Err(ScanError::Settings("concurrency must be at least 1".to_string()));
        }
        if self.port_parallelism == 0 {
            return Err(ScanError::Settings(
                "port_parallelism must be at least 1".to_string(),
            ));
        }
        if self.max_range_len == 0 {
            return Err(ScanError::Settings("max_range_len must be at least 1".to_string()));
        }
        for (name, profile) in [("quick", &self.quick), ("deep", &self.deep)] {
            if profile.timeout_ms == 0 || profile.host_ceiling_ms == 0 {
                return Err(ScanError::Settings(format!(
                    "{name} timeouts must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    pub fn profile(&self, scan_type: ScanType) -> &ProfileSettings {
        match scan_type {
            ScanType::Quick => &self.quick,
            ScanType::Deep => &self.deep,
        }
    }

    /// Resolves what a probe may spend on one host for this scan type.
    ///
    /// Quick scans narrow the port range to well-known ports, or keep the
    /// whole range when it holds none of them; deep scans take it as is. The
    /// host ceiling is `timeout * port_count`, capped by the profile's ceiling
    /// and never below a single timeout.
    pub fn budget(&self, scan_type: ScanType, ports: &PortRange) -> ProbeBudget {
        let profile = self.profile(scan_type);
        let ports: BTreeSet<u16> = match scan_type {
            ScanType::Quick => {
                let known = ports.well_known();
                if known.is_empty() {
                    debug!(%ports, "no well-known ports in range, quick scan probes all of it");
                    ports.as_set().clone()
                } else {
                    known
                }
            }
            ScanType::Deep => ports.as_set().clone(),
        };

        let timeout = Duration::from_millis(profile.timeout_ms);
        let count = u32::try_from(ports.len().max(1)).unwrap_or(u32::MAX);
        let host_ceiling = timeout
            .saturating_mul(count)
            .min(Duration::from_millis(profile.host_ceiling_ms))
            .max(timeout);

        ProbeBudget {
            ports,
            timeout,
            host_ceiling,
            banner_timeout: Duration::from_millis(self.banner_timeout_ms),
        }
    }
}

/// Ports and timeouts a probe may spend on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeBudget {
    pub ports: BTreeSet<u16>,
    pub timeout: Duration,
    pub host_ceiling: Duration,
    pub banner_timeout: Duration,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_type_parsing() {
        assert_eq!("quick".parse::<ScanType>(), Ok(ScanType::Quick));
        assert_eq!(" Deep ".parse::<ScanType>(), Ok(ScanType::Deep));
        assert_eq!(
            "stealth".parse::<ScanType>(),
            Err(ScanError::InvalidScanType("stealth".to_string()))
        );
    }

    #[test]
    fn test_quick_budget_is_smaller_than_deep() {
        let settings = ScanSettings::default();
        let ports: PortRange = "1-1024".parse().unwrap();

        let quick = settings.budget(ScanType::Quick, &ports);
        let deep = settings.budget(ScanType::Deep, &ports);

        assert!(quick.ports.len() < deep.ports.len());
        assert!(quick.timeout < deep.timeout);
        assert_eq!(deep.ports.len(), 1024);
        assert!(quick.ports.iter().all(|p| ports.contains(*p)));
    }

    #[test]
    fn test_host_ceiling_is_bounded() {
        let settings = ScanSettings::default();

        let one: PortRange = "80".parse().unwrap();
        let budget = settings.budget(ScanType::Deep, &one);
        assert_eq!(budget.host_ceiling, Duration::from_millis(1_000));

        let many: PortRange = "1-65535".parse().unwrap();
        let budget = settings.budget(ScanType::Deep, &many);
        assert_eq!(budget.host_ceiling, Duration::from_millis(60_000));

        let unknown: PortRange = "40000-40001".parse().unwrap();
        let budget = settings.budget(ScanType::Quick, &unknown);
        assert_eq!(budget.host_ceiling, budget.timeout * 2);
    }

    #[test]
    fn test_quick_budget_without_well_known_ports_keeps_the_range() {
        let settings = ScanSettings::default();
        let ports: PortRange = "40000-40010".parse().unwrap();

        let budget = settings.budget(ScanType::Quick, &ports);
        assert_eq!(&budget.ports, ports.as_set());
        assert_eq!(budget.timeout, Duration::from_millis(settings.quick.timeout_ms));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = ScanSettings::from_toml_str(
            r#"
            concurrency = 4

            [deep]
            timeout_ms = 2000
            host_ceiling_ms = 90000
            "#,
        )
        .unwrap();

        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.deep.timeout_ms, 2_000);
        assert_eq!(settings.quick, ProfileSettings::QUICK);
        assert_eq!(settings.port_parallelism, ScanSettings::default().port_parallelism);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(ScanSettings::from_toml_str("concurrency = 0").is_err());
        assert!(ScanSettings::from_toml_str("concurrency = \"many\"").is_err());
        assert!(ScanSettings::from_toml_str("[quick]\ntimeout_ms = 0\nhost_ceiling_ms = 1").is_err());
        assert!(ScanSettings::from_toml_str("[quick]\ntimeout_ms = 100").is_err());
    }
}
