use std::fmt;

use serde::Serialize;

/// Fixed catalog of heuristic findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FindingKind {
    #[serde(rename = "Default Credentials")]
    DefaultCredentials,
    #[serde(rename = "Open Telnet")]
    OpenTelnet,
    #[serde(rename = "SMB v1")]
    SmbV1,
    #[serde(rename = "Open SNMP")]
    OpenSnmp,
    #[serde(rename = "HTTP Without TLS")]
    HttpWithoutTls,
    #[serde(rename = "Outdated Firmware")]
    OutdatedFirmware,
    #[serde(rename = "UPnP Enabled")]
    UpnpEnabled,
}

impl FindingKind {
    pub const CATALOG: [FindingKind; 7] = [
        FindingKind::DefaultCredentials,
        FindingKind::OpenTelnet,
        FindingKind::SmbV1,
        FindingKind::OpenSnmp,
        FindingKind::HttpWithoutTls,
        FindingKind::OutdatedFirmware,
        FindingKind::UpnpEnabled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FindingKind::DefaultCredentials => "Default Credentials",
            FindingKind::OpenTelnet => "Open Telnet",
            FindingKind::SmbV1 => "SMB v1",
            FindingKind::OpenSnmp => "Open SNMP",
            FindingKind::HttpWithoutTls => "HTTP Without TLS",
            FindingKind::OutdatedFirmware => "Outdated Firmware",
            FindingKind::UpnpEnabled => "UPnP Enabled",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FindingKind::DefaultCredentials => "Device may be using default login credentials",
            FindingKind::OpenTelnet => "Telnet service is enabled and accessible",
            FindingKind::SmbV1 => "Outdated SMB protocol version detected",
            FindingKind::OpenSnmp => "SNMP service with default community strings",
            FindingKind::HttpWithoutTls => "Web server without encryption",
            FindingKind::OutdatedFirmware => "Device may be running outdated firmware",
            FindingKind::UpnpEnabled => {
                "Universal Plug and Play is enabled and could be exploited"
            }
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named observation attached to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub name: FindingKind,
    pub description: String,
}

impl From<FindingKind> for Finding {
    fn from(kind: FindingKind) -> Self {
        Self {
            name: kind,
            description: kind.description().to_string(),
        }
    }
}
