use std::net::IpAddr;

use colored::*;
use lanscout_common::models::device::RiskLevel;
use lanscout_common::models::session::ScanState;
use lanscout_core::store::{DeviceDetail, PortDetail};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn risk_color(risk: RiskLevel) -> Color {
    match risk {
        RiskLevel::Clean => colors::RISK_CLEAN,
        RiskLevel::Warning => colors::RISK_WARNING,
        RiskLevel::Critical => colors::RISK_CRITICAL,
    }
}

pub fn risk_badge(risk: RiskLevel) -> ColoredString {
    let label = match risk {
        RiskLevel::Clean => "● clean",
        RiskLevel::Warning => "● warning",
        RiskLevel::Critical => "● critical",
    };
    label.color(risk_color(risk)).bold()
}

pub fn state_to_colored(state: ScanState) -> ColoredString {
    match state {
        ScanState::Completed => "Completed".green().bold(),
        ScanState::Cancelled => "Cancelled".yellow().bold(),
        ScanState::Running => "Running".blue().bold(),
        ScanState::Idle => "Idle".normal(),
    }
}

pub fn address_to_detail(addr: &IpAddr) -> Detail {
    match addr {
        IpAddr::V4(v4) => ("IPv4".to_string(), v4.to_string().color(colors::IPV4_ADDR)),
        IpAddr::V6(v6) => ("IPv6".to_string(), v6.to_string().color(colors::IPV6_ADDR)),
    }
}

pub fn port_to_string(port: &PortDetail) -> String {
    format!("{}/{}", port.port, port.service)
}

pub fn ports_to_detail(ports: &[PortDetail]) -> Detail {
    let value = if ports.is_empty() {
        "none".dimmed()
    } else {
        ports
            .iter()
            .map(port_to_string)
            .collect::<Vec<_>>()
            .join(", ")
            .color(colors::PORT)
    };
    ("Ports".to_string(), value)
}

/// Tree rows for one device, findings last.
pub fn device_to_details(detail: &DeviceDetail) -> Vec<Detail> {
    let device = &detail.device;
    let mut details: Vec<Detail> = vec![
        address_to_detail(&device.address),
        ("MAC".to_string(), device.identifier.color(colors::MAC_ADDR)),
        ("Type".to_string(), device.category.label().color(colors::SECONDARY)),
        ports_to_detail(&detail.ports),
    ];

    match detail.findings.as_deref() {
        None => details.push(("Risk".to_string(), "not analyzed".dimmed())),
        Some([]) => details.push(("Risk".to_string(), "no findings".color(colors::RISK_CLEAN))),
        Some(findings) => {
            let color = risk_color(detail.risk);
            for finding in findings {
                details.push((
                    "Finding".to_string(),
                    format!("{}: {}", finding.name, finding.description).color(color),
                ));
            }
        }
    }
    details
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
