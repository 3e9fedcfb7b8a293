#![cfg(test)]
use std::collections::BTreeSet;
use std::time::Duration;

use lanscout_common::ScanError;
use lanscout_common::config::ScanRequest;
use lanscout_common::models::device::Category;
use lanscout_common::models::finding::FindingKind;
use lanscout_common::models::session::{ScanState, progress_percent};
use lanscout_common::network::ports;
use lanscout_core::scanner::ScanEvent;

use crate::support::{ScriptedProbe, ip, messages, scanner};

#[tokio::test(start_paused = true)]
async fn all_dead_range_completes_with_no_devices() {
    let (scanner, probe) = scanner(ScriptedProbe::new(), 16);
    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1-10.0.0.3", "1-1024"))
        .unwrap();

    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);

    let snapshot = scanner.snapshot();
    assert_eq!(snapshot.state, ScanState::Completed);
    assert_eq!(snapshot.progress_percent, 100);
    assert!(snapshot.devices.is_empty());
    assert!(snapshot.findings_by_device_id.is_empty());
    assert_eq!(probe.probed().len(), 3);
    assert_eq!(
        messages(&scanner),
        vec![
            "Starting network scan...",
            "Scanning IP: 10.0.0.1",
            "Scanning IP: 10.0.0.2",
            "Scanning IP: 10.0.0.3",
            "Scan completed. Found 0 devices.",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn single_host_with_telnet_and_http() {
    let (scanner, _) = scanner(ScriptedProbe::new().live("10.0.0.2", &[23, 80]), 16);
    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.2", "1-1024"))
        .unwrap();
    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);

    let snapshot = scanner.snapshot();
    assert_eq!(snapshot.devices.len(), 1);
    let device = &snapshot.devices[0];
    assert_eq!(device.category, Category::Workstation);
    assert_eq!(device.open_ports.iter().copied().collect::<Vec<_>>(), vec![23, 80]);
    assert_eq!(device.identifier, "02:00:0a:00:00:02");

    let names: Vec<FindingKind> = snapshot
        .findings_for(device.id)
        .unwrap()
        .iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec![FindingKind::OpenTelnet, FindingKind::HttpWithoutTls]);

    let log = messages(&scanner);
    assert!(log.contains(&"Found device: Desktop-1 (10.0.0.2)".to_string()));
    assert!(log.contains(&"Potential vulnerabilities found on Desktop-1".to_string()));
    assert_eq!(log.last().unwrap(), "Scan completed. Found 1 devices.");
}

#[tokio::test(start_paused = true)]
async fn second_start_while_running_is_rejected() {
    let probe = ScriptedProbe::new().with_default_delay(Duration::from_secs(1));
    let (scanner, _) = scanner(probe, 1);

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1-5", "1-1024"))
        .unwrap();
    let before = scanner.snapshot();

    let err = scanner
        .start_scan(&ScanRequest::new("deep", "10.0.1.1-5", "80"))
        .unwrap_err();
    assert_eq!(err, ScanError::ScanInProgress { session: handle.session });
    assert_eq!(scanner.snapshot(), before);

    assert!(scanner.cancel_scan(&handle));
    assert_eq!(scanner.wait(&handle).await, ScanState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn results_follow_address_order_under_concurrency() {
    let mut probe = ScriptedProbe::new();
    for last in 1..=8u64 {
        let addr = format!("10.0.0.{last}");
        probe = probe
            .live(&addr, &[22])
            .delayed(&addr, Duration::from_millis(90 - last * 10));
    }
    let (scanner, _) = scanner(probe, 8);

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1-8", "1-1024"))
        .unwrap();
    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);

    let scanned: Vec<String> = messages(&scanner)
        .into_iter()
        .filter_map(|m| m.strip_prefix("Scanning IP: ").map(str::to_string))
        .collect();
    let expected: Vec<String> = (1..=8).map(|n| format!("10.0.0.{n}")).collect();
    assert_eq!(scanned, expected);

    let snapshot = scanner.snapshot();
    let ids: Vec<u64> = snapshot.devices.iter().map(|d| d.id).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
    assert!(snapshot.devices.windows(2).all(|w| w[0].address < w[1].address));
    assert_eq!(snapshot.devices[7].display_name, "Desktop-8");
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_progress_and_logging() {
    let probe = ScriptedProbe::new().with_default_delay(Duration::from_millis(10));
    let (scanner, _) = scanner(probe, 1);
    let mut events = scanner.subscribe();

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1-100", "1-1024"))
        .unwrap();

    loop {
        match events.recv().await.unwrap() {
            ScanEvent::Progress { percent, .. } if percent >= 10 => break,
            _ => {}
        }
    }

    assert!(scanner.cancel_scan(&handle));
    let log_len = scanner.snapshot().log.len();
    assert_eq!(scanner.wait(&handle).await, ScanState::Cancelled);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = scanner.snapshot();
    assert_eq!(snapshot.state, ScanState::Cancelled);
    assert!(snapshot.progress_percent < 100);
    assert_eq!(snapshot.log.len(), log_len);
    assert!(!scanner.cancel_scan(&handle));

    let next = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1", "80"))
        .unwrap();
    assert_ne!(next.session, handle.session);
    assert_eq!(scanner.wait(&next).await, ScanState::Completed);
}

#[tokio::test(start_paused = true)]
async fn every_address_is_visited_once_with_floored_progress() {
    let (scanner, probe) = scanner(ScriptedProbe::new(), 4);
    let mut events = scanner.subscribe();

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.250-10.0.1.5", "1-1024"))
        .unwrap();

    let mut progress = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            ScanEvent::Progress { percent, .. } => progress.push(percent),
            ScanEvent::SessionEnded { state, .. } => {
                assert_eq!(state, ScanState::Completed);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);

    let mut visited = probe.probed();
    visited.sort();
    visited.dedup();
    assert_eq!(visited.len(), 12);
    assert_eq!(visited.first(), Some(&ip("10.0.0.250")));
    assert_eq!(visited.last(), Some(&ip("10.0.1.5")));

    let expected: Vec<u8> = (1..=12).map(|k| progress_percent(k, 12)).collect();
    assert_eq!(progress, expected);
    assert_eq!(progress.last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn transport_errors_skip_the_address() {
    let probe = ScriptedProbe::new()
        .failing("10.0.0.1", "permission denied")
        .live("10.0.0.2", &[22]);
    let (scanner, _) = scanner(probe, 2);

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1-2", "1-1024"))
        .unwrap();
    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);

    let log = messages(&scanner);
    assert!(log.contains(&"Probe failed for 10.0.0.1: permission denied".to_string()));
    let snapshot = scanner.snapshot();
    assert_eq!(snapshot.devices.len(), 1);
    assert_eq!(snapshot.devices[0].address, ip("10.0.0.2"));
    assert_eq!(snapshot.progress_percent, 100);
}

#[tokio::test(start_paused = true)]
async fn stalled_host_is_bounded_by_the_host_ceiling() {
    let probe = ScriptedProbe::new()
        .live("10.0.0.1", &[80])
        .delayed("10.0.0.1", Duration::from_secs(3600));
    let (scanner, _) = scanner(probe, 1);

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1", "1-1024"))
        .unwrap();
    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);
    assert!(scanner.snapshot().devices.is_empty());
}

#[tokio::test(start_paused = true)]
async fn scan_type_selects_the_port_budget() {
    let (scanner, probe) = scanner(ScriptedProbe::new(), 1);

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1", "1-1024"))
        .unwrap();
    scanner.wait(&handle).await;
    let quick = probe.ports_seen().pop().unwrap();
    assert!(!quick.is_empty());
    assert!(quick.iter().all(|p| ports::service(*p).is_some() && *p <= 1024));

    let handle = scanner
        .start_scan(&ScanRequest::new("DEEP", "10.0.0.1", "8000-8010"))
        .unwrap();
    scanner.wait(&handle).await;
    let deep = probe.ports_seen().pop().unwrap();
    let expected: BTreeSet<u16> = (8000..=8010).collect();
    assert_eq!(deep, expected);
}

#[tokio::test(start_paused = true)]
async fn quick_scan_outside_well_known_ports_probes_the_range() {
    let (scanner, probe) = scanner(ScriptedProbe::new().live("10.0.0.1", &[40001]), 1);

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.1", "40000-40010"))
        .unwrap();
    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);

    let seen = probe.ports_seen().pop().unwrap();
    let expected: BTreeSet<u16> = (40000..=40010).collect();
    assert_eq!(seen, expected);

    let snapshot = scanner.snapshot();
    assert_eq!(snapshot.devices.len(), 1);
    assert!(snapshot.devices[0].open_ports.contains(&40001));
}

#[tokio::test(start_paused = true)]
async fn categories_get_their_own_ordinals() {
    let probe = ScriptedProbe::new()
        .live("192.168.1.10", &[9100])
        .live("192.168.1.11", &[53, 80, 443])
        .live("192.168.1.12", &[631])
        .live_with_banner("192.168.1.13", &[445], 445, "Synology DSM");
    let (scanner, _) = scanner(probe, 4);

    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "192.168.1.10-13", "1-1024"))
        .unwrap();
    assert_eq!(scanner.wait(&handle).await, ScanState::Completed);

    let names: Vec<String> = scanner
        .snapshot()
        .devices
        .into_iter()
        .map(|d| d.display_name)
        .collect();
    assert_eq!(names, vec!["Printer-1", "Router-1", "Printer-2", "NAS-1"]);
}

#[tokio::test(start_paused = true)]
async fn device_detail_describes_ports_and_risk() {
    let (scanner, _) = scanner(ScriptedProbe::new().live("10.0.0.7", &[23, 80, 443]), 1);
    let handle = scanner
        .start_scan(&ScanRequest::new("quick", "10.0.0.7", "1-1024"))
        .unwrap();
    scanner.wait(&handle).await;

    let id = scanner.snapshot().devices[0].id;
    let detail = scanner.device_detail(id).unwrap();
    assert_eq!(detail.findings.as_ref().map(Vec::len), Some(1));
    let services: Vec<&str> = detail.ports.iter().map(|p| p.service).collect();
    assert_eq!(services, vec!["Telnet", "HTTP", "HTTPS"]);
    assert!(scanner.device_detail(id + 100).is_none());
}
