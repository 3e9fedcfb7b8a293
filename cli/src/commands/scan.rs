use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use indicatif::ProgressStyle;
use lanscout_common::config::{ScanRequest, ScanSettings};
use lanscout_common::models::session::ScanState;
use lanscout_core::scanner::{ScanEvent, Scanner, SessionHandle};
use lanscout_core::store::Snapshot;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Instrument, Span, debug, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::commands::ScanArgs;
use crate::mprint;
use crate::terminal::{colors, format, input::InputHandle, print};

const INPUT_POLL: Duration = Duration::from_millis(100);

pub async fn scan(args: ScanArgs, q_level: u8) -> anyhow::Result<()> {
    let settings = load_settings(&args)?;
    let scanner = Scanner::with_tcp_probe(settings);
    let request = ScanRequest::new(&args.scan_type, &args.range, &args.ports);
    let interactive = !args.json && console::user_attended();

    print::header("starting scan", q_level);

    let mut events = scanner.subscribe();
    let start_time = Instant::now();
    let handle = scanner.start_scan(&request)?;

    let span = progress_span(args.json || q_level > 1)?;

    let mut input = InputHandle::new();
    if interactive {
        input.start();
    }

    let state = follow_scan(&scanner, &handle, &mut events, &input, &span, q_level, args.json)
        .instrument(span.clone())
        .await;

    drop(input);
    drop(span);

    let snapshot = scanner.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    scan_ends(&scanner, &snapshot, state, start_time.elapsed(), q_level);
    Ok(())
}

fn load_settings(args: &ScanArgs) -> anyhow::Result<ScanSettings> {
    let mut settings = match &args.config {
        Some(path) => ScanSettings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => ScanSettings::default(),
    };
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency;
    }
    settings.validate()?;
    Ok(settings)
}

fn progress_span(hidden: bool) -> anyhow::Result<Span> {
    if hidden {
        return Ok(Span::none());
    }

    let span = info_span!(target: print::PRINT_TARGET, "scan", indicatif.pb_show = true);
    let style = ProgressStyle::with_template(
        "{spinner:.blue} {elapsed_precise} {bar:36.cyan/blue} {pos:>3}% {msg}",
    )?
    .tick_strings(&[
        "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁",
    ]);
    span.pb_set_style(&style);
    span.pb_set_length(100);
    span.pb_set_message("press 'q' to stop early");
    Ok(span)
}

/// Mirrors scan events to the terminal until the session ends.
async fn follow_scan(
    scanner: &Scanner,
    handle: &SessionHandle,
    events: &mut tokio::sync::broadcast::Receiver<ScanEvent>,
    input: &InputHandle,
    span: &Span,
    q_level: u8,
    json: bool,
) -> ScanState {
    let mut ticker = tokio::time::interval(INPUT_POLL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut found: usize = 0;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ScanEvent::Log(entry)) => {
                    if q_level == 0 && !json {
                        print::print_status(&entry.message);
                    }
                }
                Ok(ScanEvent::Progress { percent, .. }) => {
                    span.pb_set_position(u64::from(percent));
                }
                Ok(ScanEvent::DeviceCommitted { .. }) => {
                    found += 1;
                    span.pb_set_message(&format!("{found} devices found"));
                }
                Ok(ScanEvent::SessionEnded { state, .. }) => return state,
                Ok(ScanEvent::SessionStarted(_)) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => return scanner.wait(handle).await,
            },

            _ = ticker.tick(), if !interrupted => {
                if input.should_interrupt() {
                    interrupted = true;
                    scanner.cancel_scan(handle);
                }
            }

            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                scanner.cancel_scan(handle);
            }
        }
    }
}

fn scan_ends(
    scanner: &Scanner,
    snapshot: &Snapshot,
    state: ScanState,
    total_time: Duration,
    q_level: u8,
) {
    if snapshot.devices.is_empty() {
        print::header("zero devices detected", q_level);
        if q_level == 0 {
            print::no_results();
        }
        print_summary(snapshot, state, total_time, q_level);
        return;
    }

    if q_level > 0 {
        mprint!();
    }
    print::header("scan results", q_level);
    if q_level < 2 {
        print_devices(scanner, snapshot);
    }
    print_summary(snapshot, state, total_time, q_level);
}

fn print_devices(scanner: &Scanner, snapshot: &Snapshot) {
    for (idx, device) in snapshot.devices.iter().enumerate() {
        let Some(detail) = scanner.device_detail(device.id) else {
            continue;
        };
        print::tree_head(idx, &device.display_name, format::risk_badge(detail.risk));
        print::as_tree_one_level(format::device_to_details(&detail));
        if idx + 1 != snapshot.devices.len() {
            mprint!();
        }
    }
}

fn print_summary(snapshot: &Snapshot, state: ScanState, total_time: Duration, q_level: u8) {
    let devices: ColoredString = format!("{} devices", snapshot.devices.len()).bold().green();
    let findings: ColoredString = format!("{} findings", snapshot.total_findings()).bold().red();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!(
        "Scan {}: {devices}, {findings} in {total_time}",
        format::state_to_colored(state)
    )
    .color(colors::TEXT_DEFAULT)
    .to_string();

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output);
            print::end_of_program();
        }
        _ => print::print_status(&output),
    }
}
