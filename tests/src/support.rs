#![cfg(test)]
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lanscout_common::ProbeError;
use lanscout_common::config::ScanSettings;
use lanscout_core::probe::{Probe, ProbeResult};
use lanscout_core::scanner::Scanner;

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[derive(Clone)]
enum Reply {
    Live(ProbeResult),
    Fail(ProbeError),
}

/// Answers from a fixed script; unscripted addresses never respond.
#[derive(Default)]
pub struct ScriptedProbe {
    replies: HashMap<IpAddr, Reply>,
    delays: HashMap<IpAddr, Duration>,
    default_delay: Duration,
    probed: Mutex<Vec<IpAddr>>,
    ports_seen: Mutex<Vec<BTreeSet<u16>>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(mut self, addr: &str, ports: &[u16]) -> Self {
        let addr = ip(addr);
        self.replies.insert(
            addr,
            Reply::Live(ProbeResult::live(addr, ports.iter().copied())),
        );
        self
    }

    pub fn live_with_banner(mut self, addr: &str, ports: &[u16], port: u16, banner: &str) -> Self {
        let addr = ip(addr);
        let result = ProbeResult::live(addr, ports.iter().copied()).with_banner(port, banner);
        self.replies.insert(addr, Reply::Live(result));
        self
    }

    pub fn failing(mut self, addr: &str, reason: &str) -> Self {
        self.replies.insert(
            ip(addr),
            Reply::Fail(ProbeError::Transport(reason.to_string())),
        );
        self
    }

    pub fn delayed(mut self, addr: &str, delay: Duration) -> Self {
        self.delays.insert(ip(addr), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn probed(&self) -> Vec<IpAddr> {
        self.probed.lock().unwrap().clone()
    }

    pub fn ports_seen(&self) -> Vec<BTreeSet<u16>> {
        self.ports_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(
        &self,
        address: IpAddr,
        ports: &BTreeSet<u16>,
        _timeout: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        self.probed.lock().unwrap().push(address);
        self.ports_seen.lock().unwrap().push(ports.clone());

        let delay = self
            .delays
            .get(&address)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.replies.get(&address) {
            Some(Reply::Live(result)) => Ok(result.clone()),
            Some(Reply::Fail(err)) => Err(err.clone()),
            None => Ok(ProbeResult::unreachable(address)),
        }
    }
}

pub fn scanner(probe: ScriptedProbe, concurrency: usize) -> (Scanner, Arc<ScriptedProbe>) {
    let probe = Arc::new(probe);
    let settings = ScanSettings {
        concurrency,
        ..ScanSettings::default()
    };
    let scanner = Scanner::new(Arc::clone(&probe) as Arc<dyn Probe>, settings);
    (scanner, probe)
}

pub fn messages(scanner: &Scanner) -> Vec<String> {
    scanner
        .snapshot()
        .log
        .into_iter()
        .map(|entry| entry.message)
        .collect()
}
