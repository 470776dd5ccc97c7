//! Test doubles shared by the integration and property tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pingwatch::{
    Host,
    config::{AlertPolicy, ResolvedConfig},
    notifier::{Notifier, NotifyError},
    prober::Prober,
    report::Reporter,
};

/// Config with the given hosts and a short interval
pub fn create_test_config(hosts: &[&str], interval: Duration) -> ResolvedConfig {
    ResolvedConfig {
        hosts: hosts.iter().copied().collect(),
        interval,
        probe_timeout: Duration::from_secs(2),
        parallel: false,
        alert_policy: AlertPolicy::EveryCycle,
    }
}

/// Prober whose answers are scripted per host.
///
/// The n-th probe of a host returns the n-th scripted value; once the script
/// runs out the last value repeats. Hosts without a script are up.
#[derive(Default)]
pub struct ScriptedProber {
    scripts: HashMap<String, Vec<bool>>,
    delay: Option<Duration>,
    counts: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: &str, outcomes: &[bool]) -> Self {
        self.scripts.insert(host.to_string(), outcomes.to_vec());
        self
    }

    pub fn down(self, host: &str) -> Self {
        self.host(host, &[false])
    }

    /// Every probe takes this long before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn total_probes(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, host: &Host, _timeout: Duration) -> bool {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let n = {
            let mut counts = self.counts.lock().unwrap();
            let count = counts.entry(host.to_string()).or_insert(0);
            let n = *count;
            *count += 1;
            n
        };
        self.total.fetch_add(1, Ordering::SeqCst);

        match self.scripts.get(host.as_str()) {
            Some(script) if !script.is_empty() => script[n.min(script.len() - 1)],
            _ => true,
        }
    }
}

/// Notifier that records every call and answers with queued outcomes
/// (`Ok` once the queue is empty).
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(String, String)>>,
    outcomes: Mutex<VecDeque<Result<(), NotifyError>>>,
    always: Option<NotifyError>,
    unsupported_platform: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with `error`.
    pub fn failing(error: NotifyError) -> Self {
        Self {
            always: Some(error),
            ..Self::default()
        }
    }

    /// Report the platform as unsupported at startup.
    pub fn unsupported_platform(mut self) -> Self {
        self.unsupported_platform = true;
        self
    }

    pub fn then(self, outcome: Result<(), NotifyError>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, body)| body).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));

        if let Some(error) = &self.always {
            return Err(error.clone());
        }
        self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn platform_supported(&self) -> bool {
        !self.unsupported_platform
    }
}

/// In-memory console that can be read back after the monitor ran.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.clone())
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
