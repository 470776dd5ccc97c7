//! Reachability probes
//!
//! A [`Prober`] answers one question: did this host reply within the timeout?
//! Unreachability is a normal outcome and is reported as `false`, never as an
//! error. The production implementation shells out to the system `ping`.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{instrument, trace, warn};

use crate::Host;

/// Extra time granted to the ping process on top of its own reply timeout
/// before it is killed.
const PROCESS_GRACE: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Prober: Send + Sync {
    /// Returns `true` if `host` answered within `timeout`.
    async fn probe(&self, host: &Host, timeout: Duration) -> bool;
}

#[async_trait]
impl<P: Prober + ?Sized> Prober for std::sync::Arc<P> {
    async fn probe(&self, host: &Host, timeout: Duration) -> bool {
        (**self).probe(host, timeout).await
    }
}

/// Probes a host with a single echo request through the system `ping` binary.
#[derive(Debug)]
pub struct PingProber {
    program: String,
    warned_unavailable: AtomicBool,
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new()
    }
}

impl PingProber {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    /// Use a different executable, e.g. an absolute path to `ping`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            warned_unavailable: AtomicBool::new(false),
        }
    }

    fn command(&self, host: &Host, timeout: Duration) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(ping_args(host, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Prober for PingProber {
    #[instrument(skip_all, fields(host = %host))]
    async fn probe(&self, host: &Host, timeout: Duration) -> bool {
        let mut command = self.command(host, timeout);

        let status = match tokio::time::timeout(timeout + PROCESS_GRACE, command.status()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                if !self.warned_unavailable.swap(true, Ordering::Relaxed) {
                    warn!(
                        "unable to run '{}' ({e}), hosts will be reported as down",
                        self.program
                    );
                }
                return false;
            }
            Err(_) => {
                trace!("ping process did not exit in time");
                return false;
            }
        };

        trace!("ping exited with {status}");
        status.success()
    }
}

/// Arguments for one echo request with a reply timeout, per platform flavor of
/// `ping`.
fn ping_args(host: &Host, timeout: Duration) -> Vec<String> {
    let secs = timeout.as_secs().max(1);

    let mut args = if cfg!(windows) {
        vec![
            "-n".to_string(),
            "1".to_string(),
            "-w".to_string(),
            timeout.as_millis().max(1).to_string(),
        ]
    } else if cfg!(any(target_os = "macos", target_os = "freebsd")) {
        // -W is in milliseconds on BSD ping, -t bounds the whole run in seconds
        vec![
            "-c".to_string(),
            "1".to_string(),
            "-t".to_string(),
            secs.to_string(),
        ]
    } else {
        vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            secs.to_string(),
        ]
    };

    args.push(host.to_string());
    args
}
