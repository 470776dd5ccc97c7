//! Human-facing console report
//!
//! These lines are meant for a person watching the terminal; they are not a
//! stable machine format. Diagnostics go through `tracing` instead.

use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use tracing::warn;

use crate::Host;
use crate::notifier::{AlertMessage, NotifyError};
use crate::util::describe_duration;

const SEPARATOR_WIDTH: usize = 40;

pub struct Reporter {
    out: Box<dyn Write + Send>,
}

impl Reporter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    fn line(&mut self, text: impl AsRef<str>) {
        let result = writeln!(self.out, "{}", text.as_ref()).and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("failed to write report line: {e}");
        }
    }

    pub fn platform_warning(&mut self, os: &str) {
        self.line(format!(
            "Warning: desktop notifications are built for Linux, running on {os}"
        ));
    }

    pub fn cycle_started<Tz>(&mut self, at: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.line("");
        self.line("=".repeat(SEPARATOR_WIDTH));
        self.line(format!("Checking connectivity at {}", at.format("%H:%M:%S")));
    }

    pub fn all_clear(&mut self) {
        self.line("All hosts are reachable.");
    }

    pub fn unreachable(&mut self, down: &[Host]) {
        self.line("The following hosts are unreachable:");
        for host in down {
            self.line(host.as_str());
        }
    }

    pub fn notification_sent(&mut self, alert: &AlertMessage) {
        self.line(format!(
            "Notification sent: {} - {}",
            alert.title,
            alert.body.replace('\n', ", ")
        ));
    }

    pub fn notification_unavailable(&mut self, alert: &AlertMessage, err: &NotifyError) {
        self.line(format!("Error: {err}"));
        self.line(format!(
            "Simulated notification: {} - {}",
            alert.title,
            alert.body.replace('\n', ", ")
        ));
    }

    pub fn notification_failed(&mut self, err: &NotifyError) {
        self.line(format!("Error: {err}"));
    }

    pub fn alert_unchanged(&mut self) {
        self.line("Unreachable hosts unchanged since last check, no new alert.");
    }

    pub fn waiting(&mut self, interval: Duration) {
        self.line(format!(
            "Waiting {}... (Ctrl+C to exit)",
            describe_duration(interval)
        ));
    }

    pub fn stopped(&mut self) {
        self.line("");
        self.line("Monitoring stopped by user.");
    }
}
