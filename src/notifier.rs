//! Alert delivery
//!
//! The [`Notifier`] trait is the seam between the monitoring loop and whatever
//! shows the alert to the user. Delivery failures come back as a
//! [`NotifyError`] and are never fatal to the caller.

use std::fmt;
use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::Host;

pub const ALERT_TITLE: &str = "Connectivity Alert";

/// Errors reported by a [`Notifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The delivery mechanism is not installed or not supported here
    MechanismUnavailable(String),

    /// Delivery was attempted and failed
    DeliveryFailed(String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::MechanismUnavailable(msg) => {
                write!(f, "notification mechanism unavailable: {}", msg)
            }
            NotifyError::DeliveryFailed(msg) => write!(f, "notification delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for NotifyError {}

/// One alert summarizing every down host of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    /// Builds the alert for a cycle, or `None` if nothing is down.
    pub fn for_down_hosts(down: &[Host]) -> Option<Self> {
        if down.is_empty() {
            return None;
        }

        let body = down
            .iter()
            .map(Host::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        Some(Self {
            title: ALERT_TITLE.to_string(),
            body,
        })
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;

    /// Whether the delivery mechanism is expected to work on this platform.
    fn platform_supported(&self) -> bool {
        true
    }
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        (**self).notify(title, message).await
    }

    fn platform_supported(&self) -> bool {
        (**self).platform_supported()
    }
}

/// Desktop notifications through `notify-send` (libnotify).
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::with_program("notify-send")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    #[instrument(skip_all)]
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let output = Command::new(&self.program)
            .arg("--")
            .arg(title)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(NotifyError::MechanismUnavailable(format!(
                    "'{}' not found, install libnotify-bin",
                    self.program
                )));
            }
            Err(e) => return Err(NotifyError::DeliveryFailed(e.to_string())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(NotifyError::DeliveryFailed(if stderr.is_empty() {
                format!("'{}' exited with {}", self.program, output.status)
            } else {
                stderr.to_string()
            }));
        }

        debug!("desktop notification delivered");
        Ok(())
    }

    // notify-send is only expected to exist on Linux desktops
    fn platform_supported(&self) -> bool {
        cfg!(target_os = "linux")
    }
}
