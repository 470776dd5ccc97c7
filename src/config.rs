use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tracing::{trace, warn};

use crate::{Host, HostSet};

const DEFAULT_HOSTS: [&str; 4] = ["192.168.1.254", "8.8.8.8", "192.168.1.100", "192.168.1.50"];

/// When the scheduler should hand a cycle's down hosts to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Alert on every cycle that has at least one down host.
    #[default]
    EveryCycle,

    /// Alert only when the set of down hosts differs from the previous cycle.
    OnChange,
}

/// Raw configuration as read from disk. Every field is optional.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    pub hosts: Option<Vec<Host>>,

    /// Seconds to wait after a cycle before the next one
    pub interval: Option<u64>,

    /// Seconds to wait for a single probe reply
    pub probe_timeout: Option<u64>,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default)]
    pub alert_policy: AlertPolicy,
}

/// Configuration with defaults applied and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub hosts: HostSet,
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub parallel: bool,
    pub alert_policy: AlertPolicy,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            interval: Duration::from_secs(default_interval()),
            probe_timeout: Duration::from_secs(default_probe_timeout()),
            parallel: false,
            alert_policy: AlertPolicy::EveryCycle,
        }
    }
}

/// Reasons a configuration is rejected at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NoHosts,
    BlankHost { position: usize },
    FlagLikeHost(String),
    ZeroInterval,
    ZeroProbeTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoHosts => write!(f, "no hosts configured"),
            ConfigError::BlankHost { position } => {
                write!(f, "host at position {} is blank", position)
            }
            ConfigError::FlagLikeHost(host) => {
                write!(f, "host '{}' must not start with '-'", host)
            }
            ConfigError::ZeroInterval => write!(f, "interval must be greater than zero"),
            ConfigError::ZeroProbeTimeout => {
                write!(f, "probe timeout must be greater than zero")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn default_hosts() -> HostSet {
    DEFAULT_HOSTS.into_iter().collect()
}

fn default_interval() -> u64 {
    300 // 5 minutes
}

fn default_probe_timeout() -> u64 {
    2
}

impl Config {
    /// Apply defaults and validate.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let hosts = match self.hosts {
            Some(hosts) => HostSet::new(hosts),
            None => default_hosts(),
        };

        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }

        for (position, host) in hosts.iter().enumerate() {
            let id = host.as_str().trim();
            if id.is_empty() {
                return Err(ConfigError::BlankHost { position });
            }
            // would be parsed as an option by ping
            if id.starts_with('-') {
                return Err(ConfigError::FlagLikeHost(host.to_string()));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for host in &hosts {
            if !seen.insert(host) {
                warn!("host {host} is listed more than once");
            }
        }

        let interval = self.interval.unwrap_or_else(default_interval);
        if interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let probe_timeout = self.probe_timeout.unwrap_or_else(default_probe_timeout);
        if probe_timeout == 0 {
            return Err(ConfigError::ZeroProbeTimeout);
        }

        Ok(ResolvedConfig {
            hosts,
            interval: Duration::from_secs(interval),
            probe_timeout: Duration::from_secs(probe_timeout),
            parallel: self.parallel,
            alert_policy: self.alert_policy,
        })
    }
}

pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
