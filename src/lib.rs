pub mod config;
pub mod evaluator;
pub mod monitor;
pub mod notifier;
pub mod prober;
pub mod report;
pub mod util;

use std::fmt;

use serde::Deserialize;

/// A monitoring target, identified by IP address or hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Host(String);

impl Host {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Host {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Host {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The ordered, read-only list of hosts to monitor.
///
/// The order given at construction is the order every report and alert uses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct HostSet(Vec<Host>);

impl HostSet {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self(hosts)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Host> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<H: Into<Host>> FromIterator<H> for HostSet {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a HostSet {
    type Item = &'a Host;
    type IntoIter = std::slice::Iter<'a, Host>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
