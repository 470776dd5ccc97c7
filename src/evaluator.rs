//! Cycle evaluation
//!
//! Runs the prober once against every host and partitions the hosts into
//! reachable and unreachable, keeping the order of the [`HostSet`].

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, instrument, trace};

use crate::prober::Prober;
use crate::{Host, HostSet};

/// Outcome of one pass over the host set.
///
/// `up` and `down` together contain every host exactly once, each in host set
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleResult {
    pub up: Vec<Host>,
    pub down: Vec<Host>,
}

impl CycleResult {
    pub fn all_up(&self) -> bool {
        self.down.is_empty()
    }

    fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = (&'a Host, bool)>) -> Self {
        let mut result = CycleResult::default();
        for (host, reachable) in outcomes {
            if reachable {
                result.up.push(host.clone());
            } else {
                result.down.push(host.clone());
            }
        }
        result
    }
}

#[derive(Debug)]
pub struct CycleEvaluator<P> {
    prober: P,
    probe_timeout: Duration,
    parallel: bool,
}

impl<P: Prober> CycleEvaluator<P> {
    pub fn new(prober: P, probe_timeout: Duration) -> Self {
        Self {
            prober,
            probe_timeout,
            parallel: false,
        }
    }

    /// Probe all hosts concurrently instead of one after another.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[instrument(skip_all, fields(hosts = hosts.len(), parallel = self.parallel))]
    pub async fn evaluate(&self, hosts: &HostSet) -> CycleResult {
        let result = if self.parallel {
            self.evaluate_parallel(hosts).await
        } else {
            self.evaluate_sequential(hosts).await
        };

        debug!(
            "cycle evaluated: {} up, {} down",
            result.up.len(),
            result.down.len()
        );
        result
    }

    async fn evaluate_sequential(&self, hosts: &HostSet) -> CycleResult {
        let mut outcomes = Vec::with_capacity(hosts.len());
        for host in hosts {
            let reachable = self.prober.probe(host, self.probe_timeout).await;
            trace!("{host}: {}", if reachable { "up" } else { "down" });
            outcomes.push((host, reachable));
        }
        CycleResult::from_outcomes(outcomes)
    }

    async fn evaluate_parallel(&self, hosts: &HostSet) -> CycleResult {
        let probes = hosts.iter().map(|host| async move {
            let reachable = self.prober.probe(host, self.probe_timeout).await;
            trace!("{host}: {}", if reachable { "up" } else { "down" });
            (host, reachable)
        });

        // join_all yields outputs in input order, not completion order
        let outcomes = join_all(probes).await;
        CycleResult::from_outcomes(outcomes)
    }
}
