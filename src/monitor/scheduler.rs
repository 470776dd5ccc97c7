//! Monitor - drives probing cycles at a fixed interval
//!
//! The monitor owns the host set, the evaluator and the notifier. It is
//! spawned through [`MonitorHandle`], which is the only way to talk to it
//! once running.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{AlertPolicy, ResolvedConfig};
use crate::evaluator::{CycleEvaluator, CycleResult};
use crate::notifier::{AlertMessage, Notifier, NotifyError};
use crate::prober::Prober;
use crate::report::Reporter;
use crate::{Host, HostSet};

use super::messages::{MonitorCommand, MonitorState, MonitorStats};

/// Upper bound for a single notifier call before it counts as failed.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Monitor<P, N> {
    hosts: HostSet,
    interval: Duration,
    alert_policy: AlertPolicy,
    evaluator: CycleEvaluator<P>,
    notifier: N,
    reporter: Reporter,
    command_rx: mpsc::Receiver<MonitorCommand>,

    /// CheckNow requests waiting for the in-flight cycle
    pending: Vec<oneshot::Sender<CycleResult>>,

    /// Down hosts of the previous cycle, only kept for `AlertPolicy::OnChange`
    last_down: Option<Vec<Host>>,

    max_cycles: Option<u64>,
    state: watch::Sender<MonitorState>,
    stats: MonitorStats,
}

impl<P, N> Monitor<P, N>
where
    P: Prober + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        config: ResolvedConfig,
        prober: P,
        notifier: N,
        reporter: Reporter,
        command_rx: mpsc::Receiver<MonitorCommand>,
    ) -> Self {
        let ResolvedConfig {
            hosts,
            interval,
            probe_timeout,
            parallel,
            alert_policy,
        } = config;

        Self {
            hosts,
            interval,
            alert_policy,
            evaluator: CycleEvaluator::new(prober, probe_timeout).parallel(parallel),
            notifier,
            reporter,
            command_rx,
            pending: Vec::new(),
            last_down: None,
            max_cycles: None,
            state: watch::Sender::new(MonitorState::Idle),
            stats: MonitorStats::default(),
        }
    }

    /// Stop on its own after `cycles` completed cycles.
    pub fn max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Follow state changes from outside the task.
    pub fn watch_state(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    /// Run until shut down (or until `max_cycles` is reached).
    #[instrument(skip_all, fields(hosts = self.hosts.len()))]
    pub async fn run(mut self) -> MonitorStats {
        self.start();

        let cancelled = loop {
            if self.cycle().await.is_none() {
                break true;
            }

            if self
                .max_cycles
                .is_some_and(|max| self.stats.cycles >= max)
            {
                debug!("reached {} cycles", self.stats.cycles);
                break false;
            }

            self.reporter.waiting(self.interval);

            if !self.wait_for_next_cycle().await {
                break true;
            }
        };

        self.stop(cancelled);
        self.stats
    }

    fn start(&mut self) {
        if !self.notifier.platform_supported() {
            warn!("notifier is not supported on {}", std::env::consts::OS);
            self.reporter.platform_warning(std::env::consts::OS);
        }

        self.state.send_replace(MonitorState::Running);
        info!(
            "monitoring {} hosts every {:?}",
            self.hosts.len(),
            self.interval
        );
    }

    fn stop(&mut self, cancelled: bool) {
        self.state.send_replace(MonitorState::Stopped);

        // nobody will answer these anymore
        self.pending.clear();

        if cancelled {
            self.reporter.stopped();
        }

        info!(
            "monitor stopped after {} cycles ({} alerts sent, {} failed)",
            self.stats.cycles, self.stats.alerts_sent, self.stats.notify_failures
        );
    }

    /// One full cycle. Returns `None` if it was cancelled.
    #[instrument(skip_all, fields(cycle = self.stats.cycles + 1))]
    async fn cycle(&mut self) -> Option<CycleResult> {
        let started = Local::now();
        self.reporter.cycle_started(&started);

        let result = self.evaluate_or_cancel().await?;

        if result.all_up() {
            self.reporter.all_clear();
            if self.alert_policy == AlertPolicy::OnChange {
                self.last_down = Some(Vec::new());
            }
        } else {
            self.reporter.unreachable(&result.down);
            self.alert(&result.down).await;
        }

        self.stats.cycles += 1;
        debug!(
            "cycle finished in {}ms",
            (Local::now() - started).num_milliseconds()
        );

        for respond_to in self.pending.drain(..) {
            let _ = respond_to.send(result.clone());
        }

        Some(result)
    }

    async fn evaluate_or_cancel(&mut self) -> Option<CycleResult> {
        let evaluation = self.evaluator.evaluate(&self.hosts);
        tokio::pin!(evaluation);

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => match cmd {
                    Some(MonitorCommand::CheckNow { respond_to }) => {
                        debug!("CheckNow received during cycle, answering with its result");
                        self.pending.push(respond_to);
                    }
                    Some(MonitorCommand::Shutdown) => {
                        debug!("received shutdown command during cycle");
                        return None;
                    }
                    None => {
                        warn!("command channel closed, shutting down");
                        return None;
                    }
                },

                result = &mut evaluation => return Some(result),
            }
        }
    }

    /// Sleep for the interval. Returns `false` if the monitor should stop.
    async fn wait_for_next_cycle(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.interval);
        tokio::pin!(sleep);

        tokio::select! {
            biased;

            cmd = self.command_rx.recv() => match cmd {
                Some(MonitorCommand::CheckNow { respond_to }) => {
                    debug!("received CheckNow command");
                    self.pending.push(respond_to);
                    true
                }
                Some(MonitorCommand::Shutdown) => {
                    debug!("received shutdown command");
                    false
                }
                None => {
                    warn!("command channel closed, shutting down");
                    false
                }
            },

            _ = &mut sleep => true,
        }
    }

    /// Under `AlertPolicy::OnChange` the down set is only remembered once an
    /// alert for it was delivered, so failed deliveries are retried next cycle.
    async fn alert(&mut self, down: &[Host]) {
        let Some(alert) = AlertMessage::for_down_hosts(down) else {
            return;
        };

        if self.alert_policy == AlertPolicy::OnChange
            && self.last_down.as_deref() == Some(down)
        {
            debug!("down hosts unchanged, skipping alert");
            self.reporter.alert_unchanged();
            return;
        }

        let delivery = tokio::time::timeout(
            NOTIFY_TIMEOUT,
            self.notifier.notify(&alert.title, &alert.body),
        )
        .await
        .unwrap_or_else(|_| {
            Err(NotifyError::DeliveryFailed(format!(
                "no response within {NOTIFY_TIMEOUT:?}"
            )))
        });

        match delivery {
            Ok(()) => {
                info!("alert sent for {} hosts", down.len());
                self.stats.alerts_sent += 1;
                self.reporter.notification_sent(&alert);
                if self.alert_policy == AlertPolicy::OnChange {
                    self.last_down = Some(down.to_vec());
                }
            }
            Err(e @ NotifyError::MechanismUnavailable(_)) => {
                warn!("{e}");
                self.stats.notify_failures += 1;
                self.reporter.notification_unavailable(&alert, &e);
            }
            Err(e @ NotifyError::DeliveryFailed(_)) => {
                error!("{e}");
                self.stats.notify_failures += 1;
                self.reporter.notification_failed(&e);
            }
        }
    }
}

/// Handle for controlling a spawned [`Monitor`]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
    state: watch::Receiver<MonitorState>,
    task: JoinHandle<MonitorStats>,
}

impl MonitorHandle {
    /// Spawn a new monitor task
    pub fn spawn<P, N>(config: ResolvedConfig, prober: P, notifier: N, reporter: Reporter) -> Self
    where
        P: Prober + 'static,
        N: Notifier + 'static,
    {
        Self::spawn_with(config, prober, notifier, reporter, |monitor| monitor)
    }

    /// Spawn a monitor that runs a single cycle and stops.
    pub fn spawn_once<P, N>(
        config: ResolvedConfig,
        prober: P,
        notifier: N,
        reporter: Reporter,
    ) -> Self
    where
        P: Prober + 'static,
        N: Notifier + 'static,
    {
        Self::spawn_with(config, prober, notifier, reporter, |monitor| {
            monitor.max_cycles(1)
        })
    }

    /// Spawn a monitor after adjusting it with `customize`.
    pub fn spawn_with<P, N, F>(
        config: ResolvedConfig,
        prober: P,
        notifier: N,
        reporter: Reporter,
        customize: F,
    ) -> Self
    where
        P: Prober + 'static,
        N: Notifier + 'static,
        F: FnOnce(Monitor<P, N>) -> Monitor<P, N>,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let monitor = customize(Monitor::new(config, prober, notifier, reporter, cmd_rx));
        let state = monitor.watch_state();

        Self {
            sender: cmd_tx,
            state,
            task: tokio::spawn(monitor.run()),
        }
    }

    /// Run a cycle now and return its result
    pub async fn check_now(&self) -> Result<CycleResult> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::CheckNow { respond_to: tx })
            .await
            .context("monitor is not running")?;

        rx.await.context("monitor stopped before the cycle finished")
    }

    /// Shut the monitor down once `signal` completes.
    pub fn stop_on<F>(&self, signal: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            signal.await;
            debug!("stop signal received");
            let _ = sender.send(MonitorCommand::Shutdown).await;
        });
    }

    /// Wait for the monitor to stop by itself or through [`stop_on`](Self::stop_on).
    pub async fn join(self) -> Result<MonitorStats> {
        let MonitorHandle { sender, task, .. } = self;
        let stats = task.await.context("monitor task failed")?;
        drop(sender);
        Ok(stats)
    }

    /// Shut down the monitor and return its statistics
    pub async fn shutdown(self) -> Result<MonitorStats> {
        // the monitor may already have stopped on its own
        let _ = self.sender.send(MonitorCommand::Shutdown).await;
        self.join().await
    }

    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
