//! Message and state types for the monitor task

use tokio::sync::oneshot;

use crate::evaluator::CycleResult;

/// Commands that can be sent to a running [`Monitor`](super::scheduler::Monitor)
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run a cycle immediately instead of waiting for the interval
    ///
    /// If a cycle is already in flight, its result answers the request.
    CheckNow {
        respond_to: oneshot::Sender<CycleResult>,
    },

    /// Stop monitoring
    ///
    /// Interrupts the sleep or the in-flight cycle.
    Shutdown,
}

/// Lifecycle of the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
    Stopped,
}

/// Counters reported when the monitor stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Cycles that ran to completion
    pub cycles: u64,

    /// Alerts the notifier accepted
    pub alerts_sent: u64,

    /// Alerts that could not be delivered (either error kind)
    pub notify_failures: u64,
}
