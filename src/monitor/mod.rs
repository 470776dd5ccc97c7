//! The connectivity monitoring loop
//!
//! A [`Monitor`](scheduler::Monitor) runs as a single tokio task and moves
//! through `Idle → Running → Stopped`. Each cycle probes the whole host set,
//! prints a report and alerts on unreachable hosts, then sleeps for the
//! configured interval.
//!
//! ## Message Flow
//!
//! ```text
//! Sleep/CheckNow → Evaluate hosts → Report → Notify (if any down) → Sleep ...
//!      ↑
//!      └─── Commands (CheckNow, Shutdown) via MonitorHandle
//! ```
//!
//! Cancellation is observed while a cycle is in flight and while sleeping, so
//! a shutdown never waits for the full interval.

pub mod messages;
pub mod scheduler;
