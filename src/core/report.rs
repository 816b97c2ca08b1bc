//! # Per-handler outcomes and the aggregated publish report.
//!
//! ```text
//! Pending ──► Running ──┬──► Succeeded
//!                       ├──► Failed     (error / panic / cancelled)
//!                       └──► TimedOut   (deadline passed, unit abandoned)
//! ```
//!
//! Terminal states are final: the dispatcher makes exactly one delivery attempt
//! per subscription and publish. [`DispatchResult`] collapses the terminal state
//! into a [`DispatchStatus`] plus an optional [`DispatchError`].

use std::fmt;
use std::time::Duration;

use crate::core::subscription::SubscriptionId;
use crate::error::DispatchError;
use crate::events::Event;

/// Lifecycle of one handler invocation.
///
/// Every transition is logged at `trace` with a `state` field; results only
/// carry the terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl DispatchState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DispatchState::Succeeded | DispatchState::Failed | DispatchState::TimedOut
        )
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchState::Pending => "pending",
            DispatchState::Running => "running",
            DispatchState::Succeeded => "succeeded",
            DispatchState::Failed => "failed",
            DispatchState::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    Succeeded,
    Failed,
}

/// Outcome of delivering one event to one subscription.
#[derive(Clone, Debug)]
pub struct DispatchResult {
    pub subscription_id: SubscriptionId,
    /// Handler name at dispatch time.
    pub handler: String,
    pub status: DispatchStatus,
    /// Set iff `status == Failed`.
    pub error: Option<DispatchError>,
    /// Wall time spent on this handler (up to the deadline for timeouts).
    pub elapsed: Duration,
}

impl DispatchResult {
    pub(crate) fn from_outcome(
        subscription_id: SubscriptionId,
        handler: &str,
        outcome: Result<(), DispatchError>,
        elapsed: Duration,
    ) -> Self {
        let (status, error) = match outcome {
            Ok(()) => (DispatchStatus::Succeeded, None),
            Err(e) => (DispatchStatus::Failed, Some(e)),
        };
        Self {
            subscription_id,
            handler: handler.to_string(),
            status,
            error,
            elapsed,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == DispatchStatus::Succeeded
    }

    /// True if the handler was abandoned at its deadline.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.error.as_ref().is_some_and(DispatchError::is_timeout)
    }

    /// Terminal state of the invocation.
    pub fn state(&self) -> DispatchState {
        match (&self.status, &self.error) {
            (DispatchStatus::Succeeded, _) => DispatchState::Succeeded,
            (DispatchStatus::Failed, Some(DispatchError::Timeout { .. })) => {
                DispatchState::TimedOut
            }
            (DispatchStatus::Failed, _) => DispatchState::Failed,
        }
    }
}

/// Aggregated outcome of one publish.
///
/// `results` follow snapshot order (priority, then registration) in every
/// concurrency mode, regardless of completion order.
#[derive(Clone, Debug)]
pub struct PublishReport {
    pub event: Event,
    pub results: Vec<DispatchResult>,
}

impl PublishReport {
    pub(crate) fn empty(event: Event) -> Self {
        Self {
            event,
            results: Vec::new(),
        }
    }

    /// No handler was invoked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DispatchResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DispatchResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// True if every handler succeeded (vacuously true for an empty report).
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(DispatchResult::is_success)
    }

    pub fn result_for(&self, id: SubscriptionId) -> Option<&DispatchResult> {
        self.results.iter().find(|r| r.subscription_id == id)
    }
}
