//! Error types used by the bus, the dispatcher and handlers.
//!
//! This module defines three error enums:
//!
//! - [`BusError`] — errors returned by the public bus API (`subscribe`, `publish`).
//! - [`DispatchError`] — the failure recorded for one handler in a [`PublishReport`].
//! - [`HandlerError`] — errors returned by handler implementations.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::core::{PublishReport, SubscriptionId};

/// # Errors produced by the bus API.
///
/// Registration errors are returned straight from `subscribe`. Dispatch-time
/// failures only show up here under [`DispatchPolicy::FailFast`](crate::DispatchPolicy::FailFast),
/// or when a nested publish is rejected by the recursion guard.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// The handler could not be bound to the given event name.
    #[error("invalid handler: {reason}")]
    InvalidHandler {
        /// Why the registration was rejected.
        reason: String,
    },

    /// A nested publish exceeded the configured dispatch depth.
    #[error("cyclic dispatch of '{event}' at depth {depth}; chain: {chain:?}")]
    CyclicDispatch {
        /// Name of the event whose publish was rejected.
        event: String,
        /// Depth that was reached (equals `max_dispatch_depth`).
        depth: usize,
        /// Event names currently being dispatched, outermost first.
        chain: Vec<String>,
    },

    /// A handler failed under the fail-fast policy; remaining handlers were skipped.
    #[error("handler '{handler}' ({subscription}) failed: {source}")]
    HandlerFailed {
        /// Subscription whose handler failed.
        subscription: SubscriptionId,
        /// Handler name.
        handler: String,
        /// What went wrong in the handler.
        #[source]
        source: DispatchError,
        /// Results gathered before the short-circuit (failed one included).
        report: Box<PublishReport>,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use herald::BusError;
    ///
    /// let err = BusError::InvalidHandler { reason: "empty event name".into() };
    /// assert_eq!(err.as_label(), "bus_invalid_handler");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidHandler { .. } => "bus_invalid_handler",
            BusError::CyclicDispatch { .. } => "bus_cyclic_dispatch",
            BusError::HandlerFailed { .. } => "bus_handler_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::InvalidHandler { reason } => format!("invalid handler: {reason}"),
            BusError::CyclicDispatch { event, depth, .. } => {
                format!("cyclic dispatch: event={event} depth={depth}")
            }
            BusError::HandlerFailed {
                handler, source, ..
            } => format!("handler={handler} {}", source.as_message()),
        }
    }

    /// Returns `true` for [`BusError::CyclicDispatch`].
    pub fn is_cyclic(&self) -> bool {
        matches!(self, BusError::CyclicDispatch { .. })
    }

    /// The partial report carried by [`BusError::HandlerFailed`].
    pub fn report(&self) -> Option<&PublishReport> {
        match self {
            BusError::HandlerFailed { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// # Failure of a single handler invocation.
///
/// Recorded in [`DispatchResult::error`](crate::DispatchResult::error). Never fatal
/// to the bus.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The handler returned an error.
    #[error("handler error: {error}")]
    Handler {
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// The handler exceeded its deadline and was abandoned.
    #[error("handler timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The handler observed cancellation and gave up.
    #[error("handler cancelled")]
    Canceled,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use herald::DispatchError;
    /// use std::time::Duration;
    ///
    /// let err = DispatchError::Timeout { timeout: Duration::from_millis(50) };
    /// assert_eq!(err.as_label(), "handler_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Handler { .. } => "handler_error",
            DispatchError::Panicked { .. } => "handler_panicked",
            DispatchError::Timeout { .. } => "handler_timeout",
            DispatchError::Canceled => "handler_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::Handler { error } => format!("error: {error}"),
            DispatchError::Panicked { info } => format!("panic: {info}"),
            DispatchError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            DispatchError::Canceled => "cancelled".to_string(),
        }
    }

    /// Returns `true` for [`DispatchError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout { .. })
    }
}

impl From<HandlerError> for DispatchError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Fail { error } => DispatchError::Handler { error },
            HandlerError::Canceled => DispatchError::Canceled,
        }
    }
}

/// # Errors returned by handler implementations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handling failed.
    #[error("handling failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The handler stopped because its cancellation token fired.
    #[error("handler cancelled")]
    Canceled,
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    ///
    /// # Example
    /// ```
    /// use herald::HandlerError;
    ///
    /// let err = HandlerError::fail("card declined");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Canceled => "handler_canceled",
        }
    }
}

/// Lets handlers use `?` on nested publishes.
impl From<BusError> for HandlerError {
    fn from(err: BusError) -> Self {
        HandlerError::Fail {
            error: err.to_string(),
        }
    }
}
