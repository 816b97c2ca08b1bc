//! # Bus configuration.
//!
//! Provides [`BusConfig`], the settings injected into a [`Bus`](crate::Bus) at construction.
//!
//! ## Sentinel values
//! - `handler_timeout = 0s` → no per-handler deadline
//! - `publish_timeout = 0s` → no publish-level deadline (concurrent mode)
//! - `max_dispatch_depth = 0` → clamped to 1 (only top-level publishes)

use std::time::Duration;

use crate::policies::{Concurrency, DispatchPolicy};

/// Default bound on nested publishes.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 10;

/// Configuration of one bus instance.
///
/// ## Field semantics
/// - `policy`: what a handler failure does to the rest of the publish
/// - `concurrency`: inline or task-per-handler execution
/// - `handler_timeout`: default per-handler deadline (`0s` = none); overridable per subscription
/// - `publish_timeout`: overall deadline of one concurrent publish (`0s` = none)
/// - `max_dispatch_depth`: how many publishes may be nested inside handlers
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Failure policy; see [`DispatchPolicy`].
    pub policy: DispatchPolicy,

    /// Scheduling model; see [`Concurrency`].
    pub concurrency: Concurrency,

    /// Default handler deadline.
    ///
    /// - `Duration::ZERO` = handlers run until they finish
    /// - `> 0` = a handler still running after this is abandoned and recorded as timed out
    pub handler_timeout: Duration,

    /// Publish-level deadline (concurrent mode only).
    ///
    /// Outstanding handlers are cancelled and recorded as timed out when it passes.
    pub publish_timeout: Duration,

    /// Maximum nesting of publishes issued from inside handlers.
    ///
    /// A publish that would exceed it fails with
    /// [`BusError::CyclicDispatch`](crate::BusError::CyclicDispatch).
    pub max_dispatch_depth: usize,
}

impl BusConfig {
    /// Returns the default per-handler timeout as an `Option`.
    #[inline]
    pub fn default_handler_timeout(&self) -> Option<Duration> {
        non_zero(self.handler_timeout)
    }

    /// Returns the publish-level timeout as an `Option`.
    #[inline]
    pub fn publish_deadline(&self) -> Option<Duration> {
        non_zero(self.publish_timeout)
    }

    /// Returns the dispatch depth clamped to a minimum of 1.
    #[inline]
    pub fn max_dispatch_depth_clamped(&self) -> usize {
        self.max_dispatch_depth.max(1)
    }
}

#[inline]
fn non_zero(d: Duration) -> Option<Duration> {
    if d == Duration::ZERO { None } else { Some(d) }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `policy = Isolated`
    /// - `concurrency = Synchronous`
    /// - `handler_timeout = 0s` (none)
    /// - `publish_timeout = 0s` (none)
    /// - `max_dispatch_depth = 10`
    fn default() -> Self {
        Self {
            policy: DispatchPolicy::default(),
            concurrency: Concurrency::default(),
            handler_timeout: Duration::ZERO,
            publish_timeout: Duration::ZERO,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}
