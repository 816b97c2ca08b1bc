//! # Dispatch policies.
//!
//! [`DispatchPolicy`] decides what a handler failure does to the rest of a publish.
//!
//! - [`DispatchPolicy::Isolated`] every handler runs; failures are only reported (default).
//! - [`DispatchPolicy::FailFast`] the first failure skips the remaining handlers and
//!   is returned from `publish` as [`BusError::HandlerFailed`](crate::BusError::HandlerFailed).
//!
//! ## Choosing the right policy
//!
//! **Decoupled consumers** (notifications, projections, audit):
//! ```text
//! DispatchPolicy::Isolated   → one broken consumer never blocks the others
//! ```
//!
//! **Strictly coupled steps** (each handler assumes the previous one succeeded):
//! ```text
//! DispatchPolicy::FailFast   → stop at the first failure, surface it to the publisher
//! ```

/// Policy controlling how handler failures affect the rest of a publish.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Run every handler; report failures in the [`PublishReport`](crate::PublishReport) (default).
    #[default]
    Isolated,
    /// Short-circuit on the first failure and return it as an error.
    FailFast,
}

impl DispatchPolicy {
    #[inline]
    pub fn is_fail_fast(self) -> bool {
        matches!(self, DispatchPolicy::FailFast)
    }
}
