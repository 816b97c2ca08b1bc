//! # Scheduling models for handler execution.
//!
//! - [`Concurrency::Synchronous`] handlers are awaited one after another inside the
//!   publisher's future, strictly in snapshot order (default).
//! - [`Concurrency::Concurrent`] each handler runs as its own tokio task; at most
//!   `pool_size` run at once (`0` = unbounded). Submission order is preserved,
//!   completion order is not.
//!
//! ```text
//! Synchronous:   publish ─► h1 ─► h2 ─► h3 ─► report
//!
//! Concurrent:    publish ─┬─► spawn h1 ─┐
//!                         ├─► spawn h2 ─┼─► join (or publish deadline) ─► report
//!                         └─► spawn h3 ─┘
//! ```

/// Scheduling model, selected per bus instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// Run handlers inline, in order (default).
    #[default]
    Synchronous,
    /// Run handlers as independent tokio tasks.
    ///   - `pool_size`: maximum number of handlers running at once.
    ///   - `0` → unbounded
    Concurrent { pool_size: usize },
}

impl Concurrency {
    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → synchronous, or concurrent without a bound
    /// - `Some(n)` → at most `n` handlers in flight
    #[inline]
    pub fn pool_limit(self) -> Option<usize> {
        match self {
            Concurrency::Concurrent { pool_size } if pool_size > 0 => Some(pool_size),
            _ => None,
        }
    }

    #[inline]
    pub fn is_concurrent(self) -> bool {
        matches!(self, Concurrency::Concurrent { .. })
    }
}
