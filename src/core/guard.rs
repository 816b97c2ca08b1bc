//! # Recursion guard for nested publishes.
//!
//! Every dispatch runs inside a tokio task-local holding the chain of event names
//! currently being dispatched (outermost first). A publish issued from inside a
//! handler reads the chain and extends it; once the chain is as long as
//! `max_dispatch_depth`, the nested publish is rejected with
//! [`BusError::CyclicDispatch`].
//!
//! ```text
//! publish(A)                 chain = []        → enter → [A]
//!   └─ handler publishes A   chain = [A]       → enter → [A, A]
//!        └─ ...              chain = [A; max]  → CyclicDispatch
//! ```
//!
//! The chain is re-established in every spawned handler task, so concurrent
//! dispatch is guarded the same way. Work a handler spawns on its own
//! (`tokio::spawn` inside the handler) starts from an empty chain.

use std::future::Future;
use std::sync::Arc;

use crate::error::BusError;

tokio::task_local! {
    static DISPATCH_CHAIN: DispatchChain;
}

/// Event names on the active dispatch stack.
#[derive(Clone, Debug, Default)]
pub(crate) struct DispatchChain(Arc<[Arc<str>]>);

impl DispatchChain {
    /// Chain of the dispatch this code runs in (empty at top level).
    pub(crate) fn current() -> Self {
        DISPATCH_CHAIN.try_with(Clone::clone).unwrap_or_default()
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns the chain for a dispatch of `event` nested in this one.
    pub(crate) fn enter(&self, event: &str, max_depth: usize) -> Result<Self, BusError> {
        if self.depth() >= max_depth {
            return Err(BusError::CyclicDispatch {
                event: event.to_string(),
                depth: self.depth(),
                chain: self.0.iter().map(|n| n.to_string()).collect(),
            });
        }
        let mut next: Vec<Arc<str>> = self.0.to_vec();
        next.push(Arc::from(event));
        Ok(Self(next.into()))
    }

    /// Runs `fut` with this chain as the current one.
    pub(crate) async fn scope<F: Future>(self, fut: F) -> F::Output {
        DISPATCH_CHAIN.scope(self, fut).await
    }
}
