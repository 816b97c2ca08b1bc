//! # Dispatcher: runs the handlers of one publish.
//!
//! Takes the registry snapshot for an event and invokes every subscription
//! according to the bus [`Concurrency`] and [`DispatchPolicy`].
//!
//! ## Architecture
//! ```text
//! dispatch(event, snapshot, chain)
//!     │
//!     ├─ Synchronous ──► for sub in snapshot: chain.scope(run_once(sub)) ──► push result
//!     │                        └─ FailFast + failure ──► return HandlerFailed
//!     │
//!     └─ Concurrent ──► JoinSet: spawn chain.scope(run_once(sub)) per sub (pool permits)
//!                          │
//!                          ├─ join_next (until publish deadline)
//!                          │     └─ FailFast + failure ──► cancel + abort rest ──► HandlerFailed
//!                          └─ deadline ──► cancel token, abort outstanding ──► Timeout results
//! ```
//!
//! ## Rules
//! - One delivery attempt per subscription; results ordered by snapshot index.
//! - Errors and panics are captured per handler; under `Isolated` nothing is propagated.
//! - The publish-level deadline only applies to concurrent dispatch.
//! - The pool bound is per publish, so a handler that publishes again never waits on
//!   permits held by its own ancestors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::config::BusConfig;
use crate::core::guard::DispatchChain;
use crate::core::registry::Snapshot;
use crate::core::report::{DispatchResult, DispatchState, PublishReport};
use crate::core::runner::{report_failure, run_once, trace_state};
use crate::core::subscription::SubscriptionId;
use crate::error::{BusError, DispatchError};
use crate::events::Event;
use crate::policies::{Concurrency, DispatchPolicy};

/// Executes snapshots according to the bus configuration.
#[derive(Clone, Debug)]
pub(crate) struct Dispatcher {
    policy: DispatchPolicy,
    concurrency: Concurrency,
    handler_timeout: Option<Duration>,
    publish_timeout: Option<Duration>,
}

impl Dispatcher {
    pub(crate) fn new(cfg: &BusConfig) -> Self {
        Self {
            policy: cfg.policy,
            concurrency: cfg.concurrency,
            handler_timeout: cfg.default_handler_timeout(),
            publish_timeout: cfg.publish_deadline(),
        }
    }

    /// Delivers `event` to every subscription in `snapshot`.
    ///
    /// `chain` is the dispatch chain that handlers run under (already includes `event`).
    pub(crate) async fn dispatch(
        &self,
        event: Event,
        snapshot: Snapshot,
        chain: DispatchChain,
    ) -> Result<PublishReport, BusError> {
        match self.concurrency {
            Concurrency::Synchronous => self.run_sequential(event, &snapshot, chain).await,
            Concurrency::Concurrent { .. } => {
                self.run_concurrent(event, &snapshot, chain, self.concurrency.pool_limit())
                    .await
            }
        }
    }

    async fn run_sequential(
        &self,
        event: Event,
        snapshot: &Snapshot,
        chain: DispatchChain,
    ) -> Result<PublishReport, BusError> {
        let token = CancellationToken::new();
        let mut report = PublishReport::empty(event);

        for sub in snapshot.iter() {
            trace_state(&report.event, sub, DispatchState::Pending);
            let timeout = sub.effective_timeout(self.handler_timeout);
            let result = chain
                .clone()
                .scope(run_once(sub, &report.event, &token, timeout))
                .await;

            match result.error.clone().filter(|_| self.policy.is_fail_fast()) {
                Some(source) => {
                    let subscription = result.subscription_id;
                    let handler = result.handler.clone();
                    report.results.push(result);
                    return Err(short_circuit(report, subscription, handler, source, snapshot.len()));
                }
                None => report.results.push(result),
            }
        }
        Ok(report)
    }

    async fn run_concurrent(
        &self,
        event: Event,
        snapshot: &Snapshot,
        chain: DispatchChain,
        pool_limit: Option<usize>,
    ) -> Result<PublishReport, BusError> {
        let started = Instant::now();
        let token = CancellationToken::new();
        let permits = pool_limit.map(|n| Arc::new(Semaphore::new(n)));
        let mut set: JoinSet<(usize, DispatchResult)> = JoinSet::new();

        for (idx, sub) in snapshot.iter().enumerate() {
            trace_state(&event, sub, DispatchState::Pending);
            let sub = sub.clone();
            let event = event.clone();
            let token = token.clone();
            let permits = permits.clone();
            let chain = chain.clone();
            let timeout = sub.effective_timeout(self.handler_timeout);

            set.spawn(async move {
                let _permit = match permits {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                (idx, chain.scope(run_once(&sub, &event, &token, timeout)).await)
            });
        }

        let mut slots: Vec<Option<DispatchResult>> = vec![None; snapshot.len()];
        let mut expired = false;

        loop {
            let next = match self.publish_timeout {
                Some(limit) => match time::timeout_at(started + limit, set.join_next()).await {
                    Ok(n) => n,
                    Err(_elapsed) => {
                        expired = true;
                        break;
                    }
                },
                None => set.join_next().await,
            };
            let Some(joined) = next else { break };

            match joined {
                Ok((idx, result)) => {
                    let failure = result.error.clone().filter(|_| self.policy.is_fail_fast());
                    slots[idx] = Some(result);
                    if let Some(source) = failure {
                        token.cancel();
                        set.abort_all();
                        let sub = &snapshot[idx];
                        let done = PublishReport {
                            event,
                            results: slots.into_iter().flatten().collect(),
                        };
                        return Err(short_circuit(
                            done,
                            sub.id,
                            sub.handler_name().to_string(),
                            source,
                            snapshot.len(),
                        ));
                    }
                }
                Err(join_err) => {
                    // Handler panics are caught inside run_once; this is the task itself.
                    warn!(event = %event.name(), error = %join_err, "handler task aborted");
                }
            }
        }

        if expired {
            token.cancel();
            set.abort_all();
        }

        let mut report = PublishReport::empty(event);
        for (idx, slot) in slots.into_iter().enumerate() {
            let result = match slot {
                Some(r) => r,
                None => {
                    let sub = &snapshot[idx];
                    let error = match self.publish_timeout.filter(|_| expired) {
                        Some(timeout) => DispatchError::Timeout { timeout },
                        None => DispatchError::Panicked {
                            info: "handler task aborted".to_string(),
                        },
                    };
                    let r = DispatchResult::from_outcome(
                        sub.id,
                        sub.handler_name(),
                        Err(error),
                        started.elapsed(),
                    );
                    report_failure(&report.event, &r);
                    r
                }
            };
            report.results.push(result);
        }

        if self.policy.is_fail_fast() {
            if let Some(first) = report.results.iter().position(|r| !r.is_success()) {
                report.results.truncate(first + 1);
                let failed = &report.results[first];
                let (subscription, handler) = (failed.subscription_id, failed.handler.clone());
                let source = failed.error.clone().unwrap_or(DispatchError::Canceled);
                return Err(short_circuit(report, subscription, handler, source, snapshot.len()));
            }
        }
        Ok(report)
    }
}

/// Builds the fail-fast error; `report` holds everything that completed.
fn short_circuit(
    report: PublishReport,
    subscription: SubscriptionId,
    handler: String,
    source: DispatchError,
    total: usize,
) -> BusError {
    warn!(
        event = %report.event.name(),
        subscription = %subscription,
        handler = %handler,
        completed = report.results.len(),
        total,
        "fail-fast dispatch stopped at first failure"
    );
    BusError::HandlerFailed {
        subscription,
        handler,
        source,
        report: Box::new(report),
    }
}
