//! # Run a single handler invocation.
//!
//! Executes one delivery of an [`Event`] to one [`Subscription`] with optional
//! timeout, capturing errors and panics as a [`DispatchResult`].
//!
//! ## Outcome mapping
//!
//! ```text
//! Success:
//!   handle() → Ok(())            → Succeeded
//!
//! Failure:
//!   handle() → Err(Fail)         → Failed(Handler)
//!   handle() → Err(Canceled)     → Failed(Canceled)
//!   handle() panics              → Failed(Panicked)
//!
//! Timeout:
//!   deadline passed → cancel child token → drop future → Failed(Timeout)
//! ```
//!
//! ## Rules
//! - Exactly **one** attempt; no retries.
//! - Derives a **child token** per invocation; cancelling it does not affect the parent.
//! - Every failed result is logged at `warn`, so failures leave a trace even when the
//!   caller ignores the report.
//! - `Running` and the terminal [`DispatchState`] are logged at `trace`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::core::report::{DispatchResult, DispatchState};
use crate::core::subscription::Subscription;
use crate::error::{DispatchError, HandlerError};
use crate::events::Event;

/// Delivers `event` to `sub` once.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)`, the handler future is wrapped in
/// [`tokio::time::timeout`]. On expiry the child token is cancelled and the future
/// is dropped without waiting for it further.
pub(crate) async fn run_once(
    sub: &Subscription,
    event: &Event,
    parent: &CancellationToken,
    timeout: Option<Duration>,
) -> DispatchResult {
    trace_state(event, sub, DispatchState::Running);
    let child = parent.child_token();
    let started = Instant::now();
    let attempt = AssertUnwindSafe(sub.handler.handle(event, child.clone())).catch_unwind();

    let outcome = if let Some(dur) = timeout {
        match time::timeout(dur, attempt).await {
            Ok(r) => flatten(r),
            Err(_elapsed) => {
                child.cancel();
                Err(DispatchError::Timeout { timeout: dur })
            }
        }
    } else {
        flatten(attempt.await)
    };

    let result =
        DispatchResult::from_outcome(sub.id, sub.handler_name(), outcome, started.elapsed());
    trace_state(event, sub, result.state());
    report_failure(event, &result);
    result
}

/// Emits one lifecycle transition of a dispatch unit.
pub(crate) fn trace_state(event: &Event, sub: &Subscription, state: DispatchState) {
    trace!(
        event = %event.name(),
        subscription = %sub.id,
        handler = %sub.handler_name(),
        state = %state,
        "dispatch state"
    );
}

/// Logs a failed result; no-op for successes.
pub(crate) fn report_failure(event: &Event, result: &DispatchResult) {
    if let Some(err) = &result.error {
        warn!(
            event = %event.name(),
            correlation_id = %event.correlation_id(),
            subscription = %result.subscription_id,
            handler = %result.handler,
            state = %result.state(),
            kind = err.as_label(),
            error = %err,
            "handler failed"
        );
    }
}

fn flatten(r: Result<Result<(), HandlerError>, Box<dyn Any + Send>>) -> Result<(), DispatchError> {
    match r {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(panic) => Err(DispatchError::Panicked {
            info: panic_info(panic.as_ref()),
        }),
    }
}

fn panic_info(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::subscription::SubscriptionId;
    use crate::handlers::{HandlerFn, HandlerRef};
    use std::sync::Arc;

    fn sub(handler: HandlerRef) -> Subscription {
        Subscription {
            id: SubscriptionId(1),
            event_name: Arc::from("evt"),
            handler,
            priority: 0,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn panic_is_captured() {
        let s = sub(HandlerFn::arc("boom", |_ev: Event, _ctx: CancellationToken| async {
            if true {
                panic!("kaboom");
            }
            Ok::<(), HandlerError>(())
        }));
        let r = run_once(&s, &Event::new("evt", ()), &CancellationToken::new(), None).await;
        assert_eq!(
            r.error,
            Some(DispatchError::Panicked {
                info: "kaboom".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_child_token() {
        let seen = CancellationToken::new();
        let observed = seen.clone();
        let s = sub(HandlerFn::arc("slow", move |_ev: Event, ctx: CancellationToken| {
            let observed = observed.clone();
            async move {
                tokio::spawn(async move {
                    ctx.cancelled().await;
                    observed.cancel();
                });
                time::sleep(Duration::from_secs(60)).await;
                Ok::<(), HandlerError>(())
            }
        }));

        let parent = CancellationToken::new();
        let r = run_once(
            &s,
            &Event::new("evt", ()),
            &parent,
            Some(Duration::from_millis(50)),
        )
        .await;

        assert!(r.is_timeout());
        seen.cancelled().await;
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn canceled_error_is_failure() {
        let s = sub(HandlerFn::arc("quit", |_ev: Event, _ctx: CancellationToken| async {
            Err::<(), _>(HandlerError::Canceled)
        }));
        let r = run_once(&s, &Event::new("evt", ()), &CancellationToken::new(), None).await;
        assert!(!r.is_success());
        assert_eq!(r.error, Some(DispatchError::Canceled));
    }
}
